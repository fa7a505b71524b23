use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};

static LAST_TICK: AtomicI64 = AtomicI64::new(0);

/// Human-readable batch number of a supply, e.g. `176.084.567.123`.
///
/// Derived from the current time in hundredths of a second, grouped by
/// thousands with dots. Assigned once when the supply is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupplyIdentifier(String);

impl SupplyIdentifier {
    /// Generates the next identifier.
    ///
    /// Strictly increasing within the process, even for calls within the same
    /// hundredth of a second.
    pub fn generate() -> Self {
        let now = Utc::now().timestamp_micros() / 10_000;
        let previous = LAST_TICK
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        Self(group_thousands(now.max(previous + 1)))
    }

    /// Wraps an already generated identifier.
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SupplyIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn groups_digits_by_thousands() {
        assert_eq!(group_thousands(176_084_567_123), "176.084.567.123");
        assert_eq!(group_thousands(1_000), "1.000");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(12_345_678), "12.345.678");
    }

    #[test]
    fn rapid_generation_yields_unique_identifiers() {
        let identifiers: Vec<_> = (0..1_000).map(|_| SupplyIdentifier::generate()).collect();
        let unique: HashSet<_> = identifiers.iter().collect();
        assert_eq!(unique.len(), identifiers.len());
    }

    #[test]
    fn identifiers_increase_numerically() {
        let numeric = |id: &SupplyIdentifier| id.as_str().replace('.', "").parse::<i64>().unwrap();

        let first = SupplyIdentifier::generate();
        let second = SupplyIdentifier::generate();
        assert!(numeric(&second) > numeric(&first));
    }

    #[test]
    fn identifier_fits_fifteen_characters() {
        assert!(SupplyIdentifier::generate().as_str().len() <= 15);
    }
}
