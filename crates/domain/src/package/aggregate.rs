//! Package aggregate implementation.

use chrono::Utc;
use common::{AggregateId, OrderId, OrderLineId, ProfileId};
use event_store::{EventId, Version};

use crate::aggregate::Aggregate;
use crate::status::PackageStatus;

use super::{PackageChange, PackageError, PackageEvent, PackageOrder, PackageSupplyLink};

/// Package aggregate root.
///
/// One box of order-lines for one product, bound to a supply.
#[derive(Debug, Clone, Default)]
pub struct Package {
    id: Option<AggregateId>,
    version: Version,
    current: Option<PackageEvent>,
}

impl Aggregate for Package {
    type Event = PackageEvent;
    type Error = PackageError;

    fn aggregate_type() -> &'static str {
        "Package"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        if self.id.is_none() {
            self.id = Some(event.package_id);
        }
        self.current = Some(event);
    }
}

// Query methods
impl Package {
    pub fn current(&self) -> Option<&PackageEvent> {
        self.current.as_ref()
    }

    pub fn current_event_id(&self) -> Option<EventId> {
        self.current.as_ref().map(|event| event.event_id)
    }

    pub fn profile(&self) -> Option<ProfileId> {
        self.current.as_ref().map(|event| event.profile)
    }

    /// The supply this package belongs to.
    pub fn supply_id(&self) -> Option<AggregateId> {
        self.current.as_ref().map(|event| event.supply.supply)
    }

    pub fn is_printed(&self) -> bool {
        self.current.as_ref().is_some_and(|event| event.supply.print)
    }

    pub fn orders(&self) -> &[PackageOrder] {
        self.current
            .as_ref()
            .map(|event| event.orders.as_slice())
            .unwrap_or(&[])
    }

    /// Number of order-lines in the package.
    pub fn total(&self) -> u32 {
        self.current.as_ref().map(|event| event.total).unwrap_or(0)
    }

    pub fn in_part(&self) -> bool {
        self.current.as_ref().is_none_or(|event| event.in_part)
    }

    /// Returns true if the package holds the order-line in a non-Error line.
    pub fn holds_order_line(&self, order: OrderId, line: OrderLineId) -> bool {
        self.orders()
            .iter()
            .any(|o| o.order == order && o.line == line && o.status.holds_order_line())
    }

    pub fn contains_order(&self, order: OrderId) -> bool {
        self.orders().iter().any(|o| o.order == order)
    }

    /// Distinct orders in line order.
    pub fn order_ids(&self) -> Vec<OrderId> {
        let mut ids: Vec<OrderId> = Vec::new();
        for line in self.orders() {
            if !ids.contains(&line.order) {
                ids.push(line.order);
            }
        }
        ids
    }

    fn require_current(&self) -> Result<&PackageEvent, PackageError> {
        self.current.as_ref().ok_or(PackageError::NoActiveEvent)
    }
}

// Command methods (return events)
impl Package {
    /// Packs order-lines into a new package bound to a supply.
    pub fn pack(
        &self,
        package_id: AggregateId,
        profile: ProfileId,
        supply: AggregateId,
        orders: Vec<PackageOrder>,
    ) -> Result<Vec<PackageEvent>, PackageError> {
        if self.id.is_some() {
            return Err(PackageError::AlreadyPacked);
        }
        if orders.is_empty() {
            return Err(PackageError::Empty);
        }

        Ok(vec![PackageEvent {
            event_id: EventId::new(),
            package_id,
            change: PackageChange::Packed,
            profile,
            total: orders.len() as u32,
            in_part: true,
            supply: PackageSupplyLink {
                supply,
                print: false,
            },
            orders,
            created_at: Utc::now(),
        }])
    }

    /// Sets the print flag. Already printed packages produce no event.
    pub fn mark_printed(&self) -> Result<Vec<PackageEvent>, PackageError> {
        let current = self.require_current()?;
        if current.supply.print {
            return Ok(vec![]);
        }

        let mut event = current.next(PackageChange::Printed);
        event.supply.print = true;
        Ok(vec![event])
    }

    /// Sets the status of the lines of one order, or of every line.
    pub fn change_order_status(
        &self,
        status: PackageStatus,
        order: Option<OrderId>,
    ) -> Result<Vec<PackageEvent>, PackageError> {
        let current = self.require_current()?;
        if let Some(order) = order
            && !self.contains_order(order)
        {
            return Err(PackageError::OrderNotInPackage { order });
        }

        let mut event = current.next(PackageChange::OrderStatusChanged);
        let mut changed = false;
        for line in &mut event.orders {
            if order.is_none_or(|order| order == line.order) && line.status != status {
                line.status = status;
                changed = true;
            }
        }

        if changed { Ok(vec![event]) } else { Ok(vec![]) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(lines: &[(OrderId, OrderLineId)]) -> Package {
        let mut package = Package::default();
        let orders = lines
            .iter()
            .map(|(order, line)| PackageOrder::new(*order, *line))
            .collect();
        let events = package
            .pack(AggregateId::new(), ProfileId::new(), AggregateId::new(), orders)
            .unwrap();
        package.apply_events(events);
        package
    }

    #[test]
    fn pack_records_lines_and_total() {
        let order = OrderId::new();
        let package = packed(&[(order, OrderLineId::new()), (order, OrderLineId::new())]);

        assert_eq!(package.total(), 2);
        assert!(package.in_part());
        assert!(!package.is_printed());
        assert_eq!(package.order_ids(), vec![order]);
        assert!(
            package
                .orders()
                .iter()
                .all(|line| line.status == PackageStatus::New)
        );
    }

    #[test]
    fn pack_rejects_empty_line_list() {
        let result = Package::default().pack(
            AggregateId::new(),
            ProfileId::new(),
            AggregateId::new(),
            vec![],
        );
        assert!(matches!(result, Err(PackageError::Empty)));
    }

    #[test]
    fn mark_printed_copies_lines_and_is_idempotent() {
        let mut package = packed(&[(OrderId::new(), OrderLineId::new())]);
        let lines_before = package.orders().to_vec();

        let events = package.mark_printed().unwrap();
        assert_eq!(events.len(), 1);
        package.apply_events(events);

        assert!(package.is_printed());
        assert_eq!(package.orders(), lines_before.as_slice());
        assert!(package.mark_printed().unwrap().is_empty());
    }

    #[test]
    fn error_status_releases_order_line() {
        let order = OrderId::new();
        let line = OrderLineId::new();
        let mut package = packed(&[(order, line)]);
        assert!(package.holds_order_line(order, line));

        let events = package
            .change_order_status(PackageStatus::Error, Some(order))
            .unwrap();
        package.apply_events(events);

        assert!(!package.holds_order_line(order, line));
        assert!(package.contains_order(order));
    }

    #[test]
    fn change_status_of_unknown_order_fails() {
        let package = packed(&[(OrderId::new(), OrderLineId::new())]);
        let result = package.change_order_status(PackageStatus::Packed, Some(OrderId::new()));
        assert!(matches!(result, Err(PackageError::OrderNotInPackage { .. })));
    }

    #[test]
    fn unchanged_status_produces_no_event() {
        let package = packed(&[(OrderId::new(), OrderLineId::new())]);
        assert!(
            package
                .change_order_status(PackageStatus::New, None)
                .unwrap()
                .is_empty()
        );
    }
}
