use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an aggregate instance (a supply or a package).
///
/// Wraps a UUID so aggregate ids cannot be mixed up with the identifiers of
/// external records such as orders or profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Creates a new random aggregate ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an aggregate ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AggregateId> for Uuid {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

/// Declares a UUID-backed identifier of a record owned by another system.
macro_rules! external_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

external_id!(
    /// Seller account on whose behalf supplies and packages are created.
    ProfileId
);

external_id!(
    /// Customer order in the order management system.
    OrderId
);

external_id!(
    /// One product entry (order-line) within a customer order.
    OrderLineId
);

external_id!(
    /// Product card revision the order-line refers to.
    ProductEventId
);

external_id!(
    /// Trade offer of a product (e.g. colour).
    OfferId
);

external_id!(
    /// Variation of an offer (e.g. size).
    VariationId
);

external_id!(
    /// Modification of a variation.
    ModificationId
);

external_id!(
    /// Stable product id, independent of the card revision.
    ProductMainId
);

external_id!(
    /// Warehouse stock request raised for an order.
    StockRequestId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_id_new_creates_unique_ids() {
        let id1 = AggregateId::new();
        let id2 = AggregateId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn aggregate_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = AggregateId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn external_ids_serialize_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let order = OrderId::from_uuid(uuid);
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));

        let back: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn profile_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(ProfileId::from(uuid).to_string(), uuid.to_string());
    }
}
