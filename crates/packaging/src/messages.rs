//! Messages exchanged between the use cases and the worker.

use common::AggregateId;
use event_store::EventId;
use serde::{Deserialize, Serialize};

/// A package gained a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMessage {
    pub package_id: AggregateId,

    /// The package's event after the change.
    pub event: EventId,

    /// The event the change replaced, if any.
    pub last: Option<EventId>,
}

/// Every sticker of the package was obtained; mark it printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintPackageMessage {
    pub package_id: AggregateId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body")]
pub enum Message {
    Package(PackageMessage),
    PrintPackage(PrintPackageMessage),
}

impl Message {
    pub fn package_id(&self) -> AggregateId {
        match self {
            Message::Package(message) => message.package_id,
            Message::PrintPackage(message) => message.package_id,
        }
    }
}

impl From<PackageMessage> for Message {
    fn from(message: PackageMessage) -> Self {
        Message::Package(message)
    }
}

impl From<PrintPackageMessage> for Message {
    fn from(message: PrintPackageMessage) -> Self {
        Message::PrintPackage(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_with_type_tag() {
        let package_id = AggregateId::new();
        let message = Message::from(PrintPackageMessage { package_id });

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "PrintPackage");

        let decoded: Message = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.package_id(), package_id);
    }
}
