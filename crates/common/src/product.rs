use serde::{Deserialize, Serialize};

use crate::{ModificationId, OfferId, ProductEventId, VariationId};

/// Identity of a sellable product: card revision plus the optional offer,
/// variation and modification.
///
/// Each optional component matches only itself: an absent offer matches an
/// absent offer and nothing else. Absence is never a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductIdentity {
    pub event: ProductEventId,
    pub offer: Option<OfferId>,
    pub variation: Option<VariationId>,
    pub modification: Option<ModificationId>,
}

impl ProductIdentity {
    /// Identity of a product without offers.
    pub fn new(event: ProductEventId) -> Self {
        Self {
            event,
            offer: None,
            variation: None,
            modification: None,
        }
    }

    pub fn with_offer(mut self, offer: OfferId) -> Self {
        self.offer = Some(offer);
        self
    }

    pub fn with_variation(mut self, variation: VariationId) -> Self {
        self.variation = Some(variation);
        self
    }

    pub fn with_modification(mut self, modification: ModificationId) -> Self {
        self.modification = Some(modification);
        self
    }

    /// Returns true when all four components are equal, with `None == None`.
    pub fn matches(&self, other: &ProductIdentity) -> bool {
        self.event == other.event
            && self.offer == other.offer
            && self.variation == other.variation
            && self.modification == other.modification
    }

    /// The most specific component, used as the product key in UI notifications.
    pub fn identifier(&self) -> String {
        if let Some(modification) = self.modification {
            modification.to_string()
        } else if let Some(variation) = self.variation {
            variation.to_string()
        } else if let Some(offer) = self.offer {
            offer.to_string()
        } else {
            self.event.to_string()
        }
    }
}
