//! [`Residential`] [`Property`] definition.

use common::{define_kind, Amount};

#[cfg(doc)]
use crate::domain::Property;

/// Residential unit [`Property`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Residential {
    /// [`Type`] of this unit.
    pub r#type: Type,

    /// Area of the unit, if known.
    pub flat_size: Option<Amount>,

    /// Asking price, if known.
    pub total_cost: Option<Amount>,
}

define_kind! {
    #[doc = "Type of a [`Residential`] unit."]
    enum Type {
        #[doc = "Apartment in a building."]
        Flat = 1,

        #[doc = "Standalone house."]
        House = 2,
    }
}
