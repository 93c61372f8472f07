//! [`Agricultural`] [`Property`] definition.

use common::Amount;

#[cfg(doc)]
use crate::domain::Property;

/// Agricultural land [`Property`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Agricultural {
    /// Area of the land, if known.
    pub size: Option<Amount>,

    /// Asking price for the whole land, if known.
    pub total_price: Option<Amount>,
}
