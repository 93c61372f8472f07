//! [`Layout`] [`Property`] definition.

use common::Amount;

#[cfg(doc)]
use crate::domain::Property;

/// Layout divided into plots, sold as a single [`Property`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Layout {
    /// Size of a single plot, if known.
    pub plot_size: Option<Amount>,

    /// Asking price, if known.
    pub total_amount: Option<Amount>,

    /// Number of plots still available, if known.
    pub available_plots: Option<u32>,
}
