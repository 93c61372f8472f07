//! [`Property`]-related read definitions.

use common::{Amount, Filter};

use crate::domain::property::Status;
#[cfg(doc)]
use crate::domain::Property;

/// Numeric field of a [`Property`] to aggregate over.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Metric {
    /// Asking price.
    Price,

    /// Size (area).
    Size,
}

/// Maximum of a [`Metric`] across the matching [`Property`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Maximum {
    /// Maximum value, or zero if no [`Property`] matched.
    pub value: Amount,

    /// Indicator whether at least one [`Property`] matched.
    ///
    /// Distinguishes "nothing matched" from "everything matched was zero".
    pub is_present: bool,
}

/// Running maxima of a [`Metric`] split by [`Status`], computed in a single
/// pass over [`Property`]s.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Maxima {
    /// Maximum over all the folded values.
    any: Option<Amount>,

    /// Maximum over the values of sold [`Property`]s.
    sold: Option<Amount>,

    /// Maximum over the values of unsold [`Property`]s.
    unsold: Option<Amount>,
}

impl Maxima {
    /// Folds the provided `value` of a [`Property`] with the provided
    /// [`Status`] into these [`Maxima`].
    pub fn push(&mut self, value: Amount, status: Status) {
        let bucket = match status {
            Status::Sold => &mut self.sold,
            Status::Unsold => &mut self.unsold,
        };
        for max in [&mut self.any, bucket] {
            *max = Some(max.map_or(value, |m| m.max(value)));
        }
    }

    /// Picks the [`Maximum`] matching the provided [`Status`] [`Filter`].
    ///
    /// Anything other than exactly one [`Status`] selects the overall maximum.
    #[must_use]
    pub fn select(&self, status: &Filter<Status>) -> Maximum {
        let max = if status.is_exactly(&Status::Unsold) {
            self.unsold
        } else if status.is_exactly(&Status::Sold) {
            self.sold
        } else {
            self.any
        };
        Maximum {
            value: max.unwrap_or_default(),
            is_present: max.is_some(),
        }
    }
}

impl FromIterator<(Amount, Status)> for Maxima {
    fn from_iter<I: IntoIterator<Item = (Amount, Status)>>(iter: I) -> Self {
        let mut maxima = Self::default();
        for (value, status) in iter {
            maxima.push(value, status);
        }
        maxima
    }
}

pub mod list {
    //! [`Property`] list definitions.

    use crate::domain::{property, user};
    #[cfg(doc)]
    use crate::domain::Property;

    /// Selector of [`Property`]s to aggregate over.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Selector {
        /// [`property::Kind`] of the [`Property`]s.
        pub kind: property::Kind,

        /// Owner of the [`Property`]s, if only a single owner's ones are
        /// needed.
        pub owner_id: Option<user::Id>,
    }
}

#[cfg(test)]
mod spec {
    use common::{Amount, Filter};

    use crate::domain::property::Status;

    use super::{Maxima, Maximum};

    fn maxima() -> Maxima {
        [
            (Amount::from(10), Status::Sold),
            (Amount::from(30), Status::Unsold),
            (Amount::from(20), Status::Sold),
            (Amount::from(5), Status::Unsold),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn selects_by_status() {
        let m = maxima();

        assert_eq!(m.select(&Filter::any()).value, Amount::from(30));
        assert_eq!(
            m.select(&Filter::only([Status::Sold])).value,
            Amount::from(20),
        );
        assert_eq!(
            m.select(&Filter::only([Status::Unsold])).value,
            Amount::from(30),
        );
        assert_eq!(
            m.select(&Filter::only([Status::Sold, Status::Unsold])).value,
            Amount::from(30),
        );
    }

    #[test]
    fn empty_is_zero_and_absent() {
        assert_eq!(
            Maxima::default().select(&Filter::any()),
            Maximum {
                value: Amount::ZERO,
                is_present: false,
            },
        );

        let only_unsold: Maxima =
            [(Amount::from(7), Status::Unsold)].into_iter().collect();
        assert!(!only_unsold.select(&Filter::only([Status::Sold])).is_present);
        assert!(only_unsold.select(&Filter::any()).is_present);
    }

    #[test]
    fn zero_values_are_present() {
        let zeros: Maxima =
            [(Amount::ZERO, Status::Sold)].into_iter().collect();

        assert_eq!(
            zeros.select(&Filter::any()),
            Maximum {
                value: Amount::ZERO,
                is_present: true,
            },
        );
    }
}
