//! [`Commercial`] [`Property`] definition.

use common::{define_kind, Amount};
use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Property;

/// Commercial land [`Property`], offered as up to one [`Deal`] per
/// [`Transaction`].
///
/// At most one [`Deal`] is expected to be active at a time. This is never
/// enforced here: when several are active, the first one in
/// [`Transaction::ALL`] order wins.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Commercial {
    /// [`Deal`] to sell the land.
    pub sell: Option<Deal>,

    /// [`Deal`] to rent the land.
    pub rent: Option<Deal>,

    /// [`Deal`] to lease the land.
    pub lease: Option<Deal>,
}

impl Commercial {
    /// Returns the [`Deal`] of the provided [`Transaction`], if any.
    #[must_use]
    pub fn deal(&self, transaction: Transaction) -> Option<&Deal> {
        match transaction {
            Transaction::Sell => self.sell.as_ref(),
            Transaction::Rent => self.rent.as_ref(),
            Transaction::Lease => self.lease.as_ref(),
        }
    }

    /// Returns the active [`Deal`] along with its [`Transaction`].
    ///
    /// [`None`] is returned if no [`Deal`] is active.
    #[must_use]
    pub fn active_deal(&self) -> Option<(Transaction, &Deal)> {
        Transaction::ALL.iter().find_map(|&t| {
            self.deal(t).filter(|d| d.is_active()).map(|d| (t, d))
        })
    }
}

/// Terms of a single [`Commercial`] offer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Deal {
    /// Allowed usages of the land. Empty means the [`Deal`] is inactive.
    pub land_usage: Vec<LandUsage>,

    /// Size of the offered plot, if known.
    pub plot_size: Option<Amount>,

    /// Asking amount, if known.
    pub total_amount: Option<Amount>,
}

impl Deal {
    /// Indicates whether this [`Deal`] is currently offered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.land_usage.is_empty()
    }
}

/// Allowed usage of a [`Commercial`] land (e.g. "retail", "warehouse").
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct LandUsage(String);

impl LandUsage {
    /// Creates a new [`LandUsage`] if the given `usage` is not blank.
    #[must_use]
    pub fn new(usage: impl Into<String>) -> Option<Self> {
        let usage = usage.into();
        let trimmed = usage.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_owned()))
    }
}

define_kind! {
    #[doc = "Kind of a [`Commercial`] [`Deal`]."]
    enum Transaction {
        #[doc = "Selling the land."]
        Sell = 1,

        #[doc = "Renting the land out."]
        Rent = 2,

        #[doc = "Leasing the land out."]
        Lease = 3,
    }
}
