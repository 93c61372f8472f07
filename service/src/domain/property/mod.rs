//! [`Property`] definitions.

pub mod agricultural;
pub mod commercial;
pub mod layout;
pub mod residential;

use common::{define_kind, unit, Amount, DateTimeOf, Filter};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use common::DateTime;

use crate::domain::{rating, user};

pub use self::{
    agricultural::Agricultural, commercial::Commercial, layout::Layout,
    residential::Residential,
};

/// Property listed on the platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// ID of the user who listed this [`Property`].
    pub owner_id: user::Id,

    /// Sale [`Status`] of this [`Property`].
    pub status: Status,

    /// [`Kind`]-specific [`Details`] of this [`Property`].
    pub details: Details,

    /// [`rating::Summary`] derived from all the ratings of this [`Property`].
    pub rating: rating::Summary,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Property`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Property {
    /// Returns [`Kind`] of this [`Property`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.details.kind()
    }

    /// Returns [`Locator`] of this [`Property`].
    #[must_use]
    pub fn locator(&self) -> Locator {
        Locator {
            kind: self.kind(),
            id: self.id,
        }
    }

    /// Extracts the comparable [`Figures`] of this [`Property`], if it passes
    /// the provided [`SubFilter`].
    ///
    /// Missing price or size is reported as zero. [`None`] means this
    /// [`Property`] is not a candidate at all: a [`Residential`] of a filtered
    /// out [`residential::Type`], or a [`Commercial`] without an active
    /// [`commercial::Deal`] or with a filtered out one.
    #[must_use]
    pub fn figures(&self, sub: &SubFilter) -> Option<Figures> {
        let (price, size) = match &self.details {
            Details::Agricultural(a) => (a.total_price, a.size),
            Details::Residential(r) => {
                if !sub.residential.accepts(&r.r#type) {
                    return None;
                }
                (r.total_cost, r.flat_size)
            }
            Details::Commercial(c) => {
                let (transaction, deal) = c.active_deal()?;
                if !sub.commercial.accepts(&transaction) {
                    return None;
                }
                (deal.total_amount, deal.plot_size)
            }
            Details::Layout(l) => (l.total_amount, l.plot_size),
        };

        Some(Figures {
            price: price.unwrap_or_default(),
            size: size.unwrap_or_default(),
            status: self.status,
        })
    }

    /// Changes the [`Status`] of this [`Property`].
    ///
    /// A sold [`Layout`] has no plots available anymore, even if it was
    /// already sold before.
    ///
    /// Returns `false` if nothing has changed.
    pub fn set_status(&mut self, status: Status) -> bool {
        let mut changed = self.status != status;
        self.status = status;
        if let (Status::Sold, Details::Layout(l)) = (status, &mut self.details)
        {
            changed |= l.available_plots != Some(0);
            l.available_plots = Some(0);
        }
        changed
    }
}

/// [`Kind`]-specific details of a [`Property`].
#[derive(Clone, Debug, Eq, From, PartialEq)]
pub enum Details {
    #[doc(hidden)]
    Agricultural(Agricultural),
    #[doc(hidden)]
    Residential(Residential),
    #[doc(hidden)]
    Commercial(Commercial),
    #[doc(hidden)]
    Layout(Layout),
}

impl Details {
    /// Returns [`Kind`] of these [`Details`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Agricultural(_) => Kind::Agricultural,
            Self::Residential(_) => Kind::Residential,
            Self::Commercial(_) => Kind::Commercial,
            Self::Layout(_) => Kind::Layout,
        }
    }
}

/// ID of a [`Property`].
///
/// Unique only within a single [`Kind`], so a [`Locator`] is required to
/// address a [`Property`] unambiguously.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Address of a [`Property`] in the storage of its [`Kind`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[display("{kind}({id})")]
pub struct Locator {
    /// [`Kind`] of the [`Property`].
    pub kind: Kind,

    /// ID of the [`Property`].
    pub id: Id,
}

define_kind! {
    #[doc = "Kind of a [`Property`]."]
    enum Kind {
        #[doc = "[`Agricultural`] land."]
        Agricultural = 1,

        #[doc = "[`Residential`] unit."]
        Residential = 2,

        #[doc = "[`Commercial`] land."]
        Commercial = 3,

        #[doc = "[`Layout`] of plots."]
        Layout = 4,
    }
}

define_kind! {
    #[doc = "Sale status of a [`Property`]."]
    enum Status {
        #[doc = "Still on the market."]
        Unsold = 0,

        #[doc = "Sold already."]
        Sold = 1,
    }
}

/// Comparable figures of a [`Property`], extracted by [`Property::figures()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Figures {
    /// Price, zero if unknown.
    pub price: Amount,

    /// Size, zero if unknown.
    pub size: Amount,

    /// Sale [`Status`].
    pub status: Status,
}

/// Sub-category constraints applied by [`Property::figures()`].
///
/// Each constraint affects only the [`Kind`] it belongs to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubFilter {
    /// Accepted [`residential::Type`]s.
    pub residential: Filter<residential::Type>,

    /// Accepted [`commercial::Transaction`]s.
    pub commercial: Filter<commercial::Transaction>,
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

/// [`DateTime`] when a [`Property`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Property, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{Amount, DateTime, Filter};

    use crate::domain::{rating, user};

    use super::{
        commercial::{self, Deal, LandUsage, Transaction},
        residential, Agricultural, Commercial, Details, Figures, Id, Kind,
        Layout, Property, Residential, Status, SubFilter,
    };

    fn property(details: impl Into<Details>) -> Property {
        Property {
            id: Id::new(),
            owner_id: user::Id::new(),
            status: Status::Unsold,
            details: details.into(),
            rating: rating::Summary::default(),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn rent_only() -> Property {
        property(Commercial {
            sell: Some(Deal::default()),
            rent: Some(Deal {
                land_usage: vec![LandUsage::new("warehouse").unwrap()],
                plot_size: Some(Amount::from(500)),
                total_amount: Some(Amount::from(20_000)),
            }),
            lease: None,
        })
    }

    #[test]
    fn agricultural_ignores_sub_filter() {
        let p = property(Agricultural {
            size: Some(Amount::from(3)),
            total_price: Some(Amount::from(150_000)),
        });
        let sub = SubFilter {
            residential: Filter::only([residential::Type::House]),
            commercial: Filter::only([Transaction::Lease]),
        };

        assert_eq!(p.kind(), Kind::Agricultural);
        assert_eq!(
            p.figures(&sub),
            Some(Figures {
                price: Amount::from(150_000),
                size: Amount::from(3),
                status: Status::Unsold,
            }),
        );
    }

    #[test]
    fn missing_numbers_are_zero() {
        let p = property(Layout::default());

        let figures = p.figures(&SubFilter::default()).unwrap();
        assert_eq!(figures.price, Amount::ZERO);
        assert_eq!(figures.size, Amount::ZERO);
    }

    #[test]
    fn residential_respects_type_filter() {
        let p = property(Residential {
            r#type: residential::Type::Flat,
            flat_size: Some(Amount::from(80)),
            total_cost: None,
        });

        let flats = SubFilter {
            residential: Filter::only([residential::Type::Flat]),
            ..SubFilter::default()
        };
        let houses = SubFilter {
            residential: Filter::only([residential::Type::House]),
            ..SubFilter::default()
        };

        assert_eq!(p.figures(&flats).map(|f| f.size), Some(Amount::from(80)));
        assert_eq!(p.figures(&flats).map(|f| f.price), Some(Amount::ZERO));
        assert!(p.figures(&houses).is_none());
        assert!(p.figures(&SubFilter::default()).is_some());
    }

    #[test]
    fn commercial_uses_active_deal_only() {
        let p = rent_only();

        let sell = SubFilter {
            commercial: Filter::only([Transaction::Sell]),
            ..SubFilter::default()
        };
        let rent = SubFilter {
            commercial: Filter::only([Transaction::Rent]),
            ..SubFilter::default()
        };

        assert!(p.figures(&sell).is_none());
        assert_eq!(
            p.figures(&rent).map(|f| (f.price, f.size)),
            Some((Amount::from(20_000), Amount::from(500))),
        );
        assert_eq!(
            p.figures(&SubFilter::default()).map(|f| f.size),
            Some(Amount::from(500)),
        );
    }

    #[test]
    fn commercial_without_active_deal_is_skipped() {
        let p = property(commercial::Commercial::default());

        assert!(p.figures(&SubFilter::default()).is_none());
    }

    #[test]
    fn sold_layout_has_no_plots() {
        let mut p = property(Layout {
            plot_size: Some(Amount::from(240)),
            total_amount: Some(Amount::from(1_000_000)),
            available_plots: Some(12),
        });

        assert!(!p.set_status(Status::Unsold));
        assert!(p.set_status(Status::Sold));
        assert_eq!(p.status, Status::Sold);
        assert!(matches!(
            p.details,
            Details::Layout(Layout {
                available_plots: Some(0),
                ..
            }),
        ));
    }

    #[test]
    fn resold_layout_drops_stale_plots() {
        let mut p = property(Layout {
            available_plots: Some(3),
            ..Layout::default()
        });
        p.status = Status::Sold;

        assert!(p.set_status(Status::Sold));
        assert!(matches!(
            p.details,
            Details::Layout(Layout {
                available_plots: Some(0),
                ..
            }),
        ));
        assert!(!p.set_status(Status::Sold));
    }

    #[test]
    fn status_change_keeps_other_kinds_intact() {
        let mut p = rent_only();
        let before = p.details.clone();

        assert!(p.set_status(Status::Sold));
        assert_eq!(p.details, before);
        assert_eq!(p.figures(&SubFilter::default()).unwrap().status, Status::Sold);
    }
}
