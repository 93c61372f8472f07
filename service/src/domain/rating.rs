//! [`Rating`] definitions.

use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use common::DateTime;

use crate::domain::{property, user};
#[cfg(doc)]
use crate::domain::Property;

/// Score given by a user to a [`Property`].
///
/// [`Rating`]s are never modified once created. A user rating the same
/// [`Property`] again creates a new [`Rating`] superseding the previous one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rating {
    /// ID of this [`Rating`].
    pub id: Id,

    /// ID of the user who left this [`Rating`].
    pub rater_id: user::Id,

    /// [`property::Locator`] of the rated [`Property`].
    pub property: property::Locator,

    /// [`Value`] of this [`Rating`].
    pub value: Value,

    /// [`DateTime`] when this [`Rating`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Rating`].
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
    PartialEq,
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

/// Value of a [`Rating`], in the `(0, 5]` range.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Value(Decimal);

impl Value {
    /// Highest possible [`Value`].
    pub const MAX: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

    /// Creates a new [`Value`] if the provided `value` is in the `(0, 5]`
    /// range.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO && value <= Self::MAX).then_some(Self(value))
    }

    /// Returns the underlying [`Decimal`] of this [`Value`].
    #[must_use]
    pub const fn decimal(self) -> Decimal {
        self.0
    }

    /// Returns the star bucket of this [`Value`].
    ///
    /// Buckets are half-open and centered on whole stars, so `4.5` is five
    /// stars while `4.49` is four. [`Value`]s below `0.5` get zero stars.
    #[must_use]
    pub fn stars(self) -> u8 {
        /// Lower bounds of the 5, 4, 3, 2 and 1 star buckets.
        const BOUNDS: [(i64, u8); 5] =
            [(45, 5), (35, 4), (25, 3), (15, 2), (5, 1)];

        BOUNDS
            .iter()
            .find(|&&(bound, _)| self.0 >= Decimal::new(bound, 1))
            .map_or(0, |&(_, stars)| stars)
    }
}

impl FromStr for Value {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| "invalid number")?;
        Self::new(value).ok_or("`Value` must be in `(0, 5]` range")
    }
}

impl TryFrom<Decimal> for Value {
    type Error = &'static str;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or("`Value` must be in `(0, 5]` range")
    }
}

/// Keeps only the latest [`Rating`] of every rater.
///
/// Result is ordered by rater. Among [`Rating`]s of the same rater created at
/// the same instant, the first provided one wins.
#[must_use]
pub fn latest_per_rater(mut ratings: Vec<Rating>) -> Vec<Rating> {
    ratings.sort_by(|a, b| {
        a.rater_id
            .cmp(&b.rater_id)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ratings.dedup_by_key(|r| r.rater_id);
    ratings
}

/// Rating summary of a [`Property`], recomputed in full from its latest
/// [`Rating`]s per rater whenever a new [`Rating`] arrives.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Mean [`Value`], rounded half away from zero to 2 decimal places.
    ///
    /// Zero if there are no [`Rating`]s.
    pub average: Decimal,

    /// Number of distinct raters.
    pub count: u32,

    /// Star distribution of the counted [`Rating`]s.
    pub histogram: Histogram,
}

impl Summary {
    /// Computes a [`Summary`] of the provided [`Rating`]s, which are expected
    /// to be the [`latest_per_rater()`] ones already.
    #[must_use]
    pub fn of_latest(latest: &[Rating]) -> Self {
        let count = u32::try_from(latest.len()).unwrap_or(u32::MAX);
        if count == 0 {
            return Self::default();
        }

        let sum: Decimal = latest.iter().map(|r| r.value.decimal()).sum();
        let average = (sum / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            average,
            count,
            histogram: Distribution::of_latest(latest).histogram,
        }
    }
}

/// Number of [`Rating`]s per star bucket, zero-star ones excluded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Histogram {
    /// Number of one-star [`Rating`]s.
    pub one: u32,

    /// Number of two-star [`Rating`]s.
    pub two: u32,

    /// Number of three-star [`Rating`]s.
    pub three: u32,

    /// Number of four-star [`Rating`]s.
    pub four: u32,

    /// Number of five-star [`Rating`]s.
    pub five: u32,
}

impl Histogram {
    /// Returns the counter of the provided `stars` bucket, if it's tracked.
    fn bucket_mut(&mut self, stars: u8) -> Option<&mut u32> {
        match stars {
            1 => Some(&mut self.one),
            2 => Some(&mut self.two),
            3 => Some(&mut self.three),
            4 => Some(&mut self.four),
            5 => Some(&mut self.five),
            _ => None,
        }
    }

    /// Returns the total number of bucketed [`Rating`]s.
    #[must_use]
    pub fn total(&self) -> u32 {
        [self.one, self.two, self.three, self.four, self.five]
            .into_iter()
            .fold(0, u32::saturating_add)
    }
}

/// Star distribution of [`Rating`]s, including the zero-star bucket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Distribution {
    /// One to five star buckets.
    pub histogram: Histogram,

    /// Number of [`Rating`]s below half a star.
    pub zero: u32,
}

impl Distribution {
    /// Buckets the provided [`Rating`]s, which are expected to be the
    /// [`latest_per_rater()`] ones already.
    #[must_use]
    pub fn of_latest(latest: &[Rating]) -> Self {
        let mut dist = Self::default();
        for r in latest {
            let counter = match dist.histogram.bucket_mut(r.value.stars()) {
                Some(c) => c,
                None => &mut dist.zero,
            };
            *counter = counter.saturating_add(1);
        }
        dist
    }

    /// Returns the total number of [`Rating`]s in this [`Distribution`].
    #[must_use]
    pub fn total(&self) -> u32 {
        self.histogram.total().saturating_add(self.zero)
    }
}

/// [`DateTime`] when a [`Rating`] was created.
pub type CreationDateTime = DateTimeOf<(Rating, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::domain::{property, user};

    use super::{
        latest_per_rater, Distribution, Histogram, Id, Rating, Summary, Value,
    };

    fn value(s: &str) -> Value {
        s.parse().unwrap()
    }

    fn locator() -> property::Locator {
        property::Locator {
            kind: property::Kind::Commercial,
            id: property::Id::default(),
        }
    }

    fn rating(rater: user::Id, v: &str, secs: u64) -> Rating {
        Rating {
            id: Id::new(),
            rater_id: rater,
            property: locator(),
            value: value(v),
            created_at: (DateTime::UNIX_EPOCH + Duration::from_secs(secs))
                .coerce(),
        }
    }

    #[test]
    fn value_range() {
        assert!("0".parse::<Value>().is_err());
        assert!("-1".parse::<Value>().is_err());
        assert!("5.01".parse::<Value>().is_err());
        assert!("abc".parse::<Value>().is_err());
        assert_eq!(value("5").decimal(), Decimal::from(5));
        assert_eq!(value("0.01").decimal(), Decimal::new(1, 2));
    }

    #[test]
    fn star_boundaries() {
        assert_eq!(value("5").stars(), 5);
        assert_eq!(value("4.5").stars(), 5);
        assert_eq!(value("4.49999").stars(), 4);
        assert_eq!(value("3.5").stars(), 4);
        assert_eq!(value("2.5").stars(), 3);
        assert_eq!(value("1.5").stars(), 2);
        assert_eq!(value("1.49").stars(), 1);
        assert_eq!(value("0.5").stars(), 1);
        assert_eq!(value("0.49").stars(), 0);
    }

    #[test]
    fn keeps_latest_per_rater() {
        let (a, b) = (user::Id::new(), user::Id::new());
        let ratings = vec![
            rating(a, "3", 1),
            rating(b, "4", 3),
            rating(a, "5", 2),
        ];

        let latest = latest_per_rater(ratings);

        assert_eq!(latest.len(), 2);
        let of_a = latest.iter().find(|r| r.rater_id == a).unwrap();
        assert_eq!(of_a.value, value("5"));
    }

    #[test]
    fn summarizes_deduplicated() {
        let (a, b) = (user::Id::new(), user::Id::new());
        let latest = latest_per_rater(vec![
            rating(a, "3", 1),
            rating(a, "5", 2),
            rating(b, "4", 3),
        ]);

        assert_eq!(
            Summary::of_latest(&latest),
            Summary {
                average: Decimal::new(450, 2),
                count: 2,
                histogram: Histogram {
                    four: 1,
                    five: 1,
                    ..Histogram::default()
                },
            },
        );
    }

    #[test]
    fn rounds_average_half_away_from_zero() {
        let latest = latest_per_rater(vec![
            rating(user::Id::new(), "4.005", 1),
            rating(user::Id::new(), "4.005", 1),
        ]);
        assert_eq!(Summary::of_latest(&latest).average, Decimal::new(401, 2));

        let latest = latest_per_rater(vec![
            rating(user::Id::new(), "1", 1),
            rating(user::Id::new(), "1", 1),
            rating(user::Id::new(), "2", 1),
        ]);
        assert_eq!(Summary::of_latest(&latest).average, Decimal::new(133, 2));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let ratings = vec![
            rating(user::Id::new(), "2.2", 1),
            rating(user::Id::new(), "3.7", 2),
        ];

        let once = Summary::of_latest(&latest_per_rater(ratings.clone()));
        let twice = Summary::of_latest(&latest_per_rater(ratings));

        assert_eq!(once, twice);
        assert_eq!(once.histogram.total(), once.count);
    }

    #[test]
    fn empty_summary() {
        assert_eq!(Summary::of_latest(&[]), Summary::default());
        assert_eq!(Summary::default().average, Decimal::ZERO);
    }

    #[test]
    fn distribution_counts_zero_stars() {
        let latest = latest_per_rater(vec![
            rating(user::Id::new(), "0.2", 1),
            rating(user::Id::new(), "1", 1),
            rating(user::Id::new(), "4.6", 1),
        ]);

        let dist = Distribution::of_latest(&latest);
        assert_eq!(dist.zero, 1);
        assert_eq!(dist.histogram.one, 1);
        assert_eq!(dist.histogram.five, 1);
        assert_eq!(dist.total(), 3);

        let summary = Summary::of_latest(&latest);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.histogram.total(), 2);
    }
}
