//! Rating-related definitions.

use std::str::FromStr as _;

use derive_more::{From, Into};
use juniper::graphql_object;
use service::domain::rating;

use crate::{define_error, AsError as _, Context, Error};

/// Converts a counter into its GraphQL representation.
fn int(count: u32) -> Result<i32, Error> {
    i32::try_from(count).map_err(|e| e.into_error())
}

/// Parses the provided raw rating value.
///
/// # Errors
///
/// With `INVALID_RATING` code if the `value` is not a number in the `(0, 5]`
/// range.
pub fn parse_value(value: &str) -> Result<rating::Value, Error> {
    rating::Value::from_str(value)
        .map_err(|e| Error::from(RatingError::Invalid).with_details(e))
}

/// Rating summary of a `Property`.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Summary(rating::Summary);

/// Rating summary of a `Property`, accounting only the latest rating of
/// every rater.
#[graphql_object(name = "RatingSummary", context = Context)]
impl Summary {
    /// Average rating, formatted with exactly 2 decimal places (e.g.
    /// `"4.50"`). `"0.00"` if there are no ratings.
    pub fn average(&self) -> String {
        format!("{:.2}", self.0.average)
    }

    /// Number of distinct raters.
    pub fn count(&self) -> Result<i32, Error> {
        int(self.0.count)
    }

    /// Number of ratings per star.
    pub fn histogram(&self) -> Histogram {
        self.0.histogram.into()
    }
}

/// Number of ratings per star.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Histogram(rating::Histogram);

/// Number of ratings per star, from one to five.
#[graphql_object(name = "RatingHistogram", context = Context)]
impl Histogram {
    /// Number of one-star ratings.
    pub fn one(&self) -> Result<i32, Error> {
        int(self.0.one)
    }

    /// Number of two-star ratings.
    pub fn two(&self) -> Result<i32, Error> {
        int(self.0.two)
    }

    /// Number of three-star ratings.
    pub fn three(&self) -> Result<i32, Error> {
        int(self.0.three)
    }

    /// Number of four-star ratings.
    pub fn four(&self) -> Result<i32, Error> {
        int(self.0.four)
    }

    /// Number of five-star ratings.
    pub fn five(&self) -> Result<i32, Error> {
        int(self.0.five)
    }
}

/// Star distribution of the ratings of a `Property`.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Distribution(rating::Distribution);

/// Star distribution of the ratings of a `Property`, including the ones
/// below half a star.
#[graphql_object(name = "RatingDistribution", context = Context)]
impl Distribution {
    /// One to five star buckets.
    pub fn histogram(&self) -> Histogram {
        self.0.histogram.into()
    }

    /// Number of ratings below half a star.
    pub fn zero(&self) -> Result<i32, Error> {
        int(self.0.zero)
    }

    /// Total number of the distributed ratings.
    pub fn total(&self) -> Result<i32, Error> {
        int(self.0.total())
    }
}

define_error! {
    enum RatingError {
        #[code = "INVALID_RATING"]
        #[status = BAD_REQUEST]
        #[message = "Rating must be a number in `(0, 5]` range"]
        Invalid,

        #[code = "RATING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` with the provided ID has no ratings"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use super::parse_value;

    #[test]
    fn parses_valid_value() {
        assert_eq!(parse_value(" 4.5 ").unwrap().to_string(), "4.5");
        assert_eq!(parse_value("5").unwrap().to_string(), "5");
    }

    #[test]
    fn rejects_out_of_range_value() {
        for raw in ["0", "5.01", "-1", "five", ""] {
            let err = parse_value(raw).unwrap_err();

            assert_eq!(err.code, "INVALID_RATING", "for {raw:?}");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }
}
