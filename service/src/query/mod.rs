//! [`Query`] definition.

pub mod max_value;
pub mod rating_distribution;

/// [`Query`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Query;

pub use self::{
    max_value::MaxValue, rating_distribution::RatingDistribution,
};
