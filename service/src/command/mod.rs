//! [`Command`] definition.

pub mod record_rating;
pub mod update_property_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    record_rating::RecordRating,
    update_property_status::UpdatePropertyStatus,
};
