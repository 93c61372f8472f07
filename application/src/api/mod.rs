//! GraphQL API definitions.

mod mutation;
pub mod property;
mod query;
pub mod rating;
pub mod user;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{mutation::Mutation, property::Property, query::Query};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Property` with the provided ID does not exist"]
        NotExists,
    }
}
