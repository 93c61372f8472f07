//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, context::AuthError, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Rates the `Property` on behalf of the acting `User`, superseding their
    /// previous rating of it, and returns the recomputed `RatingSummary`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the acting `User` is anonymous;
    /// - `INVALID_RATING` - `value` is not a number in `(0, 5]` range;
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "rateProperty",
            id = %id,
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
            value = %value,
        ),
    )]
    pub async fn rate_property(
        kind: api::property::Kind,
        id: api::property::Id,
        value: String,
        ctx: &Context,
    ) -> Result<api::rating::Summary, Error> {
        let value = api::rating::parse_value(&value).map_err(ctx.error())?;

        ctx.service()
            .execute(command::RecordRating {
                property: api::property::locator(kind, id),
                rater_id: ctx.current_user()?,
                value,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Marks the `Property` as sold or unsold.
    ///
    /// Marking a layout as sold leaves no plots available in it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the acting `User` is anonymous;
    /// - `PROPERTY_NOT_EXISTS` - the `Property` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updatePropertyStatus",
            id = %id,
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_property_status(
        kind: api::property::Kind,
        id: api::property::Id,
        status: api::property::Status,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        _ = ctx.required_user()?;

        ctx.service()
            .execute(command::UpdatePropertyStatus {
                property: api::property::locator(kind, id),
                status: status.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::record_rating::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
            Self::RaterMissing => AuthError::AuthorizationRequired.into(),
        })
    }
}

impl AsError for command::update_property_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => api::PropertyError::NotExists.into(),
        })
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{record_rating, update_property_status},
        domain::property,
    };

    use crate::AsError as _;

    fn locator() -> property::Locator {
        property::Locator {
            kind: property::Kind::Layout,
            id: property::Id::new(),
        }
    }

    #[test]
    fn missing_rater_requires_authorization() {
        let err = record_rating::ExecutionError::RaterMissing.as_error();

        assert_eq!(err.code, "AUTHORIZATION_REQUIRED");
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_property_is_not_found() {
        let rating =
            record_rating::ExecutionError::PropertyNotExists(locator())
                .as_error();
        let status =
            update_property_status::ExecutionError::PropertyNotExists(
                locator(),
            )
            .as_error();

        for err in [rating, status] {
            assert_eq!(err.code, "PROPERTY_NOT_EXISTS");
            assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
        }
    }
}
