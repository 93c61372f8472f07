//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read::property::Metric, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Computes the maximum [`Metric`] of `Property`s of the provided
    /// [`api::property::Kind`].
    async fn max_value(
        metric: Metric,
        kind: api::property::Kind,
        slider: Option<api::property::Slider>,
        mine: Option<bool>,
        ctx: &Context,
    ) -> Result<api::property::Maximum, Error> {
        let (sub, status) = slider
            .unwrap_or_default()
            .tokens()
            .filters()
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let owner_id = if mine.unwrap_or_default() {
            Some(ctx.required_user()?)
        } else {
            None
        };

        ctx.service()
            .execute(query::MaxValue {
                kind: kind.into(),
                metric,
                sub,
                status,
                owner_id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the maximum price among `Property`s of the provided kind.
    ///
    /// `mine: true` narrows it to the `Property`s of the acting `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_FILTER_TOKEN` - a `slider` token is neither its own name nor
    ///                            the `"@"` wildcard;
    /// - `AUTHORIZATION_REQUIRED` - `mine` is requested by an anonymous
    ///                              `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "maxPrice",
            kind = ?kind,
            mine = ?mine,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn max_price(
        kind: api::property::Kind,
        slider: Option<api::property::Slider>,
        mine: Option<bool>,
        ctx: &Context,
    ) -> Result<api::property::Maximum, Error> {
        Self::max_value(Metric::Price, kind, slider, mine, ctx).await
    }

    /// Returns the maximum size among `Property`s of the provided kind.
    ///
    /// `mine: true` narrows it to the `Property`s of the acting `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_FILTER_TOKEN` - a `slider` token is neither its own name nor
    ///                            the `"@"` wildcard;
    /// - `AUTHORIZATION_REQUIRED` - `mine` is requested by an anonymous
    ///                              `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "maxSize",
            kind = ?kind,
            mine = ?mine,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn max_size(
        kind: api::property::Kind,
        slider: Option<api::property::Slider>,
        mine: Option<bool>,
        ctx: &Context,
    ) -> Result<api::property::Maximum, Error> {
        Self::max_value(Metric::Size, kind, slider, mine, ctx).await
    }

    /// Returns the star distribution of the `Property`'s ratings.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `RATING_NOT_EXISTS` - the `Property` has no ratings.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "ratingDistribution",
            id = %id,
            kind = ?kind,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn rating_distribution(
        kind: api::property::Kind,
        id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::rating::Distribution, Error> {
        ctx.service()
            .execute(query::RatingDistribution {
                property: api::property::locator(kind, id),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::rating::RatingError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}
