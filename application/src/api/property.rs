//! [`Property`]-related definitions.

use common::{
    filter::{TokenError, WILDCARD},
    Amount, DateTime,
};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{domain, query::max_value, read};
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A property of any [`Kind`].
#[derive(Clone, Debug, From, Into)]
pub struct Property(domain::Property);

/// A property of any kind.
#[graphql_object(context = Context)]
impl Property {
    /// Unique identifier of this `Property` within its `PropertyKind`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Kind of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.kind",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn kind(&self) -> Kind {
        self.0.kind().into()
    }

    /// Owner of this `Property`.
    pub fn owner_id(&self) -> api::user::Id {
        self.0.owner_id.into()
    }

    /// Sale status of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Price of this `Property`.
    ///
    /// For a commercial land, it's the one of its active deal. `null` if the
    /// land has no active deal.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.price",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn price(&self) -> Option<Amount> {
        self.0
            .figures(&domain::property::SubFilter::default())
            .map(|f| f.price)
    }

    /// Size of this `Property`.
    ///
    /// For a commercial land, it's the one of its active deal. `null` if the
    /// land has no active deal.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.size",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn size(&self) -> Option<Amount> {
        self.0
            .figures(&domain::property::SubFilter::default())
            .map(|f| f.size)
    }

    /// Number of plots still available, for a layout only.
    pub fn available_plots(&self) -> Result<Option<i32>, Error> {
        let domain::property::Details::Layout(layout) = &self.0.details else {
            return Ok(None);
        };
        layout
            .available_plots
            .map(i32::try_from)
            .transpose()
            .map_err(AsError::into_error)
    }

    /// Rating summary of this `Property`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.rating",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn rating(&self) -> api::rating::Summary {
        self.0.rating.into()
    }

    /// `DateTime` when this `Property` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Property` was last updated.
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Property` within its `PropertyKind`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::property::Id)]
#[into(domain::property::Id)]
#[graphql(name = "PropertyId", transparent)]
pub struct Id(Uuid);

/// Kind of a `Property`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PropertyKind")]
pub enum Kind {
    /// An agricultural land.
    Agricultural,

    /// A flat or a house.
    Residential,

    /// A commercial land for sale, rent or lease.
    Commercial,

    /// A layout of plots.
    Layout,
}

impl From<domain::property::Kind> for Kind {
    fn from(kind: domain::property::Kind) -> Self {
        use domain::property::Kind as K;
        match kind {
            K::Agricultural => Self::Agricultural,
            K::Residential => Self::Residential,
            K::Commercial => Self::Commercial,
            K::Layout => Self::Layout,
        }
    }
}

impl From<Kind> for domain::property::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Agricultural => Self::Agricultural,
            Kind::Residential => Self::Residential,
            Kind::Commercial => Self::Commercial,
            Kind::Layout => Self::Layout,
        }
    }
}

/// Builds a [`domain::property::Locator`] out of GraphQL arguments.
#[must_use]
pub fn locator(kind: Kind, id: Id) -> domain::property::Locator {
    domain::property::Locator {
        kind: kind.into(),
        id: id.into(),
    }
}

/// Sale status of a `Property`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PropertyStatus")]
pub enum Status {
    /// Still on the market.
    Unsold,

    /// Sold already.
    Sold,
}

impl From<domain::property::Status> for Status {
    fn from(status: domain::property::Status) -> Self {
        use domain::property::Status as S;
        match status {
            S::Unsold => Self::Unsold,
            S::Sold => Self::Sold,
        }
    }
}

impl From<Status> for domain::property::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Unsold => Self::Unsold,
            Status::Sold => Self::Sold,
        }
    }
}

/// Filter tokens narrowing `Property` aggregates.
///
/// Every token is either its own field name (e.g. `"sell"` for `sell`) or
/// the `"@"` wildcard. Omitted tokens are wildcards.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "PropertySlider")]
pub struct Slider {
    /// `"sell"` to count commercial lands for sale.
    pub sell: Option<String>,

    /// `"rent"` to count commercial lands for rent.
    pub rent: Option<String>,

    /// `"lease"` to count commercial lands for lease.
    pub lease: Option<String>,

    /// `"flat"` to count residential flats.
    pub flat: Option<String>,

    /// `"house"` to count residential houses.
    pub house: Option<String>,

    /// `"sold"` to count sold properties.
    pub sold: Option<String>,

    /// `"unsold"` to count unsold properties.
    pub unsold: Option<String>,
}

impl Slider {
    /// Returns the raw tokens of this [`Slider`], omitted ones replaced with
    /// the wildcard.
    #[must_use]
    pub fn tokens(&self) -> max_value::Slider<&str> {
        max_value::Slider {
            sell: self.sell.as_deref().unwrap_or(WILDCARD),
            rent: self.rent.as_deref().unwrap_or(WILDCARD),
            lease: self.lease.as_deref().unwrap_or(WILDCARD),
            flat: self.flat.as_deref().unwrap_or(WILDCARD),
            house: self.house.as_deref().unwrap_or(WILDCARD),
            sold: self.sold.as_deref().unwrap_or(WILDCARD),
            unsold: self.unsold.as_deref().unwrap_or(WILDCARD),
        }
    }
}

impl AsError for TokenError {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::new(
            "INVALID_FILTER_TOKEN",
            http::StatusCode::BAD_REQUEST,
            self,
        ))
    }
}

/// Maximum price or size of `Property`s.
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Maximum(read::property::Maximum);

/// Maximum price or size of `Property`s.
#[graphql_object(name = "PropertyMaximum", context = Context)]
impl Maximum {
    /// Maximum value, `"0"` if no `Property` matched.
    pub fn value(&self) -> Amount {
        self.0.value
    }

    /// Indicator whether any `Property` matched at all.
    pub fn is_present(&self) -> bool {
        self.0.is_present
    }
}
