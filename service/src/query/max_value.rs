//! [`Query`] computing the maximum price or size of [`Property`]s.

use common::{
    filter::{Token, TokenError},
    operations::{By, Select},
    Filter,
};
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, commercial, residential, Status, SubFilter},
        user, Property,
    },
    infra::{database, Database},
    read::property::{list::Selector, Maxima, Maximum, Metric},
    Query, Service,
};

/// [`Query`] computing the maximum [`Metric`] across [`Property`]s of a
/// single [`property::Kind`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MaxValue {
    /// [`property::Kind`] of the [`Property`]s to aggregate over.
    pub kind: property::Kind,

    /// [`Metric`] to aggregate.
    pub metric: Metric,

    /// Sub-category constraints.
    pub sub: SubFilter,

    /// Sale [`Status`] constraint.
    pub status: Filter<Status>,

    /// Owner of the [`Property`]s, if only a single owner's ones count.
    pub owner_id: Option<user::Id>,
}

impl<Db> Query<MaxValue> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Property>, Selector>>,
        Ok = Vec<Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Maximum;
    type Err = Traced<database::Error>;

    async fn execute(&self, query: MaxValue) -> Result<Self::Ok, Self::Err> {
        let MaxValue {
            kind,
            metric,
            sub,
            status,
            owner_id,
        } = query;

        let properties = self
            .database()
            .execute(Select(By::new(Selector { kind, owner_id })))
            .await
            .map_err(tracerr::wrap!())?;

        let maxima = properties
            .iter()
            .filter_map(|p| p.figures(&sub))
            .map(|f| {
                let value = match metric {
                    Metric::Price => f.price,
                    Metric::Size => f.size,
                };
                (value, f.status)
            })
            .collect::<Maxima>();

        let max = maxima.select(&status);
        tracing::debug!(
            %kind,
            ?metric,
            candidates = properties.len(),
            max = %max.value,
            "maximum computed",
        );
        Ok(max)
    }
}

/// Raw slider tokens of a [`MaxValue`] request.
///
/// Every token is either its own literal (e.g. `sell` for [`Slider::sell`]) or
/// the [`common::filter::WILDCARD`]. A dimension whose tokens are all the
/// wildcard is not constrained at all.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Slider<S = String> {
    /// `sell` or wildcard.
    pub sell: S,

    /// `rent` or wildcard.
    pub rent: S,

    /// `lease` or wildcard.
    pub lease: S,

    /// `flat` or wildcard.
    pub flat: S,

    /// `house` or wildcard.
    pub house: S,

    /// `sold` or wildcard.
    pub sold: S,

    /// `unsold` or wildcard.
    pub unsold: S,
}

impl<S: AsRef<str>> Slider<S> {
    /// Parses this [`Slider`] into a [`SubFilter`] and a [`Status`] [`Filter`].
    ///
    /// # Errors
    ///
    /// If any token is neither its literal nor the wildcard.
    pub fn filters(&self) -> Result<(SubFilter, Filter<Status>), TokenError> {
        use commercial::Transaction as T;
        use residential::Type as R;

        let commercial = [
            Token::expect("sell", self.sell.as_ref(), "sell", T::Sell)?,
            Token::expect("rent", self.rent.as_ref(), "rent", T::Rent)?,
            Token::expect("lease", self.lease.as_ref(), "lease", T::Lease)?,
        ]
        .into_iter()
        .collect();
        let residential = [
            Token::expect("flat", self.flat.as_ref(), "flat", R::Flat)?,
            Token::expect("house", self.house.as_ref(), "house", R::House)?,
        ]
        .into_iter()
        .collect();
        let status = [
            Token::expect("sold", self.sold.as_ref(), "sold", Status::Sold)?,
            Token::expect(
                "unsold",
                self.unsold.as_ref(),
                "unsold",
                Status::Unsold,
            )?,
        ]
        .into_iter()
        .collect();

        Ok((
            SubFilter {
                residential,
                commercial,
            },
            status,
        ))
    }
}

#[cfg(test)]
mod spec {
    use common::{filter::TokenError, Amount, DateTime, Filter};

    use crate::{
        domain::{
            property::{
                self,
                commercial::{Deal, LandUsage, Transaction},
                residential, Agricultural, Commercial, Details, Residential,
                Status, SubFilter,
            },
            rating, user, Property,
        },
        infra::database::Memory,
        read::property::{Maximum, Metric},
        Query as _, Service,
    };

    use super::{MaxValue, Slider};

    fn slider(tokens: [&'static str; 7]) -> Slider<&'static str> {
        let [sell, rent, lease, flat, house, sold, unsold] = tokens;
        Slider {
            sell,
            rent,
            lease,
            flat,
            house,
            sold,
            unsold,
        }
    }

    fn property(
        owner_id: user::Id,
        status: Status,
        details: impl Into<Details>,
    ) -> Property {
        Property {
            id: property::Id::new(),
            owner_id,
            status,
            details: details.into(),
            rating: rating::Summary::default(),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn commercial(
        transaction: Transaction,
        size: u32,
        price: u32,
    ) -> Commercial {
        let deal = Some(Deal {
            land_usage: vec![LandUsage::new("retail").unwrap()],
            plot_size: Some(Amount::from(size)),
            total_amount: Some(Amount::from(price)),
        });
        match transaction {
            Transaction::Sell => Commercial {
                sell: deal,
                ..Commercial::default()
            },
            Transaction::Rent => Commercial {
                rent: deal,
                ..Commercial::default()
            },
            Transaction::Lease => Commercial {
                lease: deal,
                ..Commercial::default()
            },
        }
    }

    fn query(
        kind: property::Kind,
        metric: Metric,
        tokens: [&'static str; 7],
    ) -> MaxValue {
        let (sub, status) = slider(tokens).filters().unwrap();
        MaxValue {
            kind,
            metric,
            sub,
            status,
            owner_id: None,
        }
    }

    #[test]
    fn parses_slider() {
        let (sub, status) =
            slider(["sell", "@", "@", "@", "house", "@", "unsold"])
                .filters()
                .unwrap();

        assert_eq!(
            sub,
            SubFilter {
                residential: Filter::only([residential::Type::House]),
                commercial: Filter::only([Transaction::Sell]),
            },
        );
        assert!(status.is_exactly(&Status::Unsold));

        let (sub, status) = slider(["@"; 7]).filters().unwrap();
        assert_eq!(sub, SubFilter::default());
        assert!(status.is_any());
    }

    #[test]
    fn rejects_unknown_slider_token() {
        assert_eq!(
            slider(["sell", "@", "@", "villa", "@", "@", "@"]).filters(),
            Err(TokenError {
                field: "flat",
                token: "villa".into(),
            }),
        );
        assert_eq!(
            slider(["@", "@", "@", "@", "@", "@", "rent"])
                .filters()
                .unwrap_err()
                .field,
            "unsold",
        );
    }

    #[tokio::test]
    async fn nothing_to_aggregate() {
        let service = Service::new(Memory::default());

        let max = service
            .execute(query(property::Kind::Layout, Metric::Price, ["@"; 7]))
            .await
            .unwrap();

        assert_eq!(
            max,
            Maximum {
                value: Amount::ZERO,
                is_present: false,
            },
        );
    }

    #[tokio::test]
    async fn commercial_transaction_filter() {
        let db = Memory::default();
        let owner = user::Id::new();
        db.put(property(
            owner,
            Status::Unsold,
            commercial(Transaction::Rent, 800, 40_000),
        ));
        db.put(property(
            owner,
            Status::Unsold,
            commercial(Transaction::Sell, 300, 90_000),
        ));
        let service = Service::new(db);

        let by_rent = service
            .execute(query(
                property::Kind::Commercial,
                Metric::Size,
                ["@", "rent", "@", "@", "@", "@", "@"],
            ))
            .await
            .unwrap();
        assert_eq!(by_rent.value, Amount::from(800));

        let by_sell = service
            .execute(query(
                property::Kind::Commercial,
                Metric::Size,
                ["sell", "@", "@", "@", "@", "@", "@"],
            ))
            .await
            .unwrap();
        assert_eq!(by_sell.value, Amount::from(300));

        let by_lease = service
            .execute(query(
                property::Kind::Commercial,
                Metric::Price,
                ["@", "@", "lease", "@", "@", "@", "@"],
            ))
            .await
            .unwrap();
        assert!(!by_lease.is_present);

        let any = service
            .execute(query(property::Kind::Commercial, Metric::Price, ["@"; 7]))
            .await
            .unwrap();
        assert_eq!(any.value, Amount::from(90_000));
    }

    #[tokio::test]
    async fn residential_combines_flats_and_houses() {
        let db = Memory::default();
        let owner = user::Id::new();
        for (r#type, cost, status) in [
            (residential::Type::Flat, 120, Status::Sold),
            (residential::Type::House, 300, Status::Unsold),
            (residential::Type::Flat, 150, Status::Unsold),
        ] {
            db.put(property(
                owner,
                status,
                Residential {
                    r#type,
                    flat_size: None,
                    total_cost: Some(Amount::from(cost)),
                },
            ));
        }
        let service = Service::new(db);

        let both = service
            .execute(query(
                property::Kind::Residential,
                Metric::Price,
                ["@", "@", "@", "flat", "house", "@", "@"],
            ))
            .await
            .unwrap();
        assert_eq!(both.value, Amount::from(300));

        let flats = service
            .execute(query(
                property::Kind::Residential,
                Metric::Price,
                ["@", "@", "@", "flat", "@", "@", "@"],
            ))
            .await
            .unwrap();
        assert_eq!(flats.value, Amount::from(150));

        let sold_flats = service
            .execute(query(
                property::Kind::Residential,
                Metric::Price,
                ["@", "@", "@", "flat", "@", "sold", "@"],
            ))
            .await
            .unwrap();
        assert_eq!(sold_flats.value, Amount::from(120));

        let sizes = service
            .execute(query(property::Kind::Residential, Metric::Size, ["@"; 7]))
            .await
            .unwrap();
        assert_eq!(
            sizes,
            Maximum {
                value: Amount::ZERO,
                is_present: true,
            },
        );
    }

    #[tokio::test]
    async fn scoped_to_owner() {
        let db = Memory::default();
        let (mine, theirs) = (user::Id::new(), user::Id::new());
        for (owner, price) in [(mine, 10), (theirs, 99)] {
            db.put(property(
                owner,
                Status::Unsold,
                Agricultural {
                    size: None,
                    total_price: Some(Amount::from(price)),
                },
            ));
        }
        let service = Service::new(db);

        let mut q =
            query(property::Kind::Agricultural, Metric::Price, ["@"; 7]);
        let all = service.execute(q.clone()).await.unwrap();
        assert_eq!(all.value, Amount::from(99));

        q.owner_id = Some(mine);
        let own = service.execute(q.clone()).await.unwrap();
        assert_eq!(own.value, Amount::from(10));

        q.owner_id = Some(user::Id::new());
        assert!(!service.execute(q).await.unwrap().is_present);
    }
}
