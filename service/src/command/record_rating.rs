//! [`Command`] for recording a new [`Rating`] of a [`Property`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, rating, user, Property, Rating},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a new [`Rating`] of a [`Property`] and
/// recomputing its [`rating::Summary`].
#[derive(Clone, Copy, Debug)]
pub struct RecordRating {
    /// [`property::Locator`] of the rated [`Property`].
    pub property: property::Locator,

    /// ID of the rating user, if the request is authenticated.
    pub rater_id: Option<user::Id>,

    /// [`rating::Value`] of the new [`Rating`].
    pub value: rating::Value,
}

impl<Db> Command<RecordRating> for Service<Db>
where
    Db: Database<Insert<Rating>, Err = Traced<database::Error>>
        + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Locator>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Rating>, property::Locator>>,
            Ok = Vec<Rating>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Locator>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = rating::Summary;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: RecordRating) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordRating {
            property: locator,
            rater_id,
            value,
        } = cmd;

        let rater_id = rater_id
            .ok_or(E::RaterMissing)
            .map_err(tracerr::wrap!())?;

        // Stored on its own, so it survives a failed summary write.
        self.database()
            .execute(Insert(Rating {
                id: rating::Id::new(),
                rater_id,
                property: locator,
                value,
                created_at: DateTime::now().coerce(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize concurrent recomputations of the same `Property`.
        tx.execute(Lock(By::new(locator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let ratings = tx
            .execute(Select(By::<Vec<Rating>, _>::new(locator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let latest = rating::latest_per_rater(ratings);
        let summary = rating::Summary::of_latest(&latest);

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(locator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(locator))
            .map_err(tracerr::wrap!())?;

        property.rating = summary;
        property.updated_at = DateTime::now().coerce();

        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::debug!(
            property = %locator,
            count = summary.count,
            average = %summary.average,
            "rating summary recomputed",
        );

        Ok(summary)
    }
}

/// Error of [`RecordRating`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided [`property::Locator`] does not exist.
    #[display("`Property({_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Locator),

    /// No authenticated user to attribute the [`Rating`] to.
    #[display("Rater is not authenticated")]
    RaterMissing,
}

#[cfg(test)]
mod spec {
    use std::{str::FromStr as _, time::Duration};

    use common::{
        operations::{By, Commit, Lock, Transact},
        Amount, DateTime, Filter,
    };

    use crate::{
        domain::{
            property::{
                self,
                commercial::{Deal, LandUsage, Transaction},
                Commercial, Layout, Status, SubFilter,
            },
            rating, user, Property,
        },
        infra::{database::Memory, Database as _},
        query::{MaxValue, RatingDistribution},
        read::property::Metric,
        Command as _, Query as _, Service,
    };

    use super::{ExecutionError, RecordRating};

    fn value(s: &str) -> rating::Value {
        rating::Value::from_str(s).unwrap()
    }

    fn commercial_for_sale() -> Property {
        commercial_for_sale_with_id(property::Id::new())
    }

    fn commercial_for_sale_with_id(id: property::Id) -> Property {
        Property {
            id,
            owner_id: user::Id::new(),
            status: Status::Unsold,
            details: Commercial {
                sell: Some(Deal {
                    land_usage: vec![LandUsage::new("retail").unwrap()],
                    plot_size: Some(Amount::from(1200)),
                    total_amount: Some(Amount::from(900_000)),
                }),
                ..Commercial::default()
            }
            .into(),
            rating: rating::Summary::default(),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn rates_and_aggregates() {
        let db = Memory::default();
        let property = commercial_for_sale();
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db.clone());

        let summary = service
            .execute(RecordRating {
                property: locator,
                rater_id: Some(user::Id::new()),
                value: value("4.8"),
            })
            .await
            .unwrap();

        assert_eq!(summary.average, rust_decimal::Decimal::new(480, 2));
        assert_eq!(summary.count, 1);
        assert_eq!(summary.histogram.five, 1);
        assert_eq!(summary.histogram.total(), 1);

        let stored = db.get(locator).unwrap();
        assert_eq!(stored.rating, summary);

        let max = service
            .execute(MaxValue {
                kind: property::Kind::Commercial,
                metric: Metric::Size,
                sub: SubFilter {
                    commercial: Filter::only([Transaction::Sell]),
                    ..SubFilter::default()
                },
                status: Filter::any(),
                owner_id: None,
            })
            .await
            .unwrap();
        assert!(max.value >= Amount::from(1200));
    }

    #[tokio::test]
    async fn rerating_supersedes_previous() {
        let db = Memory::default();
        let property = commercial_for_sale();
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db);
        let (a, b) = (user::Id::new(), user::Id::new());

        for (rater, v) in [(a, "3"), (a, "5"), (b, "4")] {
            _ = service
                .execute(RecordRating {
                    property: locator,
                    rater_id: Some(rater),
                    value: value(v),
                })
                .await
                .unwrap();
        }
        let summary = service
            .execute(RecordRating {
                property: locator,
                rater_id: Some(b),
                value: value("4"),
            })
            .await
            .unwrap();

        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, rust_decimal::Decimal::new(450, 2));
        assert_eq!(summary.histogram.four, 1);
        assert_eq!(summary.histogram.five, 1);
    }

    #[tokio::test]
    async fn requires_rater() {
        let db = Memory::default();
        let property = commercial_for_sale();
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db.clone());

        let err = service
            .execute(RecordRating {
                property: locator,
                rater_id: None,
                value: value("3"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::RaterMissing));
        assert!(db.ratings().is_empty());
    }

    #[tokio::test]
    async fn keeps_rating_of_missing_property() {
        let db = Memory::default();
        let service = Service::new(db.clone());
        let locator = property::Locator {
            kind: property::Kind::Layout,
            id: property::Id::new(),
        };

        let err = service
            .execute(RecordRating {
                property: locator,
                rater_id: Some(user::Id::new()),
                value: value("2"),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotExists(l) if *l == locator,
        ));
        assert_eq!(db.ratings().len(), 1);

        // The lock is released, so the next rating goes through.
        let mut layout = commercial_for_sale();
        layout.id = locator.id;
        layout.details = Layout::default().into();
        db.put(layout);
        let summary = service
            .execute(RecordRating {
                property: locator,
                rater_id: Some(user::Id::new()),
                value: value("4"),
            })
            .await
            .unwrap();
        assert_eq!(summary.count, 2);
    }

    #[tokio::test]
    async fn same_id_of_other_kind_is_rated_separately() {
        let db = Memory::default();
        let id = property::Id::new();
        let mut layout = commercial_for_sale_with_id(id);
        layout.details = Layout::default().into();
        let commercial = commercial_for_sale_with_id(id);
        let (layout, commercial) = {
            let locators = (layout.locator(), commercial.locator());
            db.put(layout);
            db.put(commercial);
            locators
        };
        let service = Service::new(db.clone());

        for (property, v) in [(commercial, "1"), (layout, "5")] {
            _ = service
                .execute(RecordRating {
                    property,
                    rater_id: Some(user::Id::new()),
                    value: value(v),
                })
                .await
                .unwrap();
        }

        let stored = db.get(layout).unwrap();
        assert_eq!(stored.rating.count, 1);
        assert_eq!(stored.rating.average, rust_decimal::Decimal::from(5));
        let dist = service
            .execute(RatingDistribution { property: layout })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dist.histogram.total() + dist.zero, stored.rating.count);
        assert_eq!(db.get(commercial).unwrap().rating.count, 1);
    }

    #[tokio::test]
    async fn concurrent_ratings_wait_for_lock() {
        let db = Memory::default();
        let property = commercial_for_sale();
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db.clone());

        let holder = db.execute(Transact).await.unwrap();
        holder
            .execute(Lock(By::<Property, _>::new(locator)))
            .await
            .unwrap();

        let rate = |v: &'static str| {
            let service = service.clone();
            async move {
                service
                    .execute(RecordRating {
                        property: locator,
                        rater_id: Some(user::Id::new()),
                        value: value(v),
                    })
                    .await
                    .unwrap()
            }
        };
        let rates = async { tokio::join!(rate("1"), rate("5")) };
        tokio::pin!(rates);

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), rates.as_mut())
                .await;
        assert!(blocked.is_err(), "recomputed without the lock");
        assert_eq!(db.ratings().len(), 2);
        assert_eq!(db.get(locator).unwrap().rating.count, 0);

        holder.execute(Commit).await.unwrap();
        let (first, second) = rates.await;

        assert_eq!(first.count, 2);
        assert_eq!(second.count, 2);
        let stored = db.get(locator).unwrap();
        assert_eq!(stored.rating.count, 2);
        assert_eq!(stored.rating.average, rust_decimal::Decimal::from(3));
    }
}
