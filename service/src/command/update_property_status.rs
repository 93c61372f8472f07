//! [`Command`] for updating the sale [`Status`] of a [`Property`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Status},
        Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the sale [`Status`] of a [`Property`].
#[derive(Clone, Copy, Debug)]
pub struct UpdatePropertyStatus {
    /// [`property::Locator`] of the [`Property`] to update.
    pub property: property::Locator,

    /// New [`Status`] of the [`Property`].
    pub status: Status,
}

impl<Db> Command<UpdatePropertyStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Property, property::Locator>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Locator>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdatePropertyStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePropertyStatus {
            property: locator,
            status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid racing with rating summary recomputations.
        tx.execute(Lock(By::new(locator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(locator)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(locator))
            .map_err(tracerr::wrap!())?;

        if !property.set_status(status) {
            return Ok(property);
        }
        property.updated_at = DateTime::now().coerce();

        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tracing::info!(property = %locator, %status, "status changed");

        Ok(property)
    }
}

/// Error of [`UpdatePropertyStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided [`property::Locator`] does not exist.
    #[display("`Property({_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Locator),
}

#[cfg(test)]
mod spec {
    use common::{Amount, DateTime};

    use crate::{
        domain::{
            property::{self, Details, Layout, Status},
            rating, user, Property,
        },
        infra::database::Memory,
        Command as _, Service,
    };

    use super::{ExecutionError, UpdatePropertyStatus};

    fn layout() -> Property {
        Property {
            id: property::Id::new(),
            owner_id: user::Id::new(),
            status: Status::Unsold,
            details: Layout {
                plot_size: Some(Amount::from(200)),
                total_amount: Some(Amount::from(5_000_000)),
                available_plots: Some(40),
            }
            .into(),
            rating: rating::Summary::default(),
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::UNIX_EPOCH.coerce(),
        }
    }

    #[tokio::test]
    async fn sold_layout_has_no_plots_left() {
        let db = Memory::default();
        let property = layout();
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db.clone());

        let updated = service
            .execute(UpdatePropertyStatus {
                property: locator,
                status: Status::Sold,
            })
            .await
            .unwrap();

        assert_eq!(updated.status, Status::Sold);
        assert!(updated.updated_at > DateTime::UNIX_EPOCH.coerce());
        let stored = db.get(locator).unwrap();
        assert_eq!(stored, updated);
        assert!(matches!(
            stored.details,
            Details::Layout(Layout {
                available_plots: Some(0),
                ..
            }),
        ));
    }

    #[tokio::test]
    async fn unchanged_status_is_noop() {
        let db = Memory::default();
        let property = layout();
        let locator = property.locator();
        db.put(property.clone());
        let service = Service::new(db.clone());

        let same = service
            .execute(UpdatePropertyStatus {
                property: locator,
                status: Status::Unsold,
            })
            .await
            .unwrap();

        assert_eq!(same, property);
        assert_eq!(db.get(locator).unwrap(), property);
    }

    #[tokio::test]
    async fn sold_layout_with_stale_plots_is_repaired() {
        let db = Memory::default();
        let mut property = layout();
        property.status = Status::Sold;
        let locator = property.locator();
        db.put(property);
        let service = Service::new(db.clone());

        let updated = service
            .execute(UpdatePropertyStatus {
                property: locator,
                status: Status::Sold,
            })
            .await
            .unwrap();

        assert!(updated.updated_at > DateTime::UNIX_EPOCH.coerce());
        assert!(matches!(
            db.get(locator).unwrap().details,
            Details::Layout(Layout {
                available_plots: Some(0),
                ..
            }),
        ));
    }

    #[tokio::test]
    async fn missing_property() {
        let service = Service::new(Memory::default());
        let locator = property::Locator {
            kind: property::Kind::Residential,
            id: property::Id::new(),
        };

        let err = service
            .execute(UpdatePropertyStatus {
                property: locator,
                status: Status::Sold,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotExists(l) if *l == locator,
        ));
    }
}
