//! In-memory [`Database`] implementation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::{
    domain::{property, Property, Rating},
    infra::{database, Database},
    read::property::list::Selector,
};

/// In-memory [`Database`] client.
///
/// Writes are applied immediately, even inside a transaction: [`Commit`] only
/// releases the [`Lock`]s taken by it, as does dropping the transaction.
#[derive(Clone, Debug)]
pub struct Memory<T = NonTx> {
    /// Shared [`Storage`].
    storage: Arc<Storage>,

    /// Transaction state of this client.
    conn: T,
}

/// Non-transactional [`Memory`] client state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonTx;

/// Transactional [`Memory`] client state.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`Property`] locks held until this [`Tx`] is committed or its last
    /// clone is dropped.
    held: Arc<Held>,
}

/// [`Property`] locks held by a [`Tx`].
#[derive(Debug)]
struct Held {
    /// [`Storage`] the locks are taken from.
    storage: Arc<Storage>,

    /// Guards of the taken locks.
    guards: Mutex<HashMap<property::Locator, OwnedMutexGuard<()>>>,
}

impl Held {
    /// Releases all the held locks and forgets the ones nobody else waits
    /// for.
    fn release(&self) {
        let guards = std::mem::take(
            &mut *self.guards.lock().unwrap_or_else(PoisonError::into_inner),
        );
        drop(guards);
        self.storage
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        self.release();
    }
}

/// Data kept by [`Memory`].
#[derive(Debug, Default)]
struct Storage {
    /// [`Property`]s of all kinds.
    properties: RwLock<HashMap<property::Locator, Property>>,

    /// [`Rating`]s in insertion order.
    ratings: RwLock<Vec<Rating>>,

    /// Per-[`Property`] locks, present only while taken or awaited.
    locks: Mutex<HashMap<property::Locator, Arc<AsyncMutex<()>>>>,
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Storage was left inconsistent by a panicked writer.
    #[display("`Memory` storage is poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            storage: Arc::default(),
            conn: NonTx,
        }
    }
}

impl Memory {
    /// Stores the provided [`Property`], replacing the existing one at the
    /// same [`property::Locator`].
    pub fn put(&self, property: Property) {
        let mut properties = self
            .storage
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        drop(properties.insert(property.locator(), property));
    }

    /// Returns the stored [`Property`] at the provided [`property::Locator`].
    #[must_use]
    pub fn get(&self, locator: property::Locator) -> Option<Property> {
        self.storage
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&locator)
            .cloned()
    }

    /// Appends the provided [`Rating`] as is.
    pub fn push(&self, rating: Rating) {
        self.storage
            .ratings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rating);
    }

    /// Returns all the stored [`Rating`]s in insertion order.
    #[must_use]
    pub fn ratings(&self) -> Vec<Rating> {
        self.storage
            .ratings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> Memory<T> {
    /// Selects [`Rating`]s passing the provided predicate, ordered by rater,
    /// then newest first. Among equal instants, the latest inserted goes
    /// first.
    fn ratings_where(
        &self,
        pred: impl Fn(&Rating) -> bool,
    ) -> Result<Vec<Rating>, Traced<database::Error>> {
        let mut ratings = self
            .storage
            .ratings
            .read()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .iter()
            .rev()
            .filter(|r| pred(r))
            .cloned()
            .collect::<Vec<_>>();
        ratings.sort_by(|a, b| {
            a.rater_id
                .cmp(&b.rater_id)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(ratings)
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory {
            storage: Arc::clone(&self.storage),
            conn: Tx {
                held: Arc::new(Held {
                    storage: Arc::clone(&self.storage),
                    guards: Mutex::default(),
                }),
            },
        })
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.conn.held.release();
        Ok(())
    }
}

impl Database<Lock<By<Property, property::Locator>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let locator = by.into_inner();

        let already_held = self
            .conn
            .held
            .guards
            .lock()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .contains_key(&locator);
        if already_held {
            return Ok(());
        }

        let lock = Arc::clone(
            self.storage
                .locks
                .lock()
                .map_err(Error::from)
                .map_err(tracerr::from_and_wrap!(=> database::Error))?
                .entry(locator)
                .or_default(),
        );
        let guard = lock.lock_owned().await;

        drop(
            self.conn
                .held
                .guards
                .lock()
                .map_err(Error::from)
                .map_err(tracerr::from_and_wrap!(=> database::Error))?
                .insert(locator, guard),
        );
        Ok(())
    }
}

impl<T> Database<Select<By<Vec<Property>, Selector>>> for Memory<T> {
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Selector { kind, owner_id } = by.into_inner();

        Ok(self
            .storage
            .properties
            .read()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .values()
            .filter(|p| p.kind() == kind)
            .filter(|p| owner_id.map_or(true, |o| p.owner_id == o))
            .cloned()
            .collect())
    }
}

impl<T> Database<Select<By<Option<Property>, property::Locator>>>
    for Memory<T>
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let locator = by.into_inner();

        Ok(self
            .storage
            .properties
            .read()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .get(&locator)
            .cloned())
    }
}

impl<T> Database<Update<Property>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut properties = self
            .storage
            .properties
            .write()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        drop(properties.insert(property.locator(), property));
        Ok(())
    }
}

impl<T> Database<Insert<Rating>> for Memory<T> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rating): Insert<Rating>,
    ) -> Result<Self::Ok, Self::Err> {
        self.storage
            .ratings
            .write()
            .map_err(Error::from)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?
            .push(rating);
        Ok(())
    }
}

impl<T> Database<Select<By<Vec<Rating>, property::Locator>>> for Memory<T> {
    type Ok = Vec<Rating>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rating>, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let locator = by.into_inner();
        self.ratings_where(|r| r.property == locator)
            .map_err(tracerr::wrap!())
    }
}
