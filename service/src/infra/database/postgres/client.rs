//! Postgres database clients.

use std::{mem, sync::Arc};

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::{Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, connection::Params, Connection},
};

/// Non-transactional Postgres database client.
///
/// Every statement runs on a connection taken from the [`connection::Pool`]
/// just for it.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to take connections from.
    pub(crate) pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) const fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Takes a connection from the [`connection::Pool`].
    pub(crate) async fn pooled(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::query(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.pooled().await.map_err(tracerr::wrap!())?;
        Connection::exec(&conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Transactional Postgres database client.
///
/// The transaction begins lazily on the first statement and is rolled back
/// if the last clone of this client is dropped without [`Tx::commit()`].
/// Statements after [`Tx::commit()`] fail with [`postgres::Error::Finished`].
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to take a connection from.
    pool: connection::Pool,

    /// Transaction state.
    conn: Arc<Mutex<TxState>>,
}

/// State of a [`Tx`] client's transaction.
#[derive(Debug, Default)]
enum TxState {
    /// No statement has been run yet.
    #[default]
    Pending,

    /// Transaction has begun.
    Open(connection::Tx),

    /// Transaction has been committed.
    Finished,
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool,
            conn: Arc::default(),
        }
    }

    /// Returns the transaction of this [`Tx`] client, beginning it if
    /// required.
    async fn connection(
        &self,
    ) -> Result<MappedMutexGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let mut conn = self.conn.lock().await;
        match &*conn {
            TxState::Pending => {
                let pooled = self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?;
                *conn = TxState::Open(
                    connection::Tx::begin(pooled)
                        .await
                        .map_err(tracerr::wrap!())?,
                );
            }
            TxState::Open(_) | TxState::Finished => {}
        }
        MutexGuard::try_map(conn, |state| match state {
            TxState::Open(tx) => Some(tx),
            TxState::Pending | TxState::Finished => None,
        })
        .map_err(|_| postgres::Error::Finished)
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }

    /// Commits this [`Tx`] client.
    ///
    /// Commits nothing if no statement has been run, but finishes this
    /// [`Tx`] client anyway.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let mut state = self.conn.lock().await;
        match mem::replace(&mut *state, TxState::Finished) {
            TxState::Open(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            TxState::Pending | TxState::Finished => Ok(()),
        }
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query(&*conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::query_opt(&*conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: Params<'_>,
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let conn = self.connection().await.map_err(tracerr::wrap!())?;
        Connection::exec(&*conn, stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
