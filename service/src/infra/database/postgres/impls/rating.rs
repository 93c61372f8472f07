//! [`Rating`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{property, Rating},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Reads a [`Rating`] from the provided [`Row`].
fn rating_from_row(row: &Row) -> Rating {
    Rating {
        id: row.get("id"),
        rater_id: row.get("rater_id"),
        property: property::Locator {
            kind: row.get("property_kind"),
            id: row.get("property_id"),
        },
        value: row.get("value"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Insert<Rating>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rating): Insert<Rating>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO ratings (id, rater_id, \
                                 property_kind, property_id, \
                                 value, created_at) \
            VALUES ($1::UUID, $2::UUID, \
                    $3::INT2, $4::UUID, \
                    $5::NUMERIC, $6::TIMESTAMPTZ)";
        self.exec(
            SQL,
            &[
                &rating.id,
                &rating.rater_id,
                &rating.property.kind,
                &rating.property.id,
                &rating.value,
                &rating.created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Select<By<Vec<Rating>, property::Locator>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Rating>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Rating>, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property::Locator { kind, id } = by.into_inner();

        const SQL: &str = "\
            SELECT id, rater_id, property_kind, property_id, \
                   value, created_at \
            FROM ratings \
            WHERE property_kind = $1::INT2 \
              AND property_id = $2::UUID \
            ORDER BY rater_id, created_at DESC, seq DESC";
        Ok(self
            .query(SQL, &[&kind, &id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(rating_from_row)
            .collect())
    }
}
