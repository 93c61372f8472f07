//! [`Property`]-related [`Database`] implementations.

use common::{
    operations::{By, Lock, Select, Update},
    Amount,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        property::{
            self,
            commercial::{Deal, LandUsage},
            Agricultural, Commercial, Details, Kind, Layout, Residential,
        },
        rating, Property,
    },
    infra::{
        database::{
            self,
            postgres::{self, Connection},
            Postgres,
        },
        Database,
    },
    read::property::list::Selector,
};

/// Columns shared by the tables of all the [`Kind`]s.
const COMMON_COLUMNS: [&str; 12] = [
    "id",
    "owner_id",
    "status",
    "rating_average",
    "rating_count",
    "rating_one",
    "rating_two",
    "rating_three",
    "rating_four",
    "rating_five",
    "created_at",
    "updated_at",
];

/// Returns the table storing [`Property`]s of the provided [`Kind`].
fn table(kind: Kind) -> &'static str {
    match kind {
        Kind::Agricultural => "agricultural_lands",
        Kind::Residential => "residential_units",
        Kind::Commercial => "commercial_lands",
        Kind::Layout => "layouts",
    }
}

/// Returns the [`Kind`]-specific columns of its table.
fn kind_columns(kind: Kind) -> &'static [&'static str] {
    match kind {
        Kind::Agricultural => &["size", "total_price"],
        Kind::Residential => &["unit_type", "flat_size", "total_cost"],
        Kind::Commercial => &[
            "sell_land_usage",
            "sell_plot_size",
            "sell_total_amount",
            "rent_land_usage",
            "rent_plot_size",
            "rent_total_amount",
            "lease_land_usage",
            "lease_plot_size",
            "lease_total_amount",
        ],
        Kind::Layout => &["plot_size", "total_amount", "available_plots"],
    }
}

/// Builds a `SELECT` of [`Property`]s of the provided [`Kind`] with the
/// provided `WHERE` clause.
fn select_sql(kind: Kind, filter: &str) -> String {
    format!(
        "SELECT {columns} \
         FROM {table} \
         WHERE {filter}",
        columns = COMMON_COLUMNS
            .iter()
            .chain(kind_columns(kind))
            .join(", "),
        table = table(kind),
    )
}

/// Converts a stored `INT4` counter into its domain representation.
fn counter(
    row: &Row,
    column: &str,
) -> Result<u32, Traced<database::Error>> {
    u32::try_from(row.get::<_, i32>(column))
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Converts a domain counter into its stored `INT4` representation.
fn to_int4(count: u32) -> Result<i32, Traced<database::Error>> {
    i32::try_from(count)
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Reads a [`Deal`] stored in the columns with the provided `prefix`.
///
/// [`None`] is returned if all of them are `NULL`.
fn deal(row: &Row, prefix: &str) -> Option<Deal> {
    let land_usage =
        row.get::<_, Option<Vec<LandUsage>>>(&*format!("{prefix}_land_usage"));
    let plot_size: Option<Amount> = row.get(&*format!("{prefix}_plot_size"));
    let total_amount: Option<Amount> =
        row.get(&*format!("{prefix}_total_amount"));

    (land_usage.is_some() || plot_size.is_some() || total_amount.is_some())
        .then(|| Deal {
            land_usage: land_usage.unwrap_or_default(),
            plot_size,
            total_amount,
        })
}

/// Nullable columns of a single [`Deal`].
type DealColumns<'a> =
    (Option<&'a [LandUsage]>, Option<Amount>, Option<Amount>);

/// Splits the provided [`Deal`] into its [`DealColumns`].
fn deal_columns(deal: Option<&Deal>) -> DealColumns<'_> {
    deal.map_or((None, None, None), |d| {
        (Some(d.land_usage.as_slice()), d.plot_size, d.total_amount)
    })
}

/// Reads a [`Property`] of the provided [`Kind`] from the provided [`Row`].
fn property_from_row(
    kind: Kind,
    row: &Row,
) -> Result<Property, Traced<database::Error>> {
    let details: Details = match kind {
        Kind::Agricultural => Agricultural {
            size: row.get("size"),
            total_price: row.get("total_price"),
        }
        .into(),
        Kind::Residential => Residential {
            r#type: row.get("unit_type"),
            flat_size: row.get("flat_size"),
            total_cost: row.get("total_cost"),
        }
        .into(),
        Kind::Commercial => Commercial {
            sell: deal(row, "sell"),
            rent: deal(row, "rent"),
            lease: deal(row, "lease"),
        }
        .into(),
        Kind::Layout => Layout {
            plot_size: row.get("plot_size"),
            total_amount: row.get("total_amount"),
            available_plots: row
                .get::<_, Option<i32>>("available_plots")
                .map(u32::try_from)
                .transpose()
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)?,
        }
        .into(),
    };

    Ok(Property {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        status: row.get("status"),
        details,
        rating: rating::Summary {
            average: row.get("rating_average"),
            count: counter(row, "rating_count")?,
            histogram: rating::Histogram {
                one: counter(row, "rating_one")?,
                two: counter(row, "rating_two")?,
                three: counter(row, "rating_three")?,
                four: counter(row, "rating_four")?,
                five: counter(row, "rating_five")?,
            },
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl<C> Database<Select<By<Vec<Property>, Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Selector { kind, owner_id } = by.into_inner();

        let sql = select_sql(kind, "$1::UUID IS NULL OR owner_id = $1::UUID");
        self.query(&sql, &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| property_from_row(kind, row))
            .collect()
    }
}

impl<C> Database<Select<By<Option<Property>, property::Locator>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property::Locator { kind, id } = by.into_inner();

        let sql = select_sql(kind, "id = $1::UUID LIMIT 1");
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| property_from_row(kind, &row))
            .transpose()
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let kind = property.kind();
        let Property {
            id,
            owner_id,
            status,
            details,
            rating: rating::Summary {
                average,
                count,
                histogram,
            },
            created_at,
            updated_at,
        } = property;

        let count = to_int4(count)?;
        let one = to_int4(histogram.one)?;
        let two = to_int4(histogram.two)?;
        let three = to_int4(histogram.three)?;
        let four = to_int4(histogram.four)?;
        let five = to_int4(histogram.five)?;

        let mut params: Vec<&(dyn ToSql + Sync)> = vec![
            &id,
            &owner_id,
            &status,
            &average,
            &count,
            &one,
            &two,
            &three,
            &four,
            &five,
            &created_at,
            &updated_at,
        ];

        let available_plots = match &details {
            Details::Layout(l) => l.available_plots.map(to_int4).transpose()?,
            Details::Agricultural(_)
            | Details::Residential(_)
            | Details::Commercial(_) => None,
        };
        let deals = match &details {
            Details::Commercial(c) => {
                [&c.sell, &c.rent, &c.lease].map(|d| deal_columns(d.as_ref()))
            }
            Details::Agricultural(_)
            | Details::Residential(_)
            | Details::Layout(_) => [(None, None, None); 3],
        };
        match &details {
            Details::Agricultural(a) => {
                params.push(&a.size);
                params.push(&a.total_price);
            }
            Details::Residential(r) => {
                params.push(&r.r#type);
                params.push(&r.flat_size);
                params.push(&r.total_cost);
            }
            Details::Commercial(_) => {
                for (land_usage, plot_size, total_amount) in &deals {
                    params.push(land_usage);
                    params.push(plot_size);
                    params.push(total_amount);
                }
            }
            Details::Layout(l) => {
                params.push(&l.plot_size);
                params.push(&l.total_amount);
                params.push(&available_plots);
            }
        }

        let columns = COMMON_COLUMNS.iter().chain(kind_columns(kind));
        let sql = format!(
            "INSERT INTO {table} ({names}) \
             VALUES ({values}) \
             ON CONFLICT (id) DO UPDATE \
             SET {updates}",
            table = table(kind),
            names = columns.clone().join(", "),
            values = (1..=params.len()).format_with(", ", |i, f| {
                f(&format_args!("${i}"))
            }),
            updates = columns.skip(1).format_with(", ", |c, f| {
                f(&format_args!("{c} = EXCLUDED.{c}"))
            }),
        );
        self.exec(&sql, params.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Locator>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Locator>>,
    ) -> Result<Self::Ok, Self::Err> {
        let property::Locator { kind, id } = by.into_inner();

        // `DO UPDATE` row-locks an already existing entry until the
        // transaction ends, while `DO NOTHING` would not.
        const SQL: &str = "\
            INSERT INTO properties_lock (kind, id) \
            VALUES ($1::INT2, $2::UUID) \
            ON CONFLICT (kind, id) DO UPDATE \
            SET id = EXCLUDED.id";
        self.exec(SQL, &[&kind, &id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
