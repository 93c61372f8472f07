//! [`Query`] computing the star distribution of a [`Property`]'s ratings.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{property, rating, Rating},
    infra::{database, Database},
    Query, Service,
};
#[cfg(doc)]
use crate::domain::Property;

/// [`Query`] computing the [`rating::Distribution`] of the latest [`Rating`]s
/// per rater of a [`Property`], including zero-star ones.
///
/// [`None`] is returned if the [`Property`] has no [`Rating`]s at all.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RatingDistribution {
    /// [`property::Locator`] of the rated [`Property`].
    pub property: property::Locator,
}

impl<Db> Query<RatingDistribution> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Rating>, property::Locator>>,
        Ok = Vec<Rating>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<rating::Distribution>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        RatingDistribution { property }: RatingDistribution,
    ) -> Result<Self::Ok, Self::Err> {
        let ratings = self
            .database()
            .execute(Select(By::new(property)))
            .await
            .map_err(tracerr::wrap!())?;

        let latest = rating::latest_per_rater(ratings);
        Ok((!latest.is_empty())
            .then(|| rating::Distribution::of_latest(&latest)))
    }
}
