use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, products::repo::Product, reviews::repo::Review};

/// Arithmetic mean of the given ratings; (0, 0) when there are none.
pub fn average_rating(ratings: &[i16]) -> (f64, i64) {
    if ratings.is_empty() {
        return (0.0, 0);
    }
    let total: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    (total as f64 / ratings.len() as f64, ratings.len() as i64)
}

/// Read-all-then-average recompute, run after every review mutation. No
/// incremental maintenance.
pub async fn recompute_product_rating(db: &PgPool, product_id: Uuid) -> Result<(), ApiError> {
    let ratings = Review::ratings_for_product(db, product_id).await?;
    let (rating, count) = average_rating(&ratings);
    Product::set_rating(db, product_id, rating, count).await?;
    debug!(%product_id, rating, count, "product rating recomputed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_four_and_five_is_four_point_five() {
        let (rating, count) = average_rating(&[4, 5]);
        assert_eq!(rating, 4.5);
        assert_eq!(count, 2);
    }

    #[test]
    fn no_reviews_resets_to_zero() {
        let (rating, count) = average_rating(&[]);
        assert_eq!(rating, 0.0);
        assert_eq!(count, 0);
    }

    #[test]
    fn single_review_is_its_own_mean() {
        let (rating, count) = average_rating(&[3]);
        assert_eq!(rating, 3.0);
        assert_eq!(count, 1);
    }
}
