//! Product reviews.

use common::{ProductId, UserId};
use domain::{NewReview, RatingSummary, Review};
use store::{CatalogStore, CatalogStoreExt};

use crate::error::Result;

/// A stored review with the product's refreshed rating.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub review: Review,
    pub summary: RatingSummary,
}

/// One review per user per product, each refreshing the product's rating.
#[derive(Clone)]
pub struct ReviewService<S> {
    store: S,
}

impl<S: CatalogStore> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates and stores a review. A second review by the same user on
    /// the same product fails with `DuplicateReview`.
    #[tracing::instrument(skip(self, comment))]
    pub async fn add_review(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: u8,
        comment: String,
    ) -> Result<ReviewOutcome> {
        let review = NewReview {
            product_id,
            user_id,
            rating,
            comment,
        }
        .validate()?;

        let product = self.store.add_review(review.clone()).await?;
        metrics::counter!("reviews_added_total").increment(1);

        let summary = RatingSummary {
            rating: product.rating,
            review_count: product.review_count,
        };
        tracing::info!(rating = summary.rating, count = summary.review_count, "review added");
        Ok(ReviewOutcome { review, summary })
    }

    /// Lists a product's reviews, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        self.store.require_product(product_id).await?;
        Ok(self.store.list_reviews(product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, StorefrontError};
    use domain::{Money, Product};
    use store::InMemoryStore;

    async fn setup() -> (ReviewService<InMemoryStore>, Product) {
        let product = Product::new("Smart Watch", "SW-001", Money::from_cents(19999), 30);
        let store = InMemoryStore::with_products([product.clone()]).await;
        (ReviewService::new(store), product)
    }

    #[tokio::test]
    async fn test_ratings_average() {
        let (reviews, product) = setup().await;

        reviews
            .add_review(UserId::new(), product.id, 5, "Love it".to_string())
            .await
            .unwrap();
        let outcome = reviews
            .add_review(UserId::new(), product.id, 3, "Decent".to_string())
            .await
            .unwrap();

        assert_eq!(outcome.summary.rating, 4.0);
        assert_eq!(outcome.summary.review_count, 2);
        assert_eq!(reviews.list_reviews(product.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_review() {
        let (reviews, product) = setup().await;
        let user = UserId::new();

        reviews
            .add_review(user, product.id, 4, "Good".to_string())
            .await
            .unwrap();
        let err = reviews
            .add_review(user, product.id, 2, "Worse now".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, StorefrontError::DuplicateReview { .. }));
        assert_eq!(err.kind(), ErrorKind::BusinessRule);
    }

    #[tokio::test]
    async fn test_invalid_review_input() {
        let (reviews, product) = setup().await;

        let err = reviews
            .add_review(UserId::new(), product.id, 6, "Too good".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = reviews
            .add_review(UserId::new(), product.id, 4, "   ".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_reviews_for_unknown_product() {
        let (reviews, _) = setup().await;

        let err = reviews
            .add_review(UserId::new(), ProductId::new(), 4, "Where is it".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = reviews.list_reviews(ProductId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
