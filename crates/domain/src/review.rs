//! Product reviews and the aggregate rating derived from them.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// A submitted review that has not been validated yet.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    /// Validates rating and comment and stamps the review.
    pub fn validate(self) -> Result<Review, DomainError> {
        if !(1..=5).contains(&self.rating) {
            return Err(DomainError::InvalidRating(self.rating));
        }
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(DomainError::MissingField("comment"));
        }

        Ok(Review {
            id: Uuid::new_v4(),
            product_id: self.product_id,
            user_id: self.user_id,
            rating: self.rating,
            comment: comment.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// A stored review. At most one exists per (user, product).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Mean rating (one decimal place) and review count for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub rating: f64,
    pub review_count: u32,
}

impl RatingSummary {
    /// Summarizes a set of ratings. No ratings yields a zero rating.
    pub fn from_ratings(ratings: impl IntoIterator<Item = u8>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u32), |(sum, count), r| (sum + u64::from(r), count + 1));

        if count == 0 {
            return Self {
                rating: 0.0,
                review_count: 0,
            };
        }

        let mean = sum as f64 / f64::from(count);
        Self {
            rating: (mean * 10.0).round() / 10.0,
            review_count: count,
        }
    }
}
