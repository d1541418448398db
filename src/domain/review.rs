use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A customer review as stored on the product record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

pub fn validate_rating(rating: i32) -> Result<(), DomainError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::InvalidInput(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

/// Append a review, enforcing at most one review per user per product.
pub fn add_review(reviews: &mut Vec<Review>, review: Review) -> Result<(), DomainError> {
    if reviews.iter().any(|r| r.user == review.user) {
        return Err(DomainError::InvalidState(
            "Product already reviewed".to_string(),
        ));
    }
    reviews.push(review);
    Ok(())
}

/// Arithmetic mean of the review ratings; 0 for an unreviewed product.
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: i32 = reviews.iter().map(|r| r.rating).sum();
    f64::from(sum) / reviews.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(user: Uuid, rating: i32) -> Review {
        Review {
            user,
            name: "Reviewer".to_string(),
            rating,
            comment: "fine work".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ratings_outside_one_to_five_are_rejected() {
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
        for r in MIN_RATING..=MAX_RATING {
            assert!(validate_rating(r).is_ok());
        }
    }

    #[test]
    fn second_review_by_same_user_is_rejected() {
        let user = Uuid::new_v4();
        let mut reviews = Vec::new();
        add_review(&mut reviews, review(user, 4)).expect("first review");

        let err = add_review(&mut reviews, review(user, 5)).expect_err("duplicate must fail");
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(reviews.len(), 1);
    }

    #[test]
    fn different_users_can_review_the_same_product() {
        let mut reviews = Vec::new();
        add_review(&mut reviews, review(Uuid::new_v4(), 4)).expect("review one");
        add_review(&mut reviews, review(Uuid::new_v4(), 2)).expect("review two");
        assert_eq!(reviews.len(), 2);
    }

    #[test]
    fn mean_rating_is_the_arithmetic_mean() {
        let mut reviews = Vec::new();
        add_review(&mut reviews, review(Uuid::new_v4(), 5)).expect("review");
        add_review(&mut reviews, review(Uuid::new_v4(), 2)).expect("review");
        add_review(&mut reviews, review(Uuid::new_v4(), 2)).expect("review");
        assert!((mean_rating(&reviews) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mean_rating_of_no_reviews_is_zero() {
        assert_eq!(mean_rating(&[]), 0.0);
    }
}
