// src/db/review_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::review::{NewReview, Review},
};

/// A coleção irmã de avaliações, consultada pela referência `store`.
#[async_trait]
pub trait ReviewCollection: Send + Sync {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError>;

    /// Todas as avaliações cujas lojas estão em `store_ids`, mais antigas primeiro.
    async fn find_by_stores(&self, store_ids: &[Uuid]) -> Result<Vec<Review>, AppError>;
}

const REVIEW_COLUMNS: &str = "id, store_id, author_id, text, rating, created";

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewCollection for ReviewRepository {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError> {
        let review = review.into_review();
        let sql = format!(
            r#"
            INSERT INTO reviews (id, store_id, author_id, text, rating, created)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        );

        // FK de store_id: loja inexistente volta como DatabaseError
        let saved = sqlx::query_as::<_, Review>(&sql)
            .bind(review.id)
            .bind(review.store)
            .bind(review.author)
            .bind(&review.text)
            .bind(review.rating)
            .bind(review.created)
            .fetch_one(&self.pool)
            .await?;

        Ok(saved)
    }

    async fn find_by_stores(&self, store_ids: &[Uuid]) -> Result<Vec<Review>, AppError> {
        if store_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM reviews WHERE store_id = ANY($1) ORDER BY created ASC",
            REVIEW_COLUMNS
        );

        let reviews = sqlx::query_as::<_, Review>(&sql)
            .bind(store_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }
}
