// src/db/memory.rs

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use regex::RegexBuilder;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ReviewCollection, StoreCollection},
    models::{
        review::{NewReview, Review},
        store::{Store, StoreQuery, TagCount, TopStore},
    },
    services::aggregation_service::{rank_top_stores, tally_tags},
};

#[derive(Debug, Default)]
struct Collections {
    // Ordem de inserção
    stores: Vec<Store>,
    reviews: Vec<Review>,
}

/// Coleções de lojas e avaliações em memória.
///
/// Segue o mesmo contrato do Postgres: slug único (violação vira
/// `SlugConflict`), `reviews` nunca gravado na loja, avaliação só para loja
/// existente. As agregações são feitas em memória.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a loja e, em cascata, as suas avaliações.
    /// Retorna `false` se o id não existia.
    pub async fn remove_store(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.stores.len();
        inner.stores.retain(|s| s.id != id);
        inner.reviews.retain(|r| r.store != id);
        inner.stores.len() != before
    }

    pub async fn store_count(&self) -> usize {
        self.inner.read().await.stores.len()
    }
}

// O registro gravado nunca carrega o campo virtual
fn stored_copy(store: &Store) -> Store {
    Store { reviews: Vec::new(), ..store.clone() }
}

#[async_trait]
impl StoreCollection for MemoryDocumentStore {
    async fn find_slugs_matching(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("padrão de slug inválido: {}", pattern))?;

        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .iter()
            .filter(|s| re.is_match(&s.slug))
            .map(|s| s.slug.clone())
            .collect())
    }

    async fn insert(&self, store: &Store) -> Result<Store, AppError> {
        let mut inner = self.inner.write().await;

        if inner.stores.iter().any(|s| s.slug == store.slug) {
            tracing::warn!("Slug duplicado rejeitado: {}", store.slug);
            return Err(AppError::SlugConflict(store.slug.clone()));
        }
        if inner.stores.iter().any(|s| s.id == store.id) {
            return Err(anyhow::anyhow!("id de loja duplicado: {}", store.id).into());
        }

        let saved = stored_copy(store);
        inner.stores.push(saved.clone());
        Ok(saved)
    }

    async fn update(&self, store: &Store) -> Result<Store, AppError> {
        let mut inner = self.inner.write().await;

        if inner.stores.iter().any(|s| s.slug == store.slug && s.id != store.id) {
            tracing::warn!("Slug duplicado rejeitado: {}", store.slug);
            return Err(AppError::SlugConflict(store.slug.clone()));
        }

        let slot = inner
            .stores
            .iter_mut()
            .find(|s| s.id == store.id)
            .ok_or(AppError::StoreNotFound(store.id))?;

        *slot = stored_copy(store);
        Ok(slot.clone())
    }

    async fn find(&self, query: &StoreQuery) -> Result<Vec<Store>, AppError> {
        let inner = self.inner.read().await;

        let mut found: Vec<Store> = inner
            .stores
            .iter()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created.cmp(&a.created));

        let skip = query.skip.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |l| l.max(0) as usize);

        Ok(found.into_iter().skip(skip).take(limit).collect())
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, AppError> {
        let inner = self.inner.read().await;
        Ok(tally_tags(inner.stores.iter().map(|s| s.tags.as_slice())))
    }

    async fn top_stores(&self, limit: usize) -> Result<Vec<TopStore>, AppError> {
        let inner = self.inner.read().await;
        Ok(rank_top_stores(&inner.stores, &inner.reviews, limit))
    }
}

#[async_trait]
impl ReviewCollection for MemoryDocumentStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError> {
        let mut inner = self.inner.write().await;

        if !inner.stores.iter().any(|s| s.id == review.store) {
            return Err(AppError::StoreNotFound(review.store));
        }

        let review = review.into_review();
        inner.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_by_stores(&self, store_ids: &[Uuid]) -> Result<Vec<Review>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .reviews
            .iter()
            .filter(|r| store_ids.contains(&r.store))
            .cloned()
            .collect())
    }
}
