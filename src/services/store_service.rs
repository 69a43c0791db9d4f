// src/services/store_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{ReviewCollection, StoreCollection},
    models::{
        review::Review,
        store::{Store, StoreDraft, StoreInput, StoreQuery},
    },
    services::slug::assign_slug,
};

/// Liga a cada loja as avaliações cujo `store` é o id dela.
/// Lojas sem avaliação recebem lista vazia.
pub fn attach_reviews(stores: Vec<Store>, reviews: Vec<Review>) -> Vec<Store> {
    let mut by_store: HashMap<Uuid, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review);
    }

    stores
        .into_iter()
        .map(|mut store| {
            store.reviews = by_store.remove(&store.id).unwrap_or_default();
            store
        })
        .collect()
}

#[derive(Clone)]
pub struct StoreService {
    stores: Arc<dyn StoreCollection>,
    reviews: Arc<dyn ReviewCollection>,
}

impl StoreService {
    pub fn new(stores: Arc<dyn StoreCollection>, reviews: Arc<dyn ReviewCollection>) -> Self {
        Self { stores, reviews }
    }

    /// Cria (`id = None`) ou atualiza uma loja.
    ///
    /// Ordem: merge da entrada -> validação -> slug (só se o nome mudou)
    /// -> escrita -> join das avaliações. Se a validação falhar nada é lido
    /// nem gravado.
    pub async fn create_or_update(
        &self,
        id: Option<Uuid>,
        input: StoreInput,
    ) -> Result<Store, AppError> {
        // 1. Registro atual (só na atualização)
        let existing = match id {
            Some(id) => Some(self.load(id).await?),
            None => None,
        };

        // 2. Merge + aparar strings
        let draft = match &existing {
            Some(store) => StoreDraft::from_store(store),
            None => StoreDraft::default(),
        }
        .apply(input);

        // 3. Validação (erros por campo)
        draft.validate()?;

        // 4. Slug: o nome mudou?
        let name = draft.name.as_deref().unwrap_or_default();
        let slug = match &existing {
            Some(store) if store.name == name => store.slug.clone(),
            _ => assign_slug(self.stores.as_ref(), name).await?,
        };

        let store_id = existing.as_ref().map_or_else(Uuid::new_v4, |s| s.id);
        let candidate = draft
            .into_store(store_id, slug, Utc::now())
            .ok_or_else(|| anyhow::anyhow!("rascunho validado sem campo obrigatório"))?;

        // 5. Escrita
        let saved = match existing {
            Some(_) => {
                let saved = self.stores.update(&candidate).await?;
                tracing::info!(id = %saved.id, slug = %saved.slug, "loja atualizada");
                saved
            }
            None => {
                let saved = self.stores.insert(&candidate).await?;
                tracing::info!(id = %saved.id, slug = %saved.slug, "loja criada");
                saved
            }
        };

        // 6. Campo virtual
        let mut populated = self.populate_reviews(vec![saved]).await?;
        populated
            .pop()
            .ok_or_else(|| anyhow::anyhow!("loja gravada sumiu no join").into())
    }

    pub async fn create(&self, input: StoreInput) -> Result<Store, AppError> {
        self.create_or_update(None, input).await
    }

    pub async fn update(&self, id: Uuid, input: StoreInput) -> Result<Store, AppError> {
        self.create_or_update(Some(id), input).await
    }

    /// Busca lojas e sempre preenche `reviews`.
    pub async fn fetch(&self, query: &StoreQuery) -> Result<Vec<Store>, AppError> {
        let stores = self.stores.find(query).await?;
        self.populate_reviews(stores).await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Store>, AppError> {
        Ok(self.fetch(&StoreQuery::by_id(id)).await?.into_iter().next())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Store>, AppError> {
        Ok(self.fetch(&StoreQuery::by_slug(slug)).await?.into_iter().next())
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Store>, AppError> {
        self.fetch(&StoreQuery::by_tag(tag)).await
    }

    /// O join explícito do campo virtual: uma consulta para todas as lojas.
    pub async fn populate_reviews(&self, stores: Vec<Store>) -> Result<Vec<Store>, AppError> {
        if stores.is_empty() {
            return Ok(stores);
        }

        let ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();
        let reviews = self.reviews.find_by_stores(&ids).await?;
        Ok(attach_reviews(stores, reviews))
    }

    // Registro cru, sem join (base do merge na atualização)
    async fn load(&self, id: Uuid) -> Result<Store, AppError> {
        self.stores
            .find(&StoreQuery::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::StoreNotFound(id))
    }
}
