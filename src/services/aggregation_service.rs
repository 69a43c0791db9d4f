// src/services/aggregation_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::StoreCollection,
    models::{
        review::Review,
        store::{Store, TagCount, TopStore},
    },
};

// Tamanho máximo do ranking
pub const TOP_STORES_LIMIT: usize = 10;

// Mínimo de avaliações para entrar no ranking (estritamente mais de uma)
const MIN_REVIEWS: usize = 2;

/// Frequência de tags em todas as lojas, da mais usada para a menos usada.
/// Empates saem em ordem alfabética.
pub fn tally_tags<'a, I>(tag_lists: I) -> Vec<TagCount>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for tags in tag_lists {
        for tag in tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut table: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag: tag.to_string(), count })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    table
}

/// Junta lojas e avaliações, descarta lojas com menos de duas avaliações,
/// ordena pela média (maior primeiro) e corta em `limit`.
pub fn rank_top_stores(stores: &[Store], reviews: &[Review], limit: usize) -> Vec<TopStore> {
    let mut by_store: HashMap<Uuid, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut ranking: Vec<TopStore> = stores
        .iter()
        .filter_map(|store| {
            let reviews = by_store.remove(&store.id)?;
            if reviews.len() < MIN_REVIEWS {
                return None;
            }
            let total: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
            let average_rating = total / reviews.len() as f64;

            Some(TopStore {
                photo: store.photo.clone(),
                name: store.name.clone(),
                slug: store.slug.clone(),
                reviews,
                average_rating,
            })
        })
        .collect();

    // sort_by é estável: empates mantêm a ordem da coleção
    ranking.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
    ranking.truncate(limit);
    ranking
}

#[derive(Clone)]
pub struct AggregationService {
    stores: Arc<dyn StoreCollection>,
}

impl AggregationService {
    pub fn new(stores: Arc<dyn StoreCollection>) -> Self {
        Self { stores }
    }

    /// Tabela `{tag, count}` de todas as lojas, sem paginação.
    pub async fn get_tags_list(&self) -> Result<Vec<TagCount>, AppError> {
        let tags = self.stores.tag_counts().await?;
        tracing::debug!(distinct = tags.len(), "frequência de tags calculada");
        Ok(tags)
    }

    /// Até 10 lojas com mais de uma avaliação, pela média decrescente.
    pub async fn get_top_stores(&self) -> Result<Vec<TopStore>, AppError> {
        let top = self.stores.top_stores(TOP_STORES_LIMIT).await?;
        tracing::debug!(entries = top.len(), "ranking de lojas calculado");
        Ok(top)
    }
}
