// src/models/store.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::review::Review;

pub const POINT: &str = "Point";

// ---
// 1. Store (A "Loja" persistida)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    // Derivado do nome, único na coleção
    pub slug: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: Uuid,

    // Campo virtual: nunca gravado, sempre recalculado na leitura.
    #[serde(default)]
    pub reviews: Vec<Review>,
}

// Ponto geográfico + endereço. `kind` é sempre "Point".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
    pub address: String,
}

// ---
// 2. StoreInput (O que o chamador manda)
// ---
// Tudo opcional: na criação os campos ausentes falham na validação; na
// atualização os ausentes mantêm o valor gravado.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created: Option<DateTime<Utc>>,
    pub location: Option<LocationInput>,
    pub photo: Option<String>,
    pub author: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub coordinates: Option<Vec<f64>>,
    pub address: Option<String>,
}

// ---
// 3. StoreDraft (O candidato antes de persistir)
// ---
// Resultado do merge entrada + registro existente, já com strings aparadas.
#[derive(Debug, Clone, Default, Validate)]
pub struct StoreDraft {
    #[validate(
        required(message = "missing store name"),
        length(min = 1, message = "missing store name")
    )]
    pub name: Option<String>,

    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,

    #[validate(nested)]
    pub location: LocationDraft,

    pub photo: Option<String>,

    #[validate(required(message = "missing author"))]
    pub author: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct LocationDraft {
    #[validate(
        required(message = "missing coordinates"),
        length(min = 1, message = "missing coordinates")
    )]
    pub coordinates: Option<Vec<f64>>,

    #[validate(
        required(message = "missing address"),
        length(min = 1, message = "missing address")
    )]
    pub address: Option<String>,
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

// Descrição em branco vira ausente
fn trimmed_optional(value: String) -> Option<String> {
    let value = trimmed(value);
    if value.is_empty() { None } else { Some(value) }
}

impl StoreDraft {
    /// Parte de um registro já gravado (atualização).
    pub fn from_store(store: &Store) -> Self {
        Self {
            name: Some(store.name.clone()),
            description: store.description.clone(),
            tags: store.tags.clone(),
            created: Some(store.created),
            location: LocationDraft {
                coordinates: Some(store.location.coordinates.clone()),
                address: Some(store.location.address.clone()),
            },
            photo: store.photo.clone(),
            author: Some(store.author),
        }
    }

    /// Aplica a entrada do chamador por cima do rascunho, aparando strings.
    pub fn apply(mut self, input: StoreInput) -> Self {
        if let Some(name) = input.name {
            self.name = Some(trimmed(name));
        }
        if let Some(description) = input.description {
            self.description = trimmed_optional(description);
        }
        if let Some(tags) = input.tags {
            self.tags = tags;
        }
        if let Some(created) = input.created {
            self.created = Some(created);
        }
        if let Some(location) = input.location {
            if let Some(coordinates) = location.coordinates {
                self.location.coordinates = Some(coordinates);
            }
            if let Some(address) = location.address {
                self.location.address = Some(trimmed(address));
            }
        }
        if let Some(photo) = input.photo {
            self.photo = Some(photo);
        }
        if let Some(author) = input.author {
            self.author = Some(author);
        }
        self
    }

    /// Monta o registro final. Só chamar depois de `validate()`;
    /// campos obrigatórios ausentes aqui voltam como `None`.
    pub fn into_store(self, id: Uuid, slug: String, now: DateTime<Utc>) -> Option<Store> {
        Some(Store {
            id,
            name: self.name?,
            slug,
            description: self.description,
            tags: self.tags,
            created: self.created.unwrap_or(now),
            location: Location {
                kind: POINT.to_string(),
                coordinates: self.location.coordinates?,
                address: self.location.address?,
            },
            photo: self.photo,
            author: self.author?,
            reviews: Vec::new(),
        })
    }
}

// ---
// 4. StoreQuery (Filtros de busca)
// ---
// Resultados sempre do mais novo para o mais antigo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuery {
    pub id: Option<Uuid>,
    pub slug: Option<String>,
    pub tag: Option<String>,
    pub author: Option<Uuid>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl StoreQuery {
    pub fn by_id(id: Uuid) -> Self {
        Self { id: Some(id), ..Default::default() }
    }

    pub fn by_slug(slug: impl Into<String>) -> Self {
        Self { slug: Some(slug.into()), ..Default::default() }
    }

    pub fn by_tag(tag: impl Into<String>) -> Self {
        Self { tag: Some(tag.into()), ..Default::default() }
    }

    pub fn matches(&self, store: &Store) -> bool {
        self.id.is_none_or(|id| store.id == id)
            && self.slug.as_deref().is_none_or(|slug| store.slug == slug)
            && self.tag.as_deref().is_none_or(|tag| store.tags.iter().any(|t| t == tag))
            && self.author.is_none_or(|author| store.author == author)
    }
}

// ---
// 5. Resultados das agregações
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

// Uma linha do ranking "top lojas"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopStore {
    pub photo: Option<String>,
    pub name: String,
    pub slug: String,
    pub reviews: Vec<Review>,
    pub average_rating: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::AppError;

    fn complete_input() -> StoreInput {
        StoreInput {
            name: Some("  Cafe Delight  ".into()),
            description: Some("  great coffee ".into()),
            tags: Some(vec!["Wifi".into(), "Open Late".into()]),
            location: Some(LocationInput {
                coordinates: Some(vec![-79.38, 43.64]),
                address: Some(" 1 Front St ".into()),
            }),
            author: Some(Uuid::new_v4()),
            ..Default::default()
        }
    }

    #[test]
    fn apply_trims_string_fields() {
        let draft = StoreDraft::default().apply(complete_input());
        assert_eq!(draft.name.as_deref(), Some("Cafe Delight"));
        assert_eq!(draft.description.as_deref(), Some("great coffee"));
        assert_eq!(draft.location.address.as_deref(), Some("1 Front St"));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn empty_draft_reports_every_required_field() {
        let err = AppError::from(StoreDraft::default().validate().unwrap_err());
        let details = err.field_messages();

        assert_eq!(details["name"], vec!["missing store name".to_string()]);
        assert_eq!(details["author"], vec!["missing author".to_string()]);
        assert_eq!(details["location.address"], vec!["missing address".to_string()]);
        assert_eq!(details["location.coordinates"], vec!["missing coordinates".to_string()]);
    }

    #[test]
    fn whitespace_name_counts_as_missing() {
        let mut input = complete_input();
        input.name = Some("   ".into());
        let err = StoreDraft::default().apply(input).validate().unwrap_err();
        let details = AppError::from(err).field_messages();
        assert_eq!(details.keys().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn empty_coordinates_are_rejected() {
        let mut input = complete_input();
        input.location.as_mut().unwrap().coordinates = Some(vec![]);
        let err = StoreDraft::default().apply(input).validate().unwrap_err();
        let details = AppError::from(err).field_messages();
        assert_eq!(details["location.coordinates"], vec!["missing coordinates".to_string()]);
    }

    #[test]
    fn into_store_defaults_created_and_point_type() {
        let now = Utc::now();
        let store = StoreDraft::default()
            .apply(complete_input())
            .into_store(Uuid::new_v4(), "cafe-delight".into(), now)
            .unwrap();

        assert_eq!(store.created, now);
        assert_eq!(store.location.kind, POINT);
        assert!(store.reviews.is_empty());
    }

    #[test]
    fn update_keeps_fields_not_supplied() {
        let original = StoreDraft::default()
            .apply(complete_input())
            .into_store(Uuid::new_v4(), "cafe-delight".into(), Utc::now())
            .unwrap();

        let patch = StoreInput { photo: Some("cafe.jpg".into()), ..Default::default() };
        let draft = StoreDraft::from_store(&original).apply(patch);

        assert_eq!(draft.name.as_deref(), Some("Cafe Delight"));
        assert_eq!(draft.tags, original.tags);
        assert_eq!(draft.photo.as_deref(), Some("cafe.jpg"));
        assert_eq!(draft.created, Some(original.created));
    }

    #[test]
    fn query_matches_on_every_filter() {
        let store = StoreDraft::default()
            .apply(complete_input())
            .into_store(Uuid::new_v4(), "cafe-delight".into(), Utc::now())
            .unwrap();

        assert!(StoreQuery::default().matches(&store));
        assert!(StoreQuery::by_id(store.id).matches(&store));
        assert!(StoreQuery::by_slug("cafe-delight").matches(&store));
        assert!(StoreQuery::by_tag("Wifi").matches(&store));
        assert!(!StoreQuery::by_tag("wifi").matches(&store));
        assert!(!StoreQuery::by_id(Uuid::new_v4()).matches(&store));
    }
}
