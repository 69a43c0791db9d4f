// src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---
// Review (A "Avaliação")
// ---
// O núcleo só lê `store` (dono) e `rating`; o resto acompanha o registro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,

    // Referência à loja avaliada
    #[sqlx(rename = "store_id")]
    pub store: Uuid,

    #[sqlx(rename = "author_id")]
    pub author: Option<Uuid>,

    pub text: Option<String>,
    pub rating: i32,
    pub created: DateTime<Utc>,
}

// Dados para gravar uma avaliação nova
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub store: Uuid,
    pub author: Option<Uuid>,
    pub text: Option<String>,
    pub rating: i32,
}

impl NewReview {
    pub fn new(store: Uuid, rating: i32) -> Self {
        Self { store, author: None, text: None, rating }
    }

    pub(crate) fn into_review(self) -> Review {
        Review {
            id: Uuid::new_v4(),
            store: self.store,
            author: self.author,
            text: self.text,
            rating: self.rating,
            created: Utc::now(),
        }
    }
}
