// src/common/error.rs

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Loja não encontrada: {0}")]
    StoreNotFound(Uuid),

    // Corrida de unicidade: o banco recusou o slug na escrita.
    #[error("O slug '{0}' já está em uso")]
    SlugConflict(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` captura o contexto de qualquer outro erro inesperado.
    #[error("Erro interno: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Achata os erros de validação em `campo -> mensagens`.
    /// Campos aninhados usam ponto: `location.address`.
    /// Para qualquer outra variante o mapa vem vazio.
    pub fn field_messages(&self) -> BTreeMap<String, Vec<String>> {
        let mut details = BTreeMap::new();
        if let AppError::ValidationError(errors) = self {
            collect_messages(errors, None, &mut details);
        }
        details
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::ValidationError(_))
    }
}

fn collect_messages(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(p) => format!("{}.{}", p, field),
            None => field.to_string(),
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.entry(path).or_default().extend(messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_path = format!("{}[{}]", path, index);
                    collect_messages(inner, Some(&item_path), out);
                }
            }
        }
    }
}

// Nome gerado pelo Postgres para `slug TEXT UNIQUE` (ver migrations/)
const SLUG_CONSTRAINT: &str = "stores_slug_key";

// Converte violação de chave única do slug em SlugConflict; o resto segue
// como DatabaseError.
pub(crate) fn map_slug_violation(e: sqlx::Error, slug: &str) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some(SLUG_CONSTRAINT) {
            tracing::warn!("Slug duplicado rejeitado pelo banco: {}", slug);
            return AppError::SlugConflict(slug.to_string());
        }
    }
    e.into()
}
