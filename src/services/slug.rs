// src/services/slug.rs

use crate::{common::error::AppError, db::StoreCollection};

// Base usada quando o nome não tem nenhum caractere alfanumérico
pub const FALLBACK_SLUG: &str = "store";

/// Translitera para ASCII ("Café" -> "Cafe"), passa para minúsculas e troca
/// qualquer sequência não alfanumérica por um único `-`, sem hífen nas pontas.
pub fn slugify(name: &str) -> String {
    let ascii = deunicode::deunicode(name);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_hyphen = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// `^base(-N)?$`: o próprio slug base ou ele com sufixo numérico.
pub fn collision_pattern(base: &str) -> String {
    format!("^{}(-[0-9]+)?$", regex::escape(base))
}

/// Com `matches` slugs já ocupando a base, o próximo é `base-(matches+1)`.
/// Não procura o menor sufixo livre.
pub fn next_slug(base: &str, matches: usize) -> String {
    if matches == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, matches + 1)
    }
}

/// Deriva o slug de `name` consultando a coleção.
///
/// A consulta e a escrita que vem depois não são atômicas: duas criações
/// concorrentes com o mesmo nome podem chegar ao mesmo slug. Quem resolve é a
/// restrição UNIQUE do banco, que devolve `AppError::SlugConflict` no commit.
pub async fn assign_slug(stores: &dyn StoreCollection, name: &str) -> Result<String, AppError> {
    let mut base = slugify(name);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let taken = stores.find_slugs_matching(&collision_pattern(&base)).await?;
    let slug = next_slug(&base, taken.len());

    tracing::debug!(base = %base, taken = taken.len(), slug = %slug, "slug atribuído");
    Ok(slug)
}
