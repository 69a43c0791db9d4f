// src/db/store_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_slug_violation, AppError},
    models::{
        review::Review,
        store::{Location, Store, StoreQuery, TagCount, TopStore},
    },
};

/// A coleção de lojas vista pelo núcleo: busca filtrada, inserção,
/// atualização e as duas agregações.
#[async_trait]
pub trait StoreCollection: Send + Sync {
    /// Slugs que casam com a regex `pattern`, sem diferenciar maiúsculas.
    async fn find_slugs_matching(&self, pattern: &str) -> Result<Vec<String>, AppError>;

    async fn insert(&self, store: &Store) -> Result<Store, AppError>;

    /// Falha com `StoreNotFound` se o id não existir.
    async fn update(&self, store: &Store) -> Result<Store, AppError>;

    /// Lojas sem `reviews` (o join é feito pelo serviço).
    async fn find(&self, query: &StoreQuery) -> Result<Vec<Store>, AppError>;

    async fn tag_counts(&self) -> Result<Vec<TagCount>, AppError>;

    async fn top_stores(&self, limit: usize) -> Result<Vec<TopStore>, AppError>;
}

// Linha crua da tabela `stores`
#[derive(Debug, FromRow)]
struct StoreRow {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    tags: Vec<String>,
    created: DateTime<Utc>,
    location_type: String,
    coordinates: Vec<f64>,
    address: String,
    photo: Option<String>,
    author_id: Uuid,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Store {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            tags: row.tags,
            created: row.created,
            location: Location {
                kind: row.location_type,
                coordinates: row.coordinates,
                address: row.address,
            },
            photo: row.photo,
            author: row.author_id,
            reviews: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
struct TopStoreRow {
    photo: Option<String>,
    name: String,
    slug: String,
    reviews: Json<Vec<Review>>,
    average_rating: f64,
}

const STORE_COLUMNS: &str = r#"
    id, name, slug, description, tags, created,
    location_type, coordinates, address, photo, author_id
"#;

#[derive(Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreCollection for StoreRepository {
    async fn find_slugs_matching(&self, pattern: &str) -> Result<Vec<String>, AppError> {
        // `~*` = regex sem diferenciar maiúsculas
        let slugs = sqlx::query_scalar::<_, String>("SELECT slug FROM stores WHERE slug ~* $1")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        Ok(slugs)
    }

    async fn insert(&self, store: &Store) -> Result<Store, AppError> {
        let sql = format!(
            r#"
            INSERT INTO stores (
                id, name, slug, description, tags, created,
                location_type, coordinates, address, photo, author_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            STORE_COLUMNS
        );

        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(store.id)
            .bind(&store.name)
            .bind(&store.slug)
            .bind(&store.description)
            .bind(&store.tags)
            .bind(store.created)
            .bind(&store.location.kind)
            .bind(&store.location.coordinates)
            .bind(&store.location.address)
            .bind(&store.photo)
            .bind(store.author)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_slug_violation(e, &store.slug))?;

        Ok(row.into())
    }

    async fn update(&self, store: &Store) -> Result<Store, AppError> {
        let sql = format!(
            r#"
            UPDATE stores SET
                name = $2, slug = $3, description = $4, tags = $5, created = $6,
                location_type = $7, coordinates = $8, address = $9,
                photo = $10, author_id = $11
            WHERE id = $1
            RETURNING {}
            "#,
            STORE_COLUMNS
        );

        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(store.id)
            .bind(&store.name)
            .bind(&store.slug)
            .bind(&store.description)
            .bind(&store.tags)
            .bind(store.created)
            .bind(&store.location.kind)
            .bind(&store.location.coordinates)
            .bind(&store.location.address)
            .bind(&store.photo)
            .bind(store.author)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_slug_violation(e, &store.slug))?;

        row.map(Store::from).ok_or(AppError::StoreNotFound(store.id))
    }

    async fn find(&self, query: &StoreQuery) -> Result<Vec<Store>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM stores WHERE TRUE",
            STORE_COLUMNS
        ));

        if let Some(id) = query.id {
            qb.push(" AND id = ").push_bind(id);
        }
        if let Some(slug) = &query.slug {
            qb.push(" AND slug = ").push_bind(slug.clone());
        }
        if let Some(tag) = &query.tag {
            qb.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
        }
        if let Some(author) = query.author {
            qb.push(" AND author_id = ").push_bind(author);
        }

        qb.push(" ORDER BY created DESC");

        // Negativo vale 0, como na coleção em memória
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(limit.max(0));
        }
        if let Some(skip) = query.skip {
            qb.push(" OFFSET ").push_bind(skip.max(0));
        }

        let rows = qb
            .build_query_as::<StoreRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, AppError> {
        // Uma linha por ocorrência: tag repetida na mesma loja conta duas vezes
        let counts = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT t.tag, COUNT(*) AS count
            FROM stores s
            CROSS JOIN LATERAL unnest(s.tags) AS t(tag)
            GROUP BY t.tag
            ORDER BY count DESC, t.tag ASC
            "#,
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(counts
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect())
    }

    async fn top_stores(&self, limit: usize) -> Result<Vec<TopStore>, AppError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, TopStoreRow>(
            r#"
            SELECT
                s.photo, s.name, s.slug,
                json_agg(
                    json_build_object(
                        'id', r.id, 'store', r.store_id, 'author', r.author_id,
                        'text', r.text, 'rating', r.rating, 'created', r.created
                    )
                    ORDER BY r.created
                ) AS reviews,
                AVG(r.rating)::float8 AS average_rating
            FROM stores s
            JOIN reviews r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) > 1
            ORDER BY average_rating DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopStore {
                photo: row.photo,
                name: row.name,
                slug: row.slug,
                reviews: row.reviews.0,
                average_rating: row.average_rating,
            })
            .collect())
    }
}
