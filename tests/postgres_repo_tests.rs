// Rodar com: DATABASE_URL=postgres://... cargo test --features postgres-tests
#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use store_catalog::{
    db::{ReviewCollection, ReviewRepository, StoreCollection, StoreRepository},
    models::{
        review::NewReview,
        store::{Location, LocationInput, Store, StoreInput, StoreQuery, TagCount, POINT},
    },
    services::{aggregation_service::TOP_STORES_LIMIT, AggregationService, StoreService},
    AppError,
};
use uuid::Uuid;

struct Fixture {
    stores: StoreService,
    aggregations: AggregationService,
    store_repo: StoreRepository,
    review_repo: ReviewRepository,
}

fn setup(pool: PgPool) -> Fixture {
    let store_repo = StoreRepository::new(pool.clone());
    let review_repo = ReviewRepository::new(pool);
    Fixture {
        stores: StoreService::new(Arc::new(store_repo.clone()), Arc::new(review_repo.clone())),
        aggregations: AggregationService::new(Arc::new(store_repo.clone())),
        store_repo,
        review_repo,
    }
}

fn input(name: &str, tags: &[&str]) -> StoreInput {
    StoreInput {
        name: Some(name.to_string()),
        description: Some("Best coffee in town".into()),
        tags: Some(tags.iter().map(|t| t.to_string()).collect()),
        location: Some(LocationInput {
            coordinates: Some(vec![-79.3832, 43.6532]),
            address: Some("1 Front St, Toronto".into()),
        }),
        photo: Some(format!("{}.jpg", name)),
        author: Some(Uuid::new_v4()),
        ..Default::default()
    }
}

impl Fixture {
    async fn rate(&self, store: &Store, ratings: &[i32]) {
        for rating in ratings {
            self.review_repo
                .insert_review(NewReview::new(store.id, *rating))
                .await
                .unwrap();
        }
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn identical_names_get_numbered_slugs(pool: PgPool) {
    let f = setup(pool);

    let first = f.stores.create(input("Cafe Delight", &[])).await.unwrap();
    let second = f.stores.create(input("Café Delight", &[])).await.unwrap();
    let third = f.stores.create(input("CAFE delight", &[])).await.unwrap();

    assert_eq!(first.slug, "cafe-delight");
    assert_eq!(second.slug, "cafe-delight-2");
    assert_eq!(third.slug, "cafe-delight-3");
}

#[sqlx::test(migrations = "./migrations")]
async fn slug_lookup_ignores_case_and_near_misses(pool: PgPool) {
    let f = setup(pool);
    f.stores.create(input("Cafe Delight", &[])).await.unwrap();
    f.stores.create(input("Cafe Delightful", &[])).await.unwrap();

    let taken = f
        .store_repo
        .find_slugs_matching(r"^CAFE\-DELIGHT(-[0-9]+)?$")
        .await
        .unwrap();
    assert_eq!(taken, vec!["cafe-delight".to_string()]);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_slug_insert_is_a_slug_conflict(pool: PgPool) {
    let f = setup(pool);
    let existing = f.stores.create(input("Cafe Delight", &[])).await.unwrap();

    let clash = Store {
        id: Uuid::new_v4(),
        name: "Another Cafe".into(),
        slug: existing.slug.clone(),
        description: None,
        tags: Vec::new(),
        created: Utc::now(),
        location: Location {
            kind: POINT.into(),
            coordinates: vec![1.0, 2.0],
            address: "Elsewhere".into(),
        },
        photo: None,
        author: Uuid::new_v4(),
        reviews: Vec::new(),
    };

    let err = f.store_repo.insert(&clash).await.unwrap_err();
    assert!(matches!(err, AppError::SlugConflict(ref s) if s == "cafe-delight"));
}

#[sqlx::test(migrations = "./migrations")]
async fn fetch_round_trips_and_populates_reviews(pool: PgPool) {
    let f = setup(pool);
    let saved = f.stores.create(input("  Cafe Delight ", &["Wifi", "Wifi"])).await.unwrap();

    let fetched = f.stores.get_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Cafe Delight");
    assert_eq!(fetched.slug, "cafe-delight");
    assert_eq!(fetched.tags, vec!["Wifi".to_string(), "Wifi".to_string()]);
    assert_eq!(fetched.location, saved.location);
    assert_eq!(fetched.author, saved.author);
    assert!(fetched.reviews.is_empty());

    f.rate(&saved, &[4, 2]).await;
    let fetched = f.stores.get_by_slug("cafe-delight").await.unwrap().unwrap();
    let mut ratings: Vec<i32> = fetched.reviews.iter().map(|r| r.rating).collect();
    ratings.sort();
    assert_eq!(ratings, vec![2, 4]);
}

#[sqlx::test(migrations = "./migrations")]
async fn negative_paging_behaves_like_zero(pool: PgPool) {
    let f = setup(pool);
    f.stores.create(input("Cafe Delight", &[])).await.unwrap();

    let all = f
        .stores
        .fetch(&StoreQuery { skip: Some(-3), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    let none = f
        .stores
        .fetch(&StoreQuery { limit: Some(-1), ..Default::default() })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn tags_list_counts_every_occurrence(pool: PgPool) {
    let f = setup(pool);
    f.stores.create(input("One", &["a", "b"])).await.unwrap();
    f.stores.create(input("Two", &["a"])).await.unwrap();
    f.stores.create(input("Three", &["b", "b"])).await.unwrap();

    let tags = f.aggregations.get_tags_list().await.unwrap();

    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&TagCount { tag: "a".into(), count: 2 }));
    assert!(tags.contains(&TagCount { tag: "b".into(), count: 3 }));
}

#[sqlx::test(migrations = "./migrations")]
async fn top_stores_requires_more_than_one_review(pool: PgPool) {
    let f = setup(pool);
    let pair = f.stores.create(input("Pair", &[])).await.unwrap();
    let single = f.stores.create(input("Single", &[])).await.unwrap();
    f.stores.create(input("None", &[])).await.unwrap();
    f.rate(&pair, &[5, 3]).await;
    f.rate(&single, &[5]).await;

    let top = f.aggregations.get_top_stores().await.unwrap();

    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "Pair");
    assert_eq!(top[0].slug, "pair");
    assert_eq!(top[0].photo.as_deref(), Some("Pair.jpg"));
    assert_eq!(top[0].average_rating, 4.0);
    // Avaliações vêm do json_agg
    assert_eq!(top[0].reviews.len(), 2);
    assert!(top[0].reviews.iter().all(|r| r.store == pair.id));
    let mut ratings: Vec<i32> = top[0].reviews.iter().map(|r| r.rating).collect();
    ratings.sort();
    assert_eq!(ratings, vec![3, 5]);
}

#[sqlx::test(migrations = "./migrations")]
async fn top_stores_sorted_and_capped_at_ten(pool: PgPool) {
    let f = setup(pool);
    for i in 0..12 {
        let store = f.stores.create(input(&format!("Store {}", i), &[])).await.unwrap();
        // Média = (2 + i%5) / 2, máxima 3.0
        f.rate(&store, &[1, 1 + (i % 5)]).await;
    }

    let top = f.aggregations.get_top_stores().await.unwrap();

    assert_eq!(top.len(), TOP_STORES_LIMIT);
    assert!(top.windows(2).all(|w| w[0].average_rating >= w[1].average_rating));
    assert_eq!(top[0].average_rating, 3.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn top_stores_empty_without_qualifying_stores(pool: PgPool) {
    let f = setup(pool);
    let lonely = f.stores.create(input("Lonely", &[])).await.unwrap();
    f.rate(&lonely, &[4]).await;

    assert!(f.aggregations.get_top_stores().await.unwrap().is_empty());
}
