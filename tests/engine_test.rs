use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use restomap_backend::collaborators::street_view::PictureLookup;
use restomap_backend::engine::query_planner::{page_of, QueryOutcome, QueryPlanner};
use restomap_backend::engine::RestaurantEngine;
use restomap_backend::error::EngineError;
use restomap_backend::models::query::{Bounds, Query, RatingRange};
use restomap_backend::models::rating::{Rating, RatingUpdate};
use restomap_backend::models::restaurant::{Location, NewRestaurant, PictureStatus, Restaurant};
use restomap_backend::repositories::restaurant_repo::RestaurantRepo;

struct StaticLookup(bool);

#[async_trait]
impl PictureLookup for StaticLookup {
    async fn exists(&self, _lat: f64, _lng: f64) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Counts external calls and stays in flight long enough for a second
/// caller to pile up behind the first.
struct SlowCountingLookup {
    calls: AtomicUsize,
}

#[async_trait]
impl PictureLookup for SlowCountingLookup {
    async fn exists(&self, _lat: f64, _lng: f64) -> anyhow::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(true)
    }
}

struct FailingLookup;

#[async_trait]
impl PictureLookup for FailingLookup {
    async fn exists(&self, _lat: f64, _lng: f64) -> anyhow::Result<bool> {
        anyhow::bail!("metadata endpoint unreachable")
    }
}

fn rating(stars: u8, user_name: &str) -> Rating {
    Rating {
        stars,
        user_name: user_name.to_string(),
        comment: "".to_string(),
    }
}

fn seed(place_id: &str, stars: &[u8]) -> Restaurant {
    Restaurant {
        place_id: place_id.to_string(),
        name: format!("restaurant {}", place_id),
        address: "Paris".to_string(),
        location: Location {
            lat: 48.85,
            lng: 2.35,
        },
        ratings: stars.iter().map(|&s| rating(s, "seed")).collect(),
        avg: 0.0,
        user_total: 0,
        picture: PictureStatus::Unknown,
    }
}

fn paris_bounds() -> Bounds {
    Bounds {
        north_lat: 49.0,
        north_lng: 3.0,
        south_lat: 48.0,
        south_lng: 2.0,
    }
}

#[tokio::test]
async fn ingestion_scenario_settles_averages_ratings_and_pages() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo.clone(), Arc::new(StaticLookup(false)));
    let planner = QueryPlanner::new(repo);

    engine
        .create(vec![seed("1", &[5, 3]), seed("2", &[4]), seed("3", &[])])
        .await
        .unwrap();

    let mut working_set = None;
    let outcome = planner
        .execute(
            &Query::Show {
                bounds: paris_bounds(),
                range: RatingRange::default(),
            },
            &mut working_set,
        )
        .await;
    let shown = match outcome {
        QueryOutcome::List(list) => list,
        QueryOutcome::Page(_) => panic!("show must produce a list"),
    };
    let averages: Vec<f64> = shown.iter().map(|r| r.avg).collect();
    assert_eq!(averages, vec![4.0, 4.0, 0.0]);
    assert_eq!(shown[0].user_total, 2);

    let updated = engine
        .add_rating("3", RatingUpdate::Single(rating(5, "nina")))
        .await
        .unwrap();
    assert_eq!(updated.avg, 5.0);
    assert_eq!(updated.user_total, 1);
    assert_eq!(updated.ratings.len(), 1);

    let mut working_set = None;
    planner
        .execute(
            &Query::Show {
                bounds: paris_bounds(),
                range: RatingRange::default(),
            },
            &mut working_set,
        )
        .await;
    let page = page_of(working_set.as_ref().unwrap().current(), 0, 2);
    let ids: Vec<&str> = page.items.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    assert!(page.has_next);
    assert!(!page.has_prev);
}

#[tokio::test]
async fn creating_the_same_record_twice_keeps_one_copy() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo.clone(), Arc::new(StaticLookup(false)));

    engine.create(vec![seed("1", &[5])]).await.unwrap();
    engine.create(vec![seed("1", &[1])]).await.unwrap();

    let found = repo.find_within_bounds(&paris_bounds()).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].avg, 5.0);
}

#[tokio::test]
async fn rating_an_unknown_restaurant_is_not_found() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo, Arc::new(StaticLookup(false)));

    let res = engine
        .add_rating("ghost", RatingUpdate::Single(rating(5, "nina")))
        .await;
    assert!(matches!(res, Err(EngineError::NotFound { .. })));
}

#[tokio::test]
async fn an_external_batch_replaces_ratings_and_recomputes_from_scratch() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo, Arc::new(StaticLookup(false)));

    // Discovery shape: an aggregate arrived without review bodies.
    let mut discovered = seed("g-1", &[]);
    discovered.avg = 4.6;
    discovered.user_total = 213;
    engine.create(vec![discovered]).await.unwrap();

    let updated = engine
        .add_rating(
            "g-1",
            RatingUpdate::ExternalBatch(vec![
                rating(5, "ext-a"),
                rating(4, "ext-b"),
                rating(3, "ext-c"),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(updated.ratings.len(), 3);
    assert_eq!(updated.avg, 4.0);
    assert_eq!(updated.user_total, 3);
}

#[tokio::test]
async fn discovery_aggregates_survive_creation() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo.clone(), Arc::new(StaticLookup(false)));

    let mut discovered = seed("g-2", &[]);
    discovered.avg = 3.9;
    discovered.user_total = 57;
    engine.create(vec![discovered]).await.unwrap();

    let stored = repo.get("g-2").await.unwrap();
    assert_eq!(stored.avg, 3.9);
    assert_eq!(stored.user_total, 57);
    assert!(stored.ratings.is_empty());
}

#[tokio::test]
async fn picture_lookup_runs_at_most_once_per_restaurant() {
    let repo = Arc::new(RestaurantRepo::new());
    let lookup = Arc::new(SlowCountingLookup {
        calls: AtomicUsize::new(0),
    });
    let engine = RestaurantEngine::new(repo, lookup.clone());

    engine.create(vec![seed("1", &[])]).await.unwrap();

    // The second call is issued while the first is still in flight.
    let (a, b) = tokio::join!(engine.resolve_picture("1"), engine.resolve_picture("1"));
    assert!(a.unwrap());
    assert!(b.unwrap());
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

    // Once settled, later calls come from the stored state.
    assert!(engine.resolve_picture("1").await.unwrap());
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_picture_lookup_settles_as_missing() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo.clone(), Arc::new(FailingLookup));

    engine.create(vec![seed("1", &[])]).await.unwrap();

    assert!(!engine.resolve_picture("1").await.unwrap());
    let stored = engine.get_by_id("1").await.unwrap();
    assert_eq!(stored.picture, PictureStatus::Missing);
}

#[tokio::test]
async fn added_restaurant_starts_empty_and_reports_the_page_start() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo.clone(), Arc::new(StaticLookup(false)));

    let new = NewRestaurant {
        name: "Le Nouveau".to_string(),
        address: "1 rue de Rivoli, Paris".to_string(),
        lat: 48.856,
        lng: 2.352,
    };
    let (restaurant, render_index) = engine.add_restaurant(new, 47).await.unwrap();

    assert!(restaurant.ratings.is_empty());
    assert_eq!(restaurant.avg, 0.0);
    assert_eq!(restaurant.user_total, 0);
    assert_eq!(restaurant.picture, PictureStatus::Unknown);
    assert_eq!(render_index, 40);
    assert!(repo.get(&restaurant.place_id).await.is_ok());
}

#[tokio::test]
async fn validation_fails_fast_at_the_boundary() {
    let repo = Arc::new(RestaurantRepo::new());
    let engine = RestaurantEngine::new(repo, Arc::new(StaticLookup(false)));

    engine.create(vec![seed("1", &[])]).await.unwrap();

    let res = engine
        .add_rating("1", RatingUpdate::Single(rating(6, "nina")))
        .await;
    assert!(matches!(res, Err(EngineError::InvalidStars { stars: 6 })));

    let res = engine
        .add_restaurant(
            NewRestaurant {
                name: "Nowhere".to_string(),
                address: "".to_string(),
                lat: 99.0,
                lng: 2.35,
            },
            0,
        )
        .await;
    assert!(matches!(res, Err(EngineError::InvalidCoordinates { .. })));

    let mut bad_seed = seed("2", &[]);
    bad_seed.ratings.push(rating(0, "seed"));
    let res = engine.create(vec![bad_seed]).await;
    assert!(matches!(res, Err(EngineError::InvalidStars { stars: 0 })));
}
