use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::controller::AppState;
use crate::engine::query_planner::QueryOutcome;
use crate::error::EngineError;
use crate::models::query::{Bounds, PageDirection, Query as RestaurantQuery, RatingRange};
use crate::models::rating::RatingUpdate;
use crate::models::restaurant::NewRestaurant;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(show_restaurants))
        .route("/", post(add_restaurant))
        .route("/filter", get(filter_restaurants))
        .route("/page", get(page_restaurants))
        .route("/details", get(restaurant_details))
        .route_layer(Extension(app_state))
}

fn outcome_body(outcome: QueryOutcome) -> String {
    match outcome {
        QueryOutcome::List(restaurants) => json!(&restaurants).to_string(),
        QueryOutcome::Page(page) => json!(&page).to_string(),
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct ShowRestaurantsParam {
    pub north_lat: f64,
    pub north_lng: f64,
    pub south_lat: f64,
    pub south_lng: f64,
    pub min: f64,
    pub max: f64,
}

pub async fn show_restaurants(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<ShowRestaurantsParam>,
) -> impl IntoResponse {
    let bounds = Bounds {
        north_lat: query.north_lat,
        north_lng: query.north_lng,
        south_lat: query.south_lat,
        south_lng: query.south_lng,
    };
    let range = RatingRange {
        min: query.min,
        max: query.max,
    };

    // Merge freshly discovered places before answering. Known ids are
    // skipped on creation.
    match app_state.map.search_places(&bounds).await {
        Ok(Some(discovered)) => {
            if let Err(e) = app_state.engine.create(discovered).await {
                warn!("Failed to merge discovered places due to: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => {
            warn!("Something went wrong searching for places due to: {}", e);
        }
    }

    let mut working_set = app_state.working_set.lock().await;
    let outcome = app_state
        .planner
        .execute(&RestaurantQuery::Show { bounds, range }, &mut working_set)
        .await;

    (StatusCode::OK, outcome_body(outcome)).into_response()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct FilterRestaurantsParam {
    pub min: f64,
    pub max: f64,
}

pub async fn filter_restaurants(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<FilterRestaurantsParam>,
) -> impl IntoResponse {
    let range = RatingRange {
        min: query.min,
        max: query.max,
    };

    let mut working_set = app_state.working_set.lock().await;
    let outcome = app_state
        .planner
        .execute(&RestaurantQuery::Filter { range }, &mut working_set)
        .await;

    (StatusCode::OK, outcome_body(outcome)).into_response()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PageRestaurantsParam {
    pub direction: PageDirection,
    pub index: usize,
}

pub async fn page_restaurants(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<PageRestaurantsParam>,
) -> impl IntoResponse {
    let mut working_set = app_state.working_set.lock().await;
    let outcome = app_state
        .planner
        .execute(
            &RestaurantQuery::Page {
                direction: query.direction,
                index: query.index,
            },
            &mut working_set,
        )
        .await;

    (StatusCode::OK, outcome_body(outcome)).into_response()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RestaurantDetailsParam {
    pub place_id: String,
}

pub async fn restaurant_details(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<RestaurantDetailsParam>,
) -> impl IntoResponse {
    let restaurant = match app_state.engine.get_by_id(&query.place_id).await {
        Ok(restaurant) => restaurant,
        Err(EngineError::NotFound { place_id }) => {
            warn!("Requested details for an unknown place_id: {}", place_id);
            return (StatusCode::NOT_FOUND, "No restaurant found for this id").into_response();
        }
        Err(e) => {
            warn!("Something went wrong retrieving restaurant details due to: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                "Failed to retrieve restaurant details, please try again!",
            )
                .into_response();
        }
    };

    // An aggregate without local review bodies means the reviews live with
    // the external place. Fetch them once and keep them; failure degrades
    // to serving the record without external reviews.
    if restaurant.user_total > 0 && restaurant.ratings.is_empty() {
        match app_state.map.place_details(&query.place_id).await {
            Ok(Some(reviews)) => {
                match app_state
                    .engine
                    .add_rating(&query.place_id, RatingUpdate::ExternalBatch(reviews))
                    .await
                {
                    Ok(updated) => {
                        return (StatusCode::OK, json!(&updated).to_string()).into_response()
                    }
                    Err(e) => {
                        warn!("Failed to backfill external reviews due to: {}", e);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Something went wrong fetching place details due to: {}", e);
            }
        }
    }

    (StatusCode::OK, json!(&restaurant).to_string()).into_response()
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AddRestaurantBody {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// Position in the list the user was looking at when they added the
    /// entry.
    #[serde(default)]
    pub index: usize,
}

pub async fn add_restaurant(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<AddRestaurantBody>,
) -> impl IntoResponse {
    let new = NewRestaurant {
        name: body.name,
        address: body.address,
        lat: body.lat,
        lng: body.lng,
    };

    return match app_state.engine.add_restaurant(new, body.index).await {
        Ok((restaurant, render_index)) => {
            let mut working_set = app_state.working_set.lock().await;
            if let Some(set) = working_set.as_mut() {
                set.insert(body.index, restaurant.clone());
            }

            (
                StatusCode::OK,
                json!({ "restaurant": restaurant, "index": render_index }).to_string(),
            )
                .into_response()
        }
        Err(e) => {
            warn!("Failed to add restaurant due to: {}", e);
            (StatusCode::BAD_REQUEST, "Failed to add restaurant, please try again").into_response()
        }
    };
}
