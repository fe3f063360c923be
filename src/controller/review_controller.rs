use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::controller::AppState;
use crate::error::EngineError;
use crate::models::rating::{Rating, RatingUpdate};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", post(add_review))
        .route_layer(Extension(app_state))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddReviewBody {
    pub place_id: String,
    pub stars: u8,
    pub user_name: String,
    pub comment: String,
}

pub async fn add_review(
    Extension(app_state): Extension<AppState>,
    Json(body): Json<AddReviewBody>,
) -> impl IntoResponse {
    let rating = Rating {
        stars: body.stars,
        user_name: body.user_name,
        comment: body.comment,
    };

    return match app_state
        .engine
        .add_rating(&body.place_id, RatingUpdate::Single(rating))
        .await
    {
        Ok(restaurant) => (StatusCode::OK, json!(&restaurant).to_string()).into_response(),
        Err(EngineError::NotFound { place_id }) => {
            warn!("Tried to review an unknown restaurant with place_id: {}", place_id);
            (StatusCode::NOT_FOUND, "No restaurant found for this review").into_response()
        }
        Err(e) => {
            warn!("Failed to add review for restaurant due to: {}", e);
            (StatusCode::BAD_REQUEST, "Failed to add review, please try again").into_response()
        }
    };
}
