use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tokio::sync::Mutex;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::collaborators::map::MapCollaborator;
use crate::config::Config;
use crate::engine::query_planner::{QueryPlanner, WorkingSet};
use crate::engine::RestaurantEngine;
use crate::helpers::handler_404::page_not_found_handler;

pub mod health_check;
pub mod restaurant_controller;
pub mod review_controller;

/// Shared handles the routers inject into their handlers. The working set
/// is the one piece of per-deployment read state: the last Show result,
/// which Filter and Page refine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RestaurantEngine>,
    pub planner: Arc<QueryPlanner>,
    pub map: Arc<dyn MapCollaborator>,
    pub working_set: Arc<Mutex<Option<WorkingSet>>>,
}

pub async fn serve(app_state: AppState, config: &Config) -> anyhow::Result<()> {
    let origins: Vec<HeaderValue> = config
        .origin_urls
        .split(',')
        .map(|s| s.parse().unwrap())
        .collect::<Vec<HeaderValue>>();

    let application = router_endpoints(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
                )
                .layer(CompressionLayer::new())
                .layer(ConcurrencyLimitLayer::new(512)),
        )
        .fallback(page_not_found_handler);

    let port = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("API server listening on port: {}", port);
    axum::Server::bind(&port)
        .serve(application.into_make_service())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    Router::new()
        .nest("/restaurants", restaurant_controller::router(app_state.clone()))
        .nest("/reviews", review_controller::router(app_state))
        .merge(health_check::router())
}
