use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use tokio::sync::Mutex;
use tracing::info;

use restomap_backend::collaborators::feed::load_seed_feed;
use restomap_backend::collaborators::map::GooglePlaces;
use restomap_backend::collaborators::street_view::StreetViewLookup;
use restomap_backend::config::Config;
use restomap_backend::controller::{self, AppState};
use restomap_backend::engine::query_planner::QueryPlanner;
use restomap_backend::engine::RestaurantEngine;
use restomap_backend::repositories::restaurant_repo::RestaurantRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("Starting restomap backend in {} mode", config.environment);

    let repo = Arc::new(RestaurantRepo::new());
    let pictures = Arc::new(StreetViewLookup::new(config.google_api_key.clone()));
    let engine = Arc::new(RestaurantEngine::new(repo.clone(), pictures));
    let planner = Arc::new(QueryPlanner::new(repo));
    let map = Arc::new(GooglePlaces::new(config.google_api_key.clone()));

    let seeds = load_seed_feed(&config.seed_feed_path)?;
    info!("Ingesting {} seed restaurants", seeds.len());
    engine.create(seeds).await?;

    let app_state = AppState {
        engine,
        planner,
        map,
        working_set: Arc::new(Mutex::new(None)),
    };

    controller::serve(app_state, &config).await
}
