use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::models::rating::Rating;
use crate::models::restaurant::{Location, PictureStatus, Restaurant};

/// One record of the startup ingestion feed.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SeedRestaurant {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

/// Loads the seed feed and assigns ids from the feed index. The engine
/// settles the aggregates, the feed only supplies the raw records.
pub fn load_seed_feed(path: &Path) -> anyhow::Result<Vec<Restaurant>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read the seed feed at {}", path.display()))?;
    let seeds: Vec<SeedRestaurant> =
        serde_json::from_str(&raw).context("Failed to parse the seed feed")?;

    let restaurants = seeds
        .into_iter()
        .enumerate()
        .map(|(index, seed)| Restaurant {
            place_id: index.to_string(),
            name: seed.name,
            address: seed.address,
            location: Location {
                lat: seed.lat,
                lng: seed.lng,
            },
            ratings: seed.ratings,
            avg: 0.0,
            user_total: 0,
            picture: PictureStatus::Unknown,
        })
        .collect();

    Ok(restaurants)
}
