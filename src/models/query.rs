use serde::{Deserialize, Serialize};

use crate::models::restaurant::{Location, Restaurant};

/// The map viewport rectangle.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct Bounds {
    pub north_lat: f64,
    pub north_lng: f64,
    pub south_lat: f64,
    pub south_lng: f64,
}

impl Bounds {
    /// Strict on both axes, a record sitting exactly on an edge stays out.
    pub fn contains(&self, location: &Location) -> bool {
        location.lat < self.north_lat
            && location.lat > self.south_lat
            && location.lng < self.north_lng
            && location.lng > self.south_lng
    }
}

/// Inclusive rating filter window.
#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct RatingRange {
    pub min: f64,
    pub max: f64,
}

impl RatingRange {
    pub fn contains(&self, avg: f64) -> bool {
        avg >= self.min && avg <= self.max
    }
}

impl Default for RatingRange {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
#[serde(rename_all = "lowercase")]
pub enum PageDirection {
    Next,
    Previous,
}

/// The three read requests the planner answers. Show establishes a fresh
/// working set from the map bounds, Filter narrows the cached set by
/// rating, Page windows the current filtered list.
#[derive(Clone, Debug)]
pub enum Query {
    Show { bounds: Bounds, range: RatingRange },
    Filter { range: RatingRange },
    Page { direction: PageDirection, index: usize },
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct RestaurantPage {
    pub items: Vec<Restaurant>,
    pub has_next: bool,
    pub has_prev: bool,
}
