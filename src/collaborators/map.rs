use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::query::Bounds;
use crate::models::rating::Rating;
use crate::models::restaurant::{Location, PictureStatus, Restaurant};

/// Discovery and detail lookups supplied by the map side of the
/// application.
#[async_trait]
pub trait MapCollaborator: Send + Sync {
    /// Additional candidate restaurants near the current view, None when
    /// the lookup has nothing to offer.
    async fn search_places(&self, bounds: &Bounds) -> anyhow::Result<Option<Vec<Restaurant>>>;

    /// External reviews for a restaurant that carries an aggregate but no
    /// local review bodies.
    async fn place_details(&self, place_id: &str) -> anyhow::Result<Option<Vec<Rating>>>;
}

const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const PLACE_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const NEARBY_SEARCH_RADIUS_M: u32 = 500;

pub struct GooglePlaces {
    client: reqwest::Client,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyPlace>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct NearbyPlace {
    place_id: String,
    name: String,
    #[serde(default)]
    vicinity: String,
    geometry: PlaceGeometry,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    user_ratings_total: usize,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct PlaceGeometry {
    location: PlaceLocation,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct PlaceLocation {
    lat: f64,
    lng: f64,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct PlaceDetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct PlaceDetails {
    #[serde(default)]
    reviews: Vec<PlaceReview>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct PlaceReview {
    rating: u8,
    author_name: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl MapCollaborator for GooglePlaces {
    async fn search_places(&self, bounds: &Bounds) -> anyhow::Result<Option<Vec<Restaurant>>> {
        let center_lat = (bounds.north_lat + bounds.south_lat) / 2.0;
        let center_lng = (bounds.north_lng + bounds.south_lng) / 2.0;

        let response = self
            .client
            .get(NEARBY_SEARCH_URL)
            .query(&[
                ("location", format!("{},{}", center_lat, center_lng)),
                ("radius", NEARBY_SEARCH_RADIUS_M.to_string()),
                ("type", "restaurant".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .json::<NearbySearchResponse>()
            .await?;

        if response.status != "OK" {
            return Ok(None);
        }

        let restaurants = response
            .results
            .into_iter()
            .map(|place| Restaurant {
                place_id: place.place_id,
                name: place.name,
                address: place.vicinity,
                location: Location {
                    lat: place.geometry.location.lat,
                    lng: place.geometry.location.lng,
                },
                // Nearby search only carries the aggregate, review bodies
                // are backfilled from place details on demand.
                ratings: Vec::new(),
                avg: place.rating,
                user_total: place.user_ratings_total,
                picture: PictureStatus::Unknown,
            })
            .collect();

        Ok(Some(restaurants))
    }

    async fn place_details(&self, place_id: &str) -> anyhow::Result<Option<Vec<Rating>>> {
        let response = self
            .client
            .get(PLACE_DETAILS_URL)
            .query(&[
                ("place_id", place_id.to_string()),
                ("fields", "reviews".to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .json::<PlaceDetailsResponse>()
            .await?;

        if response.status != "OK" {
            return Ok(None);
        }

        let reviews = match response.result {
            Some(details) if !details.reviews.is_empty() => details.reviews,
            _ => return Ok(None),
        };

        let ratings = reviews
            .into_iter()
            .map(|review| Rating {
                stars: review.rating.clamp(1, 5),
                user_name: review.author_name,
                comment: review.text,
            })
            .collect();

        Ok(Some(ratings))
    }
}
