use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::{Mutex, OnceCell};
use tracing::warn;

use crate::collaborators::street_view::PictureLookup;
use crate::engine::average::{full_average, incremental_average};
use crate::engine::query_planner::PAGE_SIZE;
use crate::error::EngineError;
use crate::models::rating::RatingUpdate;
use crate::models::restaurant::{Location, NewRestaurant, PictureStatus, Restaurant};
use crate::repositories::restaurant_repo::{RestaurantPatch, RestaurantRepo};

pub mod average;
pub mod query_planner;

/// The only component that mutates restaurant state. Owns aggregate
/// maintenance, creation dedup and the memoized picture resolution.
pub struct RestaurantEngine {
    repo: Arc<RestaurantRepo>,
    pictures: Arc<dyn PictureLookup>,
    picture_lookups: Mutex<HashMap<String, Arc<OnceCell<bool>>>>,
    // Read-modify-write on avg/user_total must not interleave across the
    // two rating paths.
    aggregate_write: Mutex<()>,
}

impl RestaurantEngine {
    pub fn new(repo: Arc<RestaurantRepo>, pictures: Arc<dyn PictureLookup>) -> Self {
        Self {
            repo,
            pictures,
            picture_lookups: Mutex::new(HashMap::new()),
            aggregate_write: Mutex::new(()),
        }
    }

    /// Bulk creation. Every record gets its aggregate settled before it is
    /// stored; known ids are skipped by the repository and never an error.
    pub async fn create(&self, mut restaurants: Vec<Restaurant>) -> Result<(), EngineError> {
        for restaurant in &mut restaurants {
            restaurant.validate()?;
            if restaurant.ratings.is_empty() && restaurant.user_total > 0 {
                // External discovery hands over an aggregate without the
                // review bodies, keep it until details are backfilled.
                continue;
            }
            restaurant.avg = full_average(&restaurant.ratings);
            restaurant.user_total = restaurant.ratings.len();
        }
        self.repo.put(restaurants).await;
        Ok(())
    }

    /// Creates a user-submitted restaurant and reports the page-aligned
    /// index the caller should re-render so the new entry stays visible
    /// on the page the user was on.
    pub async fn add_restaurant(
        &self,
        new: NewRestaurant,
        insertion_index: usize,
    ) -> Result<(Restaurant, usize), EngineError> {
        let restaurant = Restaurant {
            place_id: generate_place_id(),
            name: new.name,
            address: new.address,
            location: Location {
                lat: new.lat,
                lng: new.lng,
            },
            ratings: Vec::new(),
            avg: 0.0,
            user_total: 0,
            picture: PictureStatus::Unknown,
        };
        restaurant.validate()?;
        self.repo.put(vec![restaurant.clone()]).await;

        Ok((restaurant, insertion_index - insertion_index % PAGE_SIZE))
    }

    /// Applies a rating update and returns the restaurant with its
    /// aggregate settled. A single interactive rating is folded in
    /// incrementally as one write; an external batch replaces the list
    /// wholesale and recomputes from scratch.
    pub async fn add_rating(
        &self,
        place_id: &str,
        update: RatingUpdate,
    ) -> Result<Restaurant, EngineError> {
        match update {
            RatingUpdate::Single(rating) => {
                rating.validate()?;

                let _guard = self.aggregate_write.lock().await;
                let restaurant = self.repo.get(place_id).await?;
                let aggregate =
                    incremental_average(restaurant.avg, restaurant.user_total, rating.stars);
                self.repo
                    .patch(
                        place_id,
                        vec![
                            RestaurantPatch::PrependRatings(vec![rating]),
                            RestaurantPatch::SetAggregate {
                                avg: aggregate.avg,
                                user_total: aggregate.count,
                            },
                        ],
                    )
                    .await
            }
            RatingUpdate::ExternalBatch(ratings) => {
                for rating in &ratings {
                    rating.validate()?;
                }

                let _guard = self.aggregate_write.lock().await;
                let avg = full_average(&ratings);
                let user_total = ratings.len();
                self.repo
                    .patch(
                        place_id,
                        vec![
                            RestaurantPatch::ReplaceRatings(ratings),
                            RestaurantPatch::SetAggregate { avg, user_total },
                        ],
                    )
                    .await
            }
        }
    }

    /// Resolves whether a street-level picture exists for the restaurant.
    /// The external check runs at most once per id for the lifetime of the
    /// process; concurrent callers share the single in-flight lookup and a
    /// failed lookup settles as no picture.
    pub async fn resolve_picture(&self, place_id: &str) -> Result<bool, EngineError> {
        let restaurant = self.repo.get(place_id).await?;
        if let Some(exists) = restaurant.picture.known() {
            return Ok(exists);
        }

        let cell = {
            let mut lookups = self.picture_lookups.lock().await;
            lookups
                .entry(place_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let exists = cell
            .get_or_try_init(|| async {
                let exists = match self
                    .pictures
                    .exists(restaurant.location.lat, restaurant.location.lng)
                    .await
                {
                    Ok(exists) => exists,
                    Err(e) => {
                        warn!(
                            "Failed to check the picture for place_id: {} due to: {}, assuming none",
                            place_id, e
                        );
                        false
                    }
                };
                self.repo
                    .patch(place_id, vec![RestaurantPatch::SetPicture(exists)])
                    .await?;
                Ok::<bool, EngineError>(exists)
            })
            .await?;

        Ok(*exists)
    }

    /// Fetches a restaurant with its picture state settled.
    pub async fn get_by_id(&self, place_id: &str) -> Result<Restaurant, EngineError> {
        self.resolve_picture(place_id).await?;
        self.repo.get(place_id).await
    }
}

/// Ids for user-added entries are timestamp tokens, unique enough for a
/// single collection and stable once assigned. Seeded entries get their id
/// from the feed index instead.
fn generate_place_id() -> String {
    OffsetDateTime::now_utc().unix_timestamp_nanos().to_string()
}
