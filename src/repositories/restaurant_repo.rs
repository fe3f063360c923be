use tokio::sync::RwLock;

use crate::error::EngineError;
use crate::models::query::Bounds;
use crate::models::rating::Rating;
use crate::models::restaurant::{PictureStatus, Restaurant};

/// Mutations `patch` can apply to a stored restaurant.
#[derive(Clone, Debug)]
pub enum RestaurantPatch {
    /// New reviews go in front, newest first.
    PrependRatings(Vec<Rating>),
    /// Wholesale replacement, used when an external batch supersedes the
    /// local list.
    ReplaceRatings(Vec<Rating>),
    SetPicture(bool),
    /// Direct aggregate write, paired with a rating mutation by the
    /// incremental-average path.
    SetAggregate { avg: f64, user_total: usize },
}

/// The single named collection of restaurant records, keyed by place_id.
/// Insertion order is stable, bounds queries and paging rely on it.
pub struct RestaurantRepo {
    restaurants: RwLock<Vec<Restaurant>>,
}

impl RestaurantRepo {
    pub fn new() -> Self {
        Self {
            restaurants: RwLock::new(Vec::new()),
        }
    }

    /// Inserts every record whose place_id is not already present.
    /// Known ids are silently skipped, re-ingesting the same feed is the
    /// normal case and not an error.
    pub async fn put(&self, records: Vec<Restaurant>) {
        let mut restaurants = self.restaurants.write().await;
        for record in records {
            if restaurants.iter().any(|r| r.place_id == record.place_id) {
                continue;
            }
            restaurants.push(record);
        }
    }

    /// All records strictly inside the rectangle, in insertion order.
    pub async fn find_within_bounds(&self, bounds: &Bounds) -> Vec<Restaurant> {
        let restaurants = self.restaurants.read().await;
        restaurants
            .iter()
            .filter(|r| bounds.contains(&r.location))
            .cloned()
            .collect()
    }

    pub async fn get(&self, place_id: &str) -> Result<Restaurant, EngineError> {
        let restaurants = self.restaurants.read().await;
        restaurants
            .iter()
            .find(|r| r.place_id == place_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound {
                place_id: place_id.to_string(),
            })
    }

    /// Applies the patches under a single write-lock acquisition and
    /// returns the updated record.
    pub async fn patch(
        &self,
        place_id: &str,
        patches: Vec<RestaurantPatch>,
    ) -> Result<Restaurant, EngineError> {
        let mut restaurants = self.restaurants.write().await;
        let restaurant = restaurants
            .iter_mut()
            .find(|r| r.place_id == place_id)
            .ok_or_else(|| EngineError::NotFound {
                place_id: place_id.to_string(),
            })?;

        for patch in patches {
            match patch {
                RestaurantPatch::PrependRatings(ratings) => {
                    for rating in ratings {
                        restaurant.ratings.insert(0, rating);
                    }
                }
                RestaurantPatch::ReplaceRatings(ratings) => {
                    restaurant.ratings = ratings;
                }
                RestaurantPatch::SetPicture(exists) => {
                    restaurant.picture = PictureStatus::from_exists(exists);
                }
                RestaurantPatch::SetAggregate { avg, user_total } => {
                    restaurant.avg = avg;
                    restaurant.user_total = user_total;
                }
            }
        }

        Ok(restaurant.clone())
    }
}

impl Default for RestaurantRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::restaurant::Location;

    fn record(place_id: &str, lat: f64, lng: f64) -> Restaurant {
        Restaurant {
            place_id: place_id.to_string(),
            name: format!("restaurant {}", place_id),
            address: "Paris".to_string(),
            location: Location { lat, lng },
            ratings: Vec::new(),
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
    async fn put_skips_records_with_a_known_id() {
        let repo = RestaurantRepo::new();
        repo.put(vec![record("1", 48.5, 2.5)]).await;

        let mut shadow = record("1", 48.6, 2.6);
        shadow.name = "impostor".to_string();
        repo.put(vec![shadow, record("2", 48.5, 2.5)]).await;

        let found = repo.find_within_bounds(&paris_bounds()).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].place_id, "1");
        assert_eq!(found[0].name, "restaurant 1");
        assert_eq!(found[1].place_id, "2");
    }

    #[tokio::test]
    async fn bounds_query_is_strict_and_keeps_insertion_order() {
        let repo = RestaurantRepo::new();
        repo.put(vec![
            record("inside", 48.5, 2.5),
            record("on-south-edge", 48.0, 2.5),
            record("on-north-edge", 49.0, 2.5),
            record("also-inside", 48.9, 2.9),
            record("outside", 50.0, 2.5),
        ])
        .await;

        let found = repo.find_within_bounds(&paris_bounds()).await;
        let ids: Vec<&str> = found.iter().map(|r| r.place_id.as_str()).collect();
        assert_eq!(ids, vec!["inside", "also-inside"]);
    }

    #[tokio::test]
    async fn patch_on_an_unknown_id_is_not_found() {
        let repo = RestaurantRepo::new();
        let res = repo.patch("ghost", vec![RestaurantPatch::SetPicture(true)]).await;
        assert!(matches!(res, Err(EngineError::NotFound { .. })));
    }

    #[tokio::test]
    async fn patch_prepends_ratings_and_sets_the_aggregate_in_one_write() {
        let repo = RestaurantRepo::new();
        let mut seeded = record("1", 48.5, 2.5);
        seeded.ratings = vec![Rating {
            stars: 3,
            user_name: "old".to_string(),
            comment: "".to_string(),
        }];
        repo.put(vec![seeded]).await;

        let updated = repo
            .patch(
                "1",
                vec![
                    RestaurantPatch::PrependRatings(vec![Rating {
                        stars: 5,
                        user_name: "new".to_string(),
                        comment: "".to_string(),
                    }]),
                    RestaurantPatch::SetAggregate {
                        avg: 4.0,
                        user_total: 2,
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(updated.ratings[0].user_name, "new");
        assert_eq!(updated.ratings[1].user_name, "old");
        assert_eq!(updated.avg, 4.0);
        assert_eq!(updated.user_total, 2);
    }
}
