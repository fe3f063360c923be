use std::sync::Arc;

use tracing::debug;

use crate::models::query::{Query, RatingRange, RestaurantPage};
use crate::models::restaurant::Restaurant;
use crate::repositories::restaurant_repo::RestaurantRepo;

pub const PAGE_SIZE: usize = 20;

/// The bounds-filtered subset of restaurants currently eligible for
/// rating-filter and pagination. Established by a Show query and handed
/// back explicitly to Filter and Page, so there is no hidden state shared
/// between calls.
#[derive(Clone, Debug, Default)]
pub struct WorkingSet {
    in_bounds: Vec<Restaurant>,
    current: Vec<Restaurant>,
}

impl WorkingSet {
    /// The list Filter last produced, in storage insertion order.
    pub fn current(&self) -> &[Restaurant] {
        &self.current
    }

    /// Splices a freshly added restaurant into the set so it shows up on
    /// the page the user was on, regardless of the active rating filter.
    pub fn insert(&mut self, index: usize, restaurant: Restaurant) {
        let at = index.min(self.in_bounds.len());
        self.in_bounds.insert(at, restaurant.clone());
        let at = index.min(self.current.len());
        self.current.insert(at, restaurant);
    }
}

pub enum QueryOutcome {
    List(Vec<Restaurant>),
    Page(RestaurantPage),
}

/// Deterministic filtering and windowing over the engine's collection.
pub struct QueryPlanner {
    repo: Arc<RestaurantRepo>,
}

impl QueryPlanner {
    pub fn new(repo: Arc<RestaurantRepo>) -> Self {
        Self { repo }
    }

    /// Answers one query against the caller's working set, replacing the
    /// set on Show. Filter and Page never go back to storage.
    pub async fn execute(
        &self,
        query: &Query,
        working_set: &mut Option<WorkingSet>,
    ) -> QueryOutcome {
        match query {
            Query::Show { bounds, range } => {
                let in_bounds = self.repo.find_within_bounds(bounds).await;
                let current = filter_by_range(&in_bounds, range);
                debug!(
                    "show matched {} restaurants in bounds, {} after the rating filter",
                    in_bounds.len(),
                    current.len()
                );
                *working_set = Some(WorkingSet {
                    in_bounds,
                    current: current.clone(),
                });
                QueryOutcome::List(current)
            }
            Query::Filter { range } => match working_set {
                Some(set) => {
                    set.current = filter_by_range(&set.in_bounds, range);
                    QueryOutcome::List(set.current.clone())
                }
                None => QueryOutcome::List(Vec::new()),
            },
            Query::Page { direction, index } => {
                let current = working_set
                    .as_ref()
                    .map(|set| set.current())
                    .unwrap_or(&[]);
                debug!("serving {:?} page at offset {}", direction, index);
                QueryOutcome::Page(page_of(current, *index, PAGE_SIZE))
            }
        }
    }
}

fn filter_by_range(restaurants: &[Restaurant], range: &RatingRange) -> Vec<Restaurant> {
    restaurants
        .iter()
        .filter(|r| range.contains(r.avg))
        .cloned()
        .collect()
}

/// Windows `[index, index + page_size)` out of the list. The caller has
/// already moved the index in the direction it wants, one page at a time.
pub fn page_of(restaurants: &[Restaurant], index: usize, page_size: usize) -> RestaurantPage {
    let items = if index >= restaurants.len() {
        Vec::new()
    } else {
        restaurants[index..(index + page_size).min(restaurants.len())].to_vec()
    };

    RestaurantPage {
        items,
        has_next: index.saturating_add(page_size) < restaurants.len(),
        has_prev: index > 0,
    }
}
