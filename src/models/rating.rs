use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A single review, owned by its restaurant.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Rating {
    pub stars: u8,
    pub user_name: String,
    pub comment: String,
}

impl Rating {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(1..=5).contains(&self.stars) {
            return Err(EngineError::InvalidStars { stars: self.stars });
        }
        Ok(())
    }
}

/// How ratings arrive at the engine. A single interactive review is folded
/// into the aggregate incrementally; a batch fetched from an external
/// place-details lookup replaces the local list wholesale.
#[derive(Clone, Debug)]
pub enum RatingUpdate {
    Single(Rating),
    ExternalBatch(Vec<Rating>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_outside_one_to_five_are_rejected() {
        let mut rating = Rating {
            stars: 0,
            user_name: "anna".to_string(),
            comment: "".to_string(),
        };
        assert!(matches!(
            rating.validate(),
            Err(EngineError::InvalidStars { stars: 0 })
        ));

        rating.stars = 6;
        assert!(rating.validate().is_err());

        rating.stars = 5;
        assert!(rating.validate().is_ok());
    }
}
