use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::rating::Rating;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Restaurant {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub location: Location,
    /// Newest first, new reviews are prepended.
    #[serde(default)]
    pub ratings: Vec<Rating>,
    /// Cached mean of the stars, 0 when no rating was ever incorporated.
    #[serde(default)]
    pub avg: f64,
    /// Count of ratings ever incorporated into `avg`. May exceed
    /// `ratings.len()` while an external aggregate awaits its review
    /// bodies.
    #[serde(default)]
    pub user_total: usize,
    #[serde(default)]
    pub picture: PictureStatus,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// Whether a street-level image exists for the restaurant. Starts out
/// unknown and settles after the first external check.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PictureStatus {
    #[default]
    Unknown,
    Available,
    Missing,
}

impl PictureStatus {
    pub fn known(self) -> Option<bool> {
        match self {
            PictureStatus::Unknown => None,
            PictureStatus::Available => Some(true),
            PictureStatus::Missing => Some(false),
        }
    }

    pub fn from_exists(exists: bool) -> Self {
        if exists {
            PictureStatus::Available
        } else {
            PictureStatus::Missing
        }
    }
}

/// A user-submitted restaurant before the engine assigns its id.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct NewRestaurant {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Restaurant {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::EmptyName);
        }
        self.location.validate()?;
        for rating in &self.ratings {
            rating.validate()?;
        }
        Ok(())
    }
}

impl Location {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(EngineError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant() -> Restaurant {
        Restaurant {
            place_id: "1".to_string(),
            name: "Chez Paulette".to_string(),
            address: "12 rue des Martyrs, Paris".to_string(),
            location: Location {
                lat: 48.853,
                lng: 2.349,
            },
            ratings: Vec::new(),
            avg: 0.0,
            user_total: 0,
            picture: PictureStatus::Unknown,
        }
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut r = restaurant();
        r.location.lat = 95.0;
        assert!(matches!(
            r.validate(),
            Err(EngineError::InvalidCoordinates { .. })
        ));

        r.location.lat = 48.853;
        r.location.lng = -181.0;
        assert!(r.validate().is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut r = restaurant();
        r.name = "   ".to_string();
        assert!(matches!(r.validate(), Err(EngineError::EmptyName)));
    }

    #[test]
    fn picture_status_settles_from_lookup_result() {
        assert_eq!(PictureStatus::Unknown.known(), None);
        assert_eq!(PictureStatus::from_exists(true).known(), Some(true));
        assert_eq!(PictureStatus::from_exists(false).known(), Some(false));
    }
}
