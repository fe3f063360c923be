use thiserror::Error;

/// Failures the engine surfaces to its callers. External lookup failures
/// never appear here, they are recovered at the collaborator seam with a
/// fallback value.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no restaurant found for place_id: {place_id}")]
    NotFound { place_id: String },

    #[error("rating stars must be between 1 and 5, got: {stars}")]
    InvalidStars { stars: u8 },

    #[error("coordinates outside the valid geographic range: lat {lat}, lng {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("restaurant name must not be empty")]
    EmptyName,
}
