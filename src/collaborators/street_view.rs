use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resolves whether a street-level image exists for a coordinate.
#[async_trait]
pub trait PictureLookup: Send + Sync {
    async fn exists(&self, lat: f64, lng: f64) -> anyhow::Result<bool>;
}

const STREET_VIEW_METADATA_URL: &str = "https://maps.googleapis.com/maps/api/streetview/metadata";

/// Street View Image Metadata client. Only existence is checked here, the
/// image URL itself is assembled client side.
pub struct StreetViewLookup {
    client: reqwest::Client,
    api_key: String,
}

impl StreetViewLookup {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
struct MetadataResponse {
    status: String,
}

#[async_trait]
impl PictureLookup for StreetViewLookup {
    async fn exists(&self, lat: f64, lng: f64) -> anyhow::Result<bool> {
        let response = self
            .client
            .get(STREET_VIEW_METADATA_URL)
            .query(&[
                ("location", format!("{},{}", lat, lng)),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .json::<MetadataResponse>()
            .await?;

        Ok(response.status == "OK")
    }
}
