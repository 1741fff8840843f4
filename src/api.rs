//! Client for the Google Maps web services the widget consumes:
//! Places Autocomplete, Place Details and Directions.
//!
//! Network calls live on [`MapsClient`]; turning a response body into our
//! types is done by the free `parse_*` functions so it can be tested
//! without a network.

use crate::config::MapsConfig;
use crate::error::ApiError;
use crate::models::{
    AutocompleteResponse, DirectionsResponse, DirectionsRoute, PlaceDetailsResponse, Prediction,
    SearchResult,
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Travel mode sent with every directions request.
pub const TRAVEL_MODE: &str = "driving";

#[derive(Clone)]
pub struct MapsClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl std::fmt::Debug for MapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keep the key out of logs.
        f.debug_struct("MapsClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl MapsClient {
    /// Builds a client, failing when no API key is configured.
    pub fn from_config(config: &MapsConfig) -> Result<Self, ApiError> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        let url = format!("{}/{}", self.base_url, path);
        let body = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str()), ("language", self.language.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(path, bytes = body.len(), "Maps response received");
        Ok(body)
    }

    /// Suggestions for partially typed text.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<Prediction>, ApiError> {
        let body = self.get("place/autocomplete/json", &[("input", input)]).await?;
        parse_autocomplete(&body)
    }

    /// Resolves a selected suggestion to a coordinate and formatted address.
    #[instrument(skip(self))]
    pub async fn place_details(&self, place_id: &str) -> Result<SearchResult, ApiError> {
        let body = self
            .get(
                "place/details/json",
                &[("place_id", place_id), ("fields", "formatted_address,name,geometry")],
            )
            .await?;
        parse_place_details(&body)
    }

    /// Driving directions from `origin` to `destination`.
    ///
    /// Either end may be an address or a `"lat,lng"` string.
    #[instrument(skip(self))]
    pub async fn directions(&self, origin: &str, destination: &str) -> Result<DirectionsRoute, ApiError> {
        let body = self
            .get(
                "directions/json",
                &[("origin", origin), ("destination", destination), ("mode", TRAVEL_MODE)],
            )
            .await?;
        parse_directions(&body)
    }
}

fn check_status(status: &str, message: Option<String>, allowed: &[&str]) -> Result<(), ApiError> {
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Status {
            status: status.to_string(),
            message,
        })
    }
}

pub fn parse_autocomplete(body: &str) -> Result<Vec<Prediction>, ApiError> {
    let res: AutocompleteResponse = serde_json::from_str(body)?;
    check_status(&res.status, res.error_message, &["OK", "ZERO_RESULTS"])?;
    Ok(res.predictions)
}

pub fn parse_place_details(body: &str) -> Result<SearchResult, ApiError> {
    let res: PlaceDetailsResponse = serde_json::from_str(body)?;
    check_status(&res.status, res.error_message, &["OK"])?;
    res.result
        .and_then(|details| details.into_search_result())
        .ok_or_else(|| ApiError::Status {
            status: "NOT_FOUND".to_string(),
            message: Some("place has no location".to_string()),
        })
}

/// The first route of a directions response.
pub fn parse_directions(body: &str) -> Result<DirectionsRoute, ApiError> {
    let res: DirectionsResponse = serde_json::from_str(body)?;
    check_status(&res.status, res.error_message, &["OK"])?;
    res.routes.into_iter().next().ok_or(ApiError::NoRoute)
}
