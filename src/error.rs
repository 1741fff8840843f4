use thiserror::Error;

/// Failures reported to the user as a blocking notice.
///
/// The `Display` text is exactly what the notice shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavError {
    #[error("Please enter a location to search.")]
    NoPlaceSelected,
    #[error("Please search for a location first.")]
    NoSearchResult,
    #[error("Please enter both origin and destination.")]
    MissingEndpoints,
    #[error("Google Maps API not loaded yet!")]
    MapsUnavailable,
    #[error("Error fetching directions")]
    DirectionsFailed,
}

/// Errors from the Google Maps web services.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Service returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        status: String,
        message: Option<String>,
    },
    #[error("No route between origin and destination")]
    NoRoute,
    #[error("No Google Maps API key configured")]
    MissingApiKey,
}
