use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Overrides `maps.api_key` when set and non-empty.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub maps: MapsConfig,
    pub location: LocationConfig,
    pub ui: UiConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub language: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Approximate location from IP geolocation
    Ip,
    /// Always report `manual_lat`/`manual_lon`
    Fixed,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub source: LocationSource,
    pub manual_lat: f64,
    pub manual_lon: f64,
    pub poll_interval_seconds: u64,
    /// Address to geolocate; empty means the address this machine is seen from.
    pub lookup_ip: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    /// Height of the map viewport in degrees of latitude when not fitted to a route.
    pub map_span_degrees: f64,
    pub autocomplete_debounce_ms: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            timeout_seconds: 10,
            language: "en".to_string(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: LocationSource::Ip,
            manual_lat: 35.6812,
            manual_lon: 139.7671,
            poll_interval_seconds: 5,
            lookup_ip: String::new(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 150,
            map_span_degrees: 0.05,
            autocomplete_debounce_ms: 300,
        }
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        let config_path = "config.toml";

        let mut config = match fs::read_to_string(config_path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                warn!("Failed to parse config.toml: {}. Using defaults.", e);
                Config::default()
            }),
            Err(_) => {
                let default_config = Config::default();
                // Save default config to disk for the user to edit later
                match toml::to_string_pretty(&default_config) {
                    Ok(toml_string) => {
                        if fs::write(config_path, toml_string).is_err() {
                            warn!("Could not write default config.toml to disk.");
                        }
                    }
                    Err(e) => warn!("Could not serialize default config: {}", e),
                }
                info!("Loaded default configuration.");
                default_config
            }
        };

        config.apply_env(std::env::var(API_KEY_ENV).ok());
        config
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            info!("Using API key from {}", API_KEY_ENV);
            self.maps.api_key = key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).expect("serializable");
        assert_eq!(Config::parse(&text).expect("parses"), Config::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config = Config::parse(
            r#"
            [location]
            source = "fixed"
            manual_lat = 48.85
            "#,
        )
        .expect("parses");
        assert_eq!(config.location.source, LocationSource::Fixed);
        assert_eq!(config.location.manual_lat, 48.85);
        assert_eq!(config.location.manual_lon, LocationConfig::default().manual_lon);
        assert_eq!(config.maps, MapsConfig::default());
        assert_eq!(config.ui.tick_rate_ms, 150);
    }

    #[test]
    fn unknown_source_is_an_error() {
        assert!(Config::parse("[location]\nsource = \"gps\"\n").is_err());
    }

    #[test]
    fn env_key_overrides_file() {
        let mut config = Config::default();
        config.maps.api_key = "from-file".into();

        config.apply_env(Some("  ".into()));
        assert_eq!(config.maps.api_key, "from-file");

        config.apply_env(Some("from-env".into()));
        assert_eq!(config.maps.api_key, "from-env");
    }
}
