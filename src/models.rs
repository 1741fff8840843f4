use crate::geo::Coordinate;
use crate::markup::strip_html;
use serde::Deserialize;

/// One maneuver of the active route, as shown in the step list.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    /// Position in the route, 0-based and contiguous.
    pub id: usize,
    /// Plain-text instruction with markup removed.
    pub instruction: String,
    pub distance_text: String,
    pub duration_text: String,
    pub start: Coordinate,
}

/// A resolved place: where it is and how the service names it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub coordinate: Coordinate,
    pub formatted_address: String,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub description: String,
    pub place_id: String,
}

// Google Maps web service payloads. Only the fields we read are modelled;
// serde ignores the rest.

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<LatLng> for Coordinate {
    fn from(p: LatLng) -> Self {
        Coordinate::new(p.lat, p.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct EncodedPolyline {
    #[serde(default)]
    pub points: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsRoute {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub overview_polyline: EncodedPolyline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub distance: TextValue,
    #[serde(default)]
    pub duration: TextValue,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// The web service calls this `html_instructions`, the JS client `instructions`.
    #[serde(alias = "instructions", default)]
    pub html_instructions: String,
    #[serde(default)]
    pub distance: TextValue,
    #[serde(default)]
    pub duration: TextValue,
    pub start_location: LatLng,
    pub end_location: LatLng,
}

impl DirectionsRoute {
    /// Flattens every leg's steps into the numbered list the tracker works on.
    pub fn route_steps(&self) -> Vec<RouteStep> {
        self.legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .enumerate()
            .map(|(id, step)| RouteStep {
                id,
                instruction: strip_html(&step.html_instructions),
                distance_text: step.distance.text.clone(),
                duration_text: step.duration.text.clone(),
                start: step.start_location.into(),
            })
            .collect()
    }

    /// Step endpoints in travel order, for drawing when no overview polyline is usable.
    pub fn step_path(&self) -> Vec<Coordinate> {
        let steps: Vec<&Step> = self.legs.iter().flat_map(|leg| leg.steps.iter()).collect();
        let mut path: Vec<Coordinate> = steps.iter().map(|s| s.start_location.into()).collect();
        if let Some(last) = steps.last() {
            path.push(last.end_location.into());
        }
        path
    }

    /// Total distance and duration text of the first leg, e.g. `("12.3 km", "18 mins")`.
    pub fn headline(&self) -> Option<(&str, &str)> {
        self.legs
            .first()
            .map(|leg| (leg.distance.text.as_str(), leg.duration.text.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    pub result: Option<PlaceDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

impl PlaceDetails {
    /// A place only counts as resolved when it has a location.
    pub fn into_search_result(self) -> Option<SearchResult> {
        let geometry = self.geometry?;
        let formatted_address = self.formatted_address.or(self.name)?;
        Some(SearchResult {
            coordinate: geometry.location.into(),
            formatted_address,
        })
    }
}
