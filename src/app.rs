//! Widget state and its transitions.
//!
//! All state lives in [`App`] and only changes through the named
//! transitions below. Anything that needs the network is handed back to the
//! caller as a [`Command`]; its response comes back later as an
//! [`Event`] carrying the command's sequence number, and responses to
//! superseded requests are dropped.

use crate::config::Config;
use crate::error::{ApiError, NavError};
use crate::events::Event;
use crate::geo::Coordinate;
use crate::models::{DirectionsRoute, Prediction, RouteStep, SearchResult};
use crate::polyline;
use crate::tracker::TrackingState;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Which text input a place lookup belongs to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlaceTarget {
    Search,
    Origin,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing(PlaceTarget),
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Autocomplete {
        seq: u64,
        target: PlaceTarget,
        input: String,
    },
    ResolvePlace {
        seq: u64,
        target: PlaceTarget,
        place_id: String,
    },
    Directions {
        seq: u64,
        origin: String,
        destination: String,
    },
}

/// The route currently on screen.
#[derive(Debug, Clone)]
pub struct ActiveRoute {
    pub raw: DirectionsRoute,
    /// Path drawn on the map.
    pub overlay: Vec<Coordinate>,
}

impl ActiveRoute {
    fn new(raw: DirectionsRoute) -> Self {
        let overlay = match polyline::decode(&raw.overview_polyline.points) {
            Some(path) if path.len() >= 2 => path,
            _ => {
                debug!("Overview polyline unusable, drawing step endpoints");
                raw.step_path()
            }
        };
        Self { raw, overlay }
    }
}

/// Latest request number issued per kind of request.
///
/// Place lookups are tracked per input so a search and an origin lookup in
/// flight at the same time don't supersede each other.
#[derive(Debug, Default)]
struct Requests {
    next: u64,
    autocomplete: [u64; 2],
    place: [u64; 2],
    directions: u64,
}

impl Requests {
    fn issue(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl PlaceTarget {
    fn slot(self) -> usize {
        match self {
            PlaceTarget::Search => 0,
            PlaceTarget::Origin => 1,
        }
    }
}

/// A text input backed by place autocomplete.
#[derive(Debug, Default)]
pub struct PlaceInput {
    pub text: String,
    pub predictions: Vec<Prediction>,
    pub selected: usize,
    /// When the pending autocomplete request should fire.
    due: Option<Instant>,
}

impl PlaceInput {
    fn clear(&mut self) {
        self.text.clear();
        self.predictions.clear();
        self.selected = 0;
        self.due = None;
    }

    pub fn selected_prediction(&self) -> Option<&Prediction> {
        self.predictions.get(self.selected)
    }
}

pub struct App {
    pub config: Config,
    pub should_quit: bool,
    pub tick_count: usize,
    pub mode: InputMode,
    /// A maps client exists; without one no lookups are possible.
    pub maps_ready: bool,

    pub search_input: PlaceInput,
    pub origin_input: PlaceInput,

    pub search_result: Option<SearchResult>,
    pub destination: String,
    /// Directions origin: live location as `"lat,lng"` unless overridden.
    pub origin: String,
    pub origin_overridden: bool,
    pub show_directions_input: bool,

    pub route: Option<ActiveRoute>,
    pub steps: Vec<RouteStep>,
    pub tracking: TrackingState,

    /// Blocking notice; keys other than Enter/Esc are ignored while set.
    pub notice: Option<String>,
    pub last_fix: Option<DateTime<Local>>,
    pub directions_pending: bool,
    requests: Requests,
}

impl App {
    pub fn new(config: Config, maps_ready: bool) -> Self {
        Self {
            config,
            should_quit: false,
            tick_count: 0,
            mode: InputMode::Normal,
            maps_ready,
            search_input: PlaceInput::default(),
            origin_input: PlaceInput::default(),
            search_result: None,
            destination: String::new(),
            origin: String::new(),
            origin_overridden: false,
            show_directions_input: false,
            route: None,
            steps: Vec::new(),
            tracking: TrackingState::default(),
            notice: None,
            last_fix: None,
            directions_pending: false,
            requests: Requests::default(),
        }
    }

    /// Applies one event and returns the commands it produced.
    pub fn handle_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Tick => {
                self.on_tick();
                self.poll_autocomplete(Instant::now()).into_iter().collect()
            }
            Event::Input(key) => self.handle_key(key).into_iter().collect(),
            Event::LocationUpdate(fix) => {
                self.on_location_update(fix);
                Vec::new()
            }
            Event::LocationError(reason) => {
                self.on_location_error(&reason);
                Vec::new()
            }
            Event::Predictions { seq, target, result } => {
                self.on_predictions(seq, target, result);
                Vec::new()
            }
            Event::PlaceResolved { seq, target, result } => {
                self.on_place_resolved(seq, target, result);
                Vec::new()
            }
            Event::DirectionsReceived { seq, result } => {
                if let Err(e) = self.on_directions_received(seq, result) {
                    self.notify(e);
                }
                Vec::new()
            }
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    fn notify(&mut self, err: NavError) {
        info!("Notice: {}", err);
        self.notice = Some(err.to_string());
    }

    fn input_mut(&mut self, target: PlaceTarget) -> &mut PlaceInput {
        match target {
            PlaceTarget::Search => &mut self.search_input,
            PlaceTarget::Origin => &mut self.origin_input,
        }
    }

    // --- Location watcher -------------------------------------------------

    pub fn on_location_update(&mut self, fix: Coordinate) {
        self.tracking.update(fix, &self.steps);
        self.last_fix = Some(Local::now());
        if !self.origin_overridden {
            self.origin = fix.to_string();
        }
    }

    /// Location went away. Tracking stops quietly; the user gets no notice.
    ///
    /// A live origin goes with the fix; an overridden one is kept.
    pub fn on_location_error(&mut self, reason: &str) {
        warn!("Location access denied or unavailable: {}", reason);
        self.tracking.lose_fix();
        if !self.origin_overridden {
            self.origin.clear();
        }
    }

    // --- Place search adapter --------------------------------------------

    /// Commits a resolved search. `None` means nothing was resolved.
    ///
    /// A new search invalidates the active route and any directions request
    /// still in flight.
    pub fn on_search(&mut self, place: Option<SearchResult>) -> Result<(), NavError> {
        let place = place.ok_or(NavError::NoPlaceSelected)?;

        info!("Search resolved to {}", place.formatted_address);
        self.destination = place.formatted_address.clone();
        self.search_result = Some(place);
        self.show_directions_input = false;
        self.clear_route();
        self.requests.directions = self.requests.issue();
        self.directions_pending = false;
        Ok(())
    }

    fn clear_route(&mut self) {
        self.route = None;
        self.steps.clear();
        self.tracking.current_step = None;
    }

    /// Queues an autocomplete lookup for the edited input once typing pauses.
    fn schedule_autocomplete(&mut self, target: PlaceTarget) {
        let debounce = Duration::from_millis(self.config.ui.autocomplete_debounce_ms);
        let input = self.input_mut(target);
        if input.text.trim().is_empty() {
            input.predictions.clear();
            input.selected = 0;
            input.due = None;
        } else {
            input.due = Some(Instant::now() + debounce);
        }
    }

    /// Fires the debounced autocomplete request for the input being edited.
    pub fn poll_autocomplete(&mut self, now: Instant) -> Option<Command> {
        let InputMode::Editing(target) = self.mode else {
            return None;
        };
        let maps_ready = self.maps_ready;
        let input = self.input_mut(target);
        match input.due {
            Some(due) if due <= now => input.due = None,
            _ => return None,
        }
        if !maps_ready {
            return None;
        }
        let text = input.text.trim().to_string();

        let seq = self.requests.issue();
        self.requests.autocomplete[target.slot()] = seq;
        Some(Command::Autocomplete { seq, target, input: text })
    }

    pub fn on_predictions(&mut self, seq: u64, target: PlaceTarget, result: Result<Vec<Prediction>, ApiError>) {
        if seq != self.requests.autocomplete[target.slot()] {
            debug!("Dropping stale autocomplete response {}", seq);
            return;
        }
        match result {
            Ok(predictions) => {
                let input = self.input_mut(target);
                input.predictions = predictions;
                input.selected = 0;
            }
            Err(e) => error!("Autocomplete failed: {}", e),
        }
    }

    /// Resolves the highlighted suggestion of `target`.
    fn resolve_selection(&mut self, target: PlaceTarget) -> Result<Option<Command>, NavError> {
        let place_id = self.input_mut(target).selected_prediction().map(|p| p.place_id.clone());

        match (target, place_id) {
            (_, Some(place_id)) => {
                if !self.maps_ready {
                    return Err(NavError::MapsUnavailable);
                }
                let seq = self.requests.issue();
                self.requests.place[target.slot()] = seq;
                Ok(Some(Command::ResolvePlace { seq, target, place_id }))
            }
            (PlaceTarget::Search, None) => self.on_search(None).map(|_| None),
            // Origin keeps its previous value when nothing was picked.
            (PlaceTarget::Origin, None) => Ok(None),
        }
    }

    pub fn on_place_resolved(&mut self, seq: u64, target: PlaceTarget, result: Result<SearchResult, ApiError>) {
        if seq != self.requests.place[target.slot()] {
            debug!("Dropping stale place response {}", seq);
            return;
        }
        let place = result
            .map_err(|e| error!("Place lookup failed: {}", e))
            .ok();

        match target {
            PlaceTarget::Search => {
                if let Err(e) = self.on_search(place) {
                    self.notify(e);
                }
            }
            PlaceTarget::Origin => {
                if let Some(place) = place {
                    self.set_origin_override(place.formatted_address);
                }
            }
        }
    }

    pub fn set_origin_override(&mut self, origin: String) {
        info!("Origin overridden: {}", origin);
        self.origin = origin;
        self.origin_overridden = true;
    }

    /// Goes back to using the live location as the origin.
    pub fn reset_origin(&mut self) {
        self.origin_overridden = false;
        self.origin_input.clear();
        self.origin = self
            .tracking
            .current_location
            .map(|fix| fix.to_string())
            .unwrap_or_default();
    }

    // --- Directions adapter ----------------------------------------------

    pub fn open_directions(&mut self) -> Result<(), NavError> {
        if self.search_result.is_none() {
            return Err(NavError::NoSearchResult);
        }
        self.show_directions_input = true;
        Ok(())
    }

    /// Validates the endpoints and issues a directions request.
    ///
    /// On error nothing is requested and no state changes.
    pub fn request_directions(&mut self) -> Result<Command, NavError> {
        let origin = self.origin.trim().to_string();
        let destination = self.destination.trim().to_string();
        if origin.is_empty() || destination.is_empty() {
            return Err(NavError::MissingEndpoints);
        }
        if !self.maps_ready {
            return Err(NavError::MapsUnavailable);
        }

        let seq = self.requests.issue();
        self.requests.directions = seq;
        self.directions_pending = true;
        info!("Requesting directions #{}", seq);
        Ok(Command::Directions { seq, origin, destination })
    }

    /// Commits a directions response, or reports why it can't be used.
    ///
    /// Responses to anything but the latest request are ignored.
    pub fn on_directions_received(
        &mut self,
        seq: u64,
        result: Result<DirectionsRoute, ApiError>,
    ) -> Result<(), NavError> {
        if seq != self.requests.directions {
            debug!("Dropping stale directions response {}", seq);
            return Ok(());
        }
        self.directions_pending = false;

        let raw = result.map_err(|e| {
            error!("Directions request failed: {}", e);
            NavError::DirectionsFailed
        })?;

        self.steps = raw.route_steps();
        info!("Route '{}' with {} steps", raw.summary, self.steps.len());
        self.route = Some(ActiveRoute::new(raw));
        self.tracking.retrack(&self.steps);
        Ok(())
    }

    // --- Keys --------------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.notice = None;
            }
            return None;
        }

        let result = match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Editing(target) => self.handle_editing_key(target, key),
        };

        match result {
            Ok(command) => command,
            Err(e) => {
                self.notify(e);
                None
            }
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<Option<Command>, NavError> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') | KeyCode::Char('s') => self.mode = InputMode::Editing(PlaceTarget::Search),
            KeyCode::Char('d') => self.open_directions()?,
            KeyCode::Char('o') if self.show_directions_input => {
                self.mode = InputMode::Editing(PlaceTarget::Origin)
            }
            KeyCode::Char('r') if self.show_directions_input => self.reset_origin(),
            KeyCode::Char('g') | KeyCode::Enter if self.show_directions_input => {
                return self.request_directions().map(Some)
            }
            _ => {}
        }
        Ok(None)
    }

    fn handle_editing_key(&mut self, target: PlaceTarget, key: KeyEvent) -> Result<Option<Command>, NavError> {
        match key.code {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                return self.resolve_selection(target);
            }
            KeyCode::Down => {
                let input = self.input_mut(target);
                if !input.predictions.is_empty() {
                    input.selected = (input.selected + 1) % input.predictions.len();
                }
            }
            KeyCode::Up => {
                let input = self.input_mut(target);
                if !input.predictions.is_empty() {
                    input.selected = input.selected.checked_sub(1).unwrap_or(input.predictions.len() - 1);
                }
            }
            KeyCode::Backspace => {
                self.input_mut(target).text.pop();
                self.schedule_autocomplete(target);
            }
            KeyCode::Char(c) => {
                self.input_mut(target).text.push(c);
                self.schedule_autocomplete(target);
            }
            _ => {}
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::parse_directions;

    const M: f64 = 1.0 / 111_195.0;

    fn app() -> App {
        App::new(Config::default(), true)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn place(name: &str, lat: f64, lng: f64) -> SearchResult {
        SearchResult {
            coordinate: Coordinate::new(lat, lng),
            formatted_address: name.to_string(),
        }
    }

    fn route_json(lats: &[f64]) -> String {
        let steps: Vec<String> = lats
            .iter()
            .enumerate()
            .map(|(i, lat)| {
                format!(
                    r#"{{ "html_instructions": "<b>Step {i}</b>",
                        "distance": {{ "text": "{i}0 m", "value": 10 }},
                        "duration": {{ "text": "1 min", "value": 60 }},
                        "start_location": {{ "lat": {lat}, "lng": 139.0 }},
                        "end_location": {{ "lat": {lat}, "lng": 139.001 }} }}"#
                )
            })
            .collect();
        format!(
            r#"{{ "status": "OK", "routes": [{{ "summary": "test", "overview_polyline": {{ "points": "" }},
                "legs": [{{ "start_location": {{ "lat": 0, "lng": 0 }}, "end_location": {{ "lat": 0, "lng": 0 }},
                "steps": [{}] }}] }}] }}"#,
            steps.join(",")
        )
    }

    fn route(lats: &[f64]) -> DirectionsRoute {
        parse_directions(&route_json(lats)).expect("test route parses")
    }

    /// Search, open directions and request them; returns the request number.
    fn request(app: &mut App) -> u64 {
        app.on_search(Some(place("Ginza", 35.67, 139.76))).expect("search");
        app.open_directions().expect("open");
        match app.request_directions().expect("valid request") {
            Command::Directions { seq, .. } => seq,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_without_place_is_rejected() {
        let mut app = app();
        app.on_search(Some(place("Ueno", 35.71, 139.77))).expect("first search");
        assert_eq!(app.on_search(None), Err(NavError::NoPlaceSelected));
        assert_eq!(app.destination, "Ueno");
        assert!(app.search_result.is_some());
    }

    #[test]
    fn new_search_clears_active_route() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.on_directions_received(seq, Ok(route(&[35.0, 35.001]))).expect("ok");
        assert_eq!(app.steps.len(), 2);
        assert_eq!(app.tracking.current_step, Some(0));

        app.on_search(Some(place("Asakusa", 35.71, 139.79))).expect("search");
        assert!(app.route.is_none());
        assert!(app.steps.is_empty());
        assert_eq!(app.tracking.current_step, None);
        assert!(!app.show_directions_input);
        assert_eq!(app.destination, "Asakusa");
        assert_eq!(app.search_result.as_ref().map(|p| p.formatted_address.as_str()), Some("Asakusa"));
    }

    #[test]
    fn empty_destination_makes_no_request() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        assert!(!app.origin.is_empty());
        assert_eq!(app.request_directions(), Err(NavError::MissingEndpoints));
        assert!(!app.directions_pending);
    }

    #[test]
    fn empty_origin_makes_no_request() {
        let mut app = app();
        app.on_search(Some(place("Ginza", 35.67, 139.76))).expect("search");
        assert_eq!(app.request_directions(), Err(NavError::MissingEndpoints));
    }

    #[test]
    fn unavailable_maps_makes_no_request() {
        let mut app = App::new(Config::default(), false);
        app.on_location_update(Coordinate::new(35.0, 139.0));
        app.on_search(Some(place("Ginza", 35.67, 139.76))).expect("search");
        assert_eq!(app.request_directions(), Err(NavError::MapsUnavailable));
        assert!(!app.directions_pending);
    }

    #[test]
    fn directions_request_uses_live_origin() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.5, 139.5));
        app.on_search(Some(place("Ginza", 35.67, 139.76))).expect("search");
        match app.request_directions() {
            Ok(Command::Directions { origin, destination, .. }) => {
                assert_eq!(origin, "35.5,139.5");
                assert_eq!(destination, "Ginza");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(app.directions_pending);
    }

    #[test]
    fn failed_directions_commit_nothing() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        let err = ApiError::Status { status: "NOT_FOUND".into(), message: None };
        assert_eq!(app.on_directions_received(seq, Err(err)), Err(NavError::DirectionsFailed));
        assert!(app.route.is_none());
        assert!(app.steps.is_empty());
        assert!(!app.directions_pending);
    }

    #[test]
    fn failed_directions_raise_notice_via_event() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.handle_event(Event::DirectionsReceived { seq, result: Err(ApiError::NoRoute) });
        assert_eq!(app.notice.as_deref(), Some("Error fetching directions"));

        // Blocking: other keys are swallowed until dismissed
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.should_quit);
        app.handle_key(key(KeyCode::Enter));
        assert!(app.notice.is_none());
    }

    #[test]
    fn stale_directions_response_is_ignored() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let first = request(&mut app);
        let second = match app.request_directions().expect("valid") {
            Command::Directions { seq, .. } => seq,
            other => panic!("unexpected {other:?}"),
        };
        assert_ne!(first, second);

        app.on_directions_received(second, Ok(route(&[35.0, 35.001, 35.002]))).expect("ok");
        app.on_directions_received(first, Ok(route(&[36.0]))).expect("ignored");
        assert_eq!(app.steps.len(), 3);
    }

    #[test]
    fn response_after_new_search_is_ignored() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.on_search(Some(place("Shibuya", 35.66, 139.70))).expect("search");
        app.on_directions_received(seq, Ok(route(&[35.0]))).expect("ignored");
        assert!(app.route.is_none());
    }

    #[test]
    fn received_route_tracks_current_step() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.on_directions_received(
            seq,
            Ok(route(&[35.0 + 10.0 * M, 35.0 + 60.0 * M, 35.0 - 5.0 * M])),
        )
        .expect("ok");
        assert_eq!(app.tracking.current_step, Some(2));

        let route = app.route.as_ref().expect("route stored");
        // Empty overview polyline falls back to step endpoints
        assert_eq!(route.overlay.len(), 4);
        assert_eq!(app.steps[0].instruction, "Step 0");
    }

    #[test]
    fn moving_away_clears_step() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.on_directions_received(seq, Ok(route(&[35.0]))).expect("ok");
        assert_eq!(app.tracking.current_step, Some(0));

        app.on_location_update(Coordinate::new(35.01, 139.0));
        assert_eq!(app.tracking.current_step, None);
    }

    #[test]
    fn location_error_degrades_quietly() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let seq = request(&mut app);
        app.on_directions_received(seq, Ok(route(&[35.0]))).expect("ok");

        app.handle_event(Event::LocationError("User denied Geolocation".into()));
        assert_eq!(app.tracking.current_location, None);
        assert_eq!(app.tracking.current_step, None);
        assert!(app.notice.is_none());
        assert_eq!(app.steps.len(), 1);
        assert!(app.origin.is_empty());
        assert_eq!(app.request_directions(), Err(NavError::MissingEndpoints));
    }

    #[test]
    fn location_error_keeps_overridden_origin() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        app.set_origin_override("Tokyo Station".into());
        app.on_location_error("timeout");
        assert_eq!(app.origin, "Tokyo Station");
    }

    fn resolve(app: &mut App, target: PlaceTarget, place_id: &str) -> u64 {
        app.input_mut(target).predictions = vec![Prediction { description: place_id.into(), place_id: place_id.into() }];
        match app.resolve_selection(target) {
            Ok(Some(Command::ResolvePlace { seq, .. })) => seq,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn origin_lookup_does_not_supersede_search_lookup() {
        let mut app = app();
        app.on_location_update(Coordinate::new(35.0, 139.0));
        let search = resolve(&mut app, PlaceTarget::Search, "kyoto");
        let origin = resolve(&mut app, PlaceTarget::Origin, "osaka");
        assert!(origin > search);

        app.on_place_resolved(search, PlaceTarget::Search, Ok(place("Kyoto Station", 34.98, 135.75)));
        assert_eq!(app.destination, "Kyoto Station");
        app.on_place_resolved(origin, PlaceTarget::Origin, Ok(place("Osaka Station", 34.70, 135.49)));
        assert_eq!(app.origin, "Osaka Station");
        assert_eq!(app.destination, "Kyoto Station");
    }

    #[test]
    fn newer_search_lookup_supersedes_older_one() {
        let mut app = app();
        let first = resolve(&mut app, PlaceTarget::Search, "a");
        let second = resolve(&mut app, PlaceTarget::Search, "b");
        app.on_place_resolved(second, PlaceTarget::Search, Ok(place("Nara", 34.68, 135.80)));
        app.on_place_resolved(first, PlaceTarget::Search, Ok(place("Kobe", 34.69, 135.19)));
        assert_eq!(app.destination, "Nara");
    }

    #[test]
    fn predictions_are_tracked_per_input() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('k')));
        let search = match app.poll_autocomplete(Instant::now() + Duration::from_secs(1)) {
            Some(Command::Autocomplete { seq, .. }) => seq,
            other => panic!("unexpected {other:?}"),
        };
        app.mode = InputMode::Editing(PlaceTarget::Origin);
        app.handle_key(key(KeyCode::Char('o')));
        let origin = match app.poll_autocomplete(Instant::now() + Duration::from_secs(1)) {
            Some(Command::Autocomplete { seq, .. }) => seq,
            other => panic!("unexpected {other:?}"),
        };
        assert!(origin > search);

        app.on_predictions(
            search,
            PlaceTarget::Search,
            Ok(vec![Prediction { description: "Kyoto".into(), place_id: "k".into() }]),
        );
        assert_eq!(app.search_input.predictions.len(), 1);
    }

    #[test]
    fn origin_follows_fix_until_overridden() {
        let mut app = app();
        app.on_location_update(Coordinate::new(1.0, 2.0));
        assert_eq!(app.origin, "1,2");

        app.set_origin_override("Shinagawa Station".into());
        app.on_location_update(Coordinate::new(3.0, 4.0));
        assert_eq!(app.origin, "Shinagawa Station");

        app.reset_origin();
        assert_eq!(app.origin, "3,4");
        app.on_location_update(Coordinate::new(5.0, 6.0));
        assert_eq!(app.origin, "5,6");
    }

    #[test]
    fn open_directions_needs_search() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.notice.as_deref(), Some("Please search for a location first."));
        assert!(!app.show_directions_input);
    }

    #[test]
    fn enter_without_suggestion_reports_missing_place() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.mode, InputMode::Editing(PlaceTarget::Search));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.notice.as_deref(), Some("Please enter a location to search."));
        assert_eq!(app.mode, InputMode::Normal);
    }

    #[test]
    fn typing_debounces_autocomplete() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        for c in "gin".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let now = Instant::now();
        assert_eq!(app.poll_autocomplete(now), None);

        let later = now + Duration::from_secs(1);
        match app.poll_autocomplete(later) {
            Some(Command::Autocomplete { target, input, .. }) => {
                assert_eq!(target, PlaceTarget::Search);
                assert_eq!(input, "gin");
            }
            other => panic!("unexpected {other:?}"),
        }
        // Fires once per pause
        assert_eq!(app.poll_autocomplete(later), None);
    }

    #[test]
    fn selecting_prediction_resolves_place() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('g')));
        let seq = match app.poll_autocomplete(Instant::now() + Duration::from_secs(1)) {
            Some(Command::Autocomplete { seq, .. }) => seq,
            other => panic!("unexpected {other:?}"),
        };
        app.on_predictions(
            seq,
            PlaceTarget::Search,
            Ok(vec![
                Prediction { description: "Ginza".into(), place_id: "a".into() },
                Prediction { description: "Gion".into(), place_id: "b".into() },
            ]),
        );
        app.handle_key(key(KeyCode::Down));
        let command = app.handle_key(key(KeyCode::Enter));
        let seq = match command {
            Some(Command::ResolvePlace { seq, target, place_id }) => {
                assert_eq!(target, PlaceTarget::Search);
                assert_eq!(place_id, "b");
                seq
            }
            other => panic!("unexpected {other:?}"),
        };

        app.on_place_resolved(seq, PlaceTarget::Search, Ok(place("Gion, Kyoto", 35.0, 135.77)));
        assert_eq!(app.destination, "Gion, Kyoto");
        assert!(app.notice.is_none());
    }

    #[test]
    fn failed_place_lookup_reports_missing_place() {
        let mut app = app();
        app.requests.place[PlaceTarget::Search.slot()] = 7;
        app.on_place_resolved(7, PlaceTarget::Search, Err(ApiError::NoRoute));
        assert_eq!(app.notice.as_deref(), Some("Please enter a location to search."));
        assert!(app.search_result.is_none());
    }

    #[test]
    fn origin_lookup_overrides_origin() {
        let mut app = app();
        app.on_location_update(Coordinate::new(1.0, 2.0));
        app.requests.place[PlaceTarget::Origin.slot()] = 3;
        app.on_place_resolved(3, PlaceTarget::Origin, Ok(place("Tokyo Station", 35.68, 139.76)));
        assert_eq!(app.origin, "Tokyo Station");
        assert!(app.origin_overridden);

        // Failed origin lookups keep the previous origin
        app.requests.place[PlaceTarget::Origin.slot()] = 4;
        app.on_place_resolved(4, PlaceTarget::Origin, Err(ApiError::NoRoute));
        assert_eq!(app.origin, "Tokyo Station");
    }

    #[test]
    fn stale_predictions_are_dropped() {
        let mut app = app();
        app.requests.autocomplete[PlaceTarget::Search.slot()] = 5;
        app.on_predictions(
            4,
            PlaceTarget::Search,
            Ok(vec![Prediction { description: "old".into(), place_id: "x".into() }]),
        );
        assert!(app.search_input.predictions.is_empty());
    }
}
