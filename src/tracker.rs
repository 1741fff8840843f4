//! Live step matching.
//!
//! On every location fix the whole step list is rescanned, so the index can
//! move backwards as well as forwards.

use crate::geo::Coordinate;
use crate::models::RouteStep;

/// A fix closer than this to a step's start counts as being at that step.
pub const PROXIMITY_THRESHOLD_M: f64 = 50.0;

/// Index of the step whose start is nearest to `location`, if any is within
/// [`PROXIMITY_THRESHOLD_M`]. The earliest step wins ties.
pub fn nearest_step(location: Coordinate, steps: &[RouteStep]) -> Option<usize> {
    let mut closest = None;
    let mut min_distance = f64::INFINITY;

    for (index, step) in steps.iter().enumerate() {
        let distance = location.distance_to(&step.start);
        if distance < min_distance && distance < PROXIMITY_THRESHOLD_M {
            min_distance = distance;
            closest = Some(index);
        }
    }

    closest
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackingState {
    pub current_location: Option<Coordinate>,
    pub current_step: Option<usize>,
}

impl TrackingState {
    /// Records a fix and recomputes the current step from scratch.
    pub fn update(&mut self, location: Coordinate, steps: &[RouteStep]) {
        self.current_location = Some(location);
        self.current_step = nearest_step(location, steps);
    }

    /// Re-evaluates the current step after the step list changed.
    pub fn retrack(&mut self, steps: &[RouteStep]) {
        self.current_step = self
            .current_location
            .and_then(|location| nearest_step(location, steps));
    }

    /// Location became unavailable; step highlighting stops.
    pub fn lose_fix(&mut self) {
        self.current_location = None;
        self.current_step = None;
    }
}
