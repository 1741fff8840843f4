//! Continuous location updates for the widget.
//!
//! A [`LocationProvider`] starts a background task that posts
//! [`Event::LocationUpdate`] or [`Event::LocationError`] into the event
//! channel. The task belongs to the returned [`LocationSubscription`] and is
//! stopped exactly once, either by [`LocationSubscription::cancel`] or when
//! the subscription is dropped.

use crate::config::{LocationConfig, LocationSource};
use crate::events::Event;
use crate::geo::Coordinate;
use ipgeolocate::{Locator, Service};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub trait LocationProvider {
    /// Starts delivering fixes to `tx` until the subscription is released.
    fn subscribe(&self, tx: UnboundedSender<Event>) -> LocationSubscription;
}

/// Handle to a running location task.
#[must_use = "dropping the subscription stops location updates"]
pub struct LocationSubscription {
    task: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    pub fn new(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the location task.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Location subscription released");
        }
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Approximate location from IP geolocation (ip-api).
pub struct IpLocationProvider {
    lookup_ip: String,
    interval: Duration,
}

impl IpLocationProvider {
    pub fn new(lookup_ip: impl Into<String>, interval: Duration) -> Self {
        Self {
            lookup_ip: lookup_ip.into(),
            interval,
        }
    }
}

impl LocationProvider for IpLocationProvider {
    fn subscribe(&self, tx: UnboundedSender<Event>) -> LocationSubscription {
        let lookup_ip = self.lookup_ip.clone();
        let interval = self.interval;

        let task = tokio::spawn(async move {
            loop {
                let event = match Locator::get(&lookup_ip, Service::IpApi).await {
                    Ok(loc) => match parse_fix(&loc.latitude, &loc.longitude) {
                        Some(fix) => {
                            debug!("Geolocation fix ({}, {}) near {}", fix.lat, fix.lng, loc.city);
                            Event::LocationUpdate(fix)
                        }
                        None => Event::LocationError(format!(
                            "unreadable coordinates ({}, {})",
                            loc.latitude, loc.longitude
                        )),
                    },
                    Err(e) => Event::LocationError(format!("geolocation service: {}", e)),
                };
                if tx.send(event).is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        info!("Subscribed to IP geolocation every {:?}", self.interval);
        LocationSubscription::new(task)
    }
}

/// Reports the same configured coordinate on every interval.
pub struct FixedLocationProvider {
    position: Coordinate,
    interval: Duration,
}

impl FixedLocationProvider {
    pub fn new(position: Coordinate, interval: Duration) -> Self {
        Self { position, interval }
    }
}

impl LocationProvider for FixedLocationProvider {
    fn subscribe(&self, tx: UnboundedSender<Event>) -> LocationSubscription {
        let position = self.position;
        let interval = self.interval;

        let task = tokio::spawn(async move {
            loop {
                if tx.send(Event::LocationUpdate(position)).is_err() {
                    break;
                }
                tokio::time::sleep(interval).await;
            }
        });

        info!("Using fixed location ({}, {})", position.lat, position.lng);
        LocationSubscription::new(task)
    }
}

/// Picks the provider named by the `[location]` config section.
pub fn from_config(config: &LocationConfig) -> Box<dyn LocationProvider> {
    let interval = Duration::from_secs(config.poll_interval_seconds.max(1));
    match config.source {
        LocationSource::Ip => Box::new(IpLocationProvider::new(config.lookup_ip.clone(), interval)),
        LocationSource::Fixed => Box::new(FixedLocationProvider::new(
            Coordinate::new(config.manual_lat, config.manual_lon),
            interval,
        )),
    }
}

fn parse_fix(lat: &str, lng: &str) -> Option<Coordinate> {
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        warn!("Discarding out-of-range fix ({}, {})", lat, lng);
        return None;
    }
    Some(Coordinate::new(lat, lng))
}
