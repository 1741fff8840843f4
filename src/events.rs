//! Event types and the event loop driver.
//!
//! Every asynchronous source (terminal input, the location subscription and
//! the maps request tasks) posts into one unbounded channel. The main loop
//! takes events one at a time and applies each to [`App`](crate::app::App)
//! before receiving the next.

use crate::app::PlaceTarget;
use crate::error::ApiError;
use crate::geo::Coordinate;
use crate::models::{DirectionsRoute, Prediction, SearchResult};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used for UI refresh and autocomplete debouncing.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// New fix from the location subscription.
    LocationUpdate(Coordinate),
    /// The location source failed or access was denied.
    LocationError(String),
    /// Autocomplete suggestions for request `seq`.
    Predictions {
        seq: u64,
        target: PlaceTarget,
        result: Result<Vec<Prediction>, ApiError>,
    },
    /// A selected suggestion resolved (or failed to) for request `seq`.
    PlaceResolved {
        seq: u64,
        target: PlaceTarget,
        result: Result<SearchResult, ApiError>,
    },
    /// Directions response for request `seq`.
    DirectionsReceived {
        seq: u64,
        result: Result<DirectionsRoute, ApiError>,
    },
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// The sender ([`tx`](EventHandler::tx)) can be cloned and handed to other
/// tasks, while the receiver is consumed by [`next`](EventHandler::next).
pub struct EventHandler {
    /// Sender for posting events from other tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick thread.
    ///
    /// crossterm's `poll` blocks, so input runs on a blocking thread rather
    /// than a runtime worker. The thread stops once the receiver is gone or
    /// the terminal can no longer be read.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::task::spawn_blocking(move || {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(Event::Input(key)).is_err() {
                                break;
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` once every sender is dropped. The handler holds a
    /// sender itself, so in practice this only waits.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
