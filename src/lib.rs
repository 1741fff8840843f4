//! Terminal navigation widget: live location, place search and
//! turn-by-turn driving directions backed by Google Maps web services.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod geo;
pub mod location;
pub mod logging;
pub mod markup;
pub mod models;
pub mod polyline;
pub mod tracker;
pub mod ui;
