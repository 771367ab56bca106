//! Service-area lookup and map-state engine
//!
//! Loads a published CSV of serviceable ZIP codes, matches user-entered
//! ZIP codes against it and derives the marker/viewport state a map
//! surface renders.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod matcher;
pub mod models;
pub mod parser;
pub mod reference;
pub mod source;
pub mod store;
pub mod viewport;

pub use controller::{Controller, LoadStatus, MapEvent, SearchOutcome, ViewModel};
pub use error::{LoadError, StoreClosed};
pub use store::MapStore;
