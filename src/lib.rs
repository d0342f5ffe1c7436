//! Record running and cycling workouts at map locations.
//!
//! [`controller::AppController`] drives the whole workflow against injected
//! map, form, list and storage implementations; [`terminal`] holds the
//! adapters used by the `mapty` binary.

pub mod cli;
pub mod controller;
pub mod gateway;
pub mod persistence;
pub mod render;
pub mod store;
pub mod terminal;
pub mod types;
pub mod utils;
