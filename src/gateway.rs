//! Interfaces to the collaborators the controller drives: the map widget,
//! the entry form, the workout list, and the clock.

use crate::render::ListEntry;
use crate::types::{Coordinates, WorkoutKind};
use chrono::{DateTime, FixedOffset, Local};
use thiserror::Error;

pub trait MapGateway {
    fn place_marker(&mut self, at: Coordinates, label: &str);
    fn recenter(&mut self, at: Coordinates, zoom: u8);
    fn clear_markers(&mut self);
}

pub trait FormLayer {
    fn open(&mut self);
    fn close(&mut self);
    /// Empties every input field.
    fn clear(&mut self);
    fn read_fields(&mut self) -> FormFields;
    fn show_error(&mut self, message: &str);
    /// Shows the cadence input for running, the elevation input for cycling.
    fn show_kind_fields(&mut self, kind: WorkoutKind);
}

pub trait ListView {
    fn render(&mut self, entry: &ListEntry);
    fn clear(&mut self);
}

/// Current time, with the offset of the user's timezone.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("permission to read the position was denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out waiting for a position fix")]
    Timeout,
}

/// Raw values read from the entry form. Numbers are not checked yet;
/// an empty or garbled input shows up as NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormFields {
    pub kind: WorkoutKind,
    pub distance_km: f64,
    pub duration_min: f64,
    /// Cadence for running, elevation gain for cycling.
    pub cadence_or_elevation: f64,
}

impl FormFields {
    /// Builds fields from the text the user typed.
    pub fn from_text(kind: WorkoutKind, distance: &str, duration: &str, extra: &str) -> Self {
        Self {
            kind,
            distance_km: parse_number(distance),
            duration_min: parse_number(duration),
            cadence_or_elevation: parse_number(extra),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fields_parse_or_become_nan() {
        let f = FormFields::from_text(WorkoutKind::Running, " 5 ", "30.5", "");
        assert_eq!(f.distance_km, 5.0);
        assert_eq!(f.duration_min, 30.5);
        assert!(f.cadence_or_elevation.is_nan());

        let f = FormFields::from_text(WorkoutKind::Cycling, "abc", "-3", "1e2");
        assert!(f.distance_km.is_nan());
        assert_eq!(f.duration_min, -3.0);
        assert_eq!(f.cadence_or_elevation, 100.0);
    }
}
