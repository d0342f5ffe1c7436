use crate::types::{Activity, Workout, WorkoutId, WorkoutKind};
use std::fmt;

/// Popup text for a workout's map marker, e.g. "🏃‍♂️ Running on March 5".
pub fn marker_label(w: &Workout) -> String {
    format!("{} {}", w.kind().icon(), w.description())
}

/// One row of the workout list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: WorkoutId,
    pub kind: WorkoutKind,
    pub title: String,
    pub details: Vec<Detail>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl Detail {
    fn new(icon: &'static str, value: String, unit: &'static str) -> Self {
        Self { icon, value, unit }
    }
}

impl fmt::Display for Detail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.icon, self.value, self.unit)
    }
}

impl From<&Workout> for ListEntry {
    fn from(w: &Workout) -> Self {
        let kind = w.kind();
        let mut details = vec![
            Detail::new(kind.icon(), w.distance_km().to_string(), "km"),
            Detail::new("⏱", w.duration_min().to_string(), "min"),
        ];

        match w.activity() {
            Activity::Running(r) => {
                details.push(Detail::new("⚡️", format!("{:.1}", r.pace_min_per_km()), "min/km"));
                details.push(Detail::new("🦶🏼", r.cadence_spm().to_string(), "spm"));
            }
            Activity::Cycling(c) => {
                details.push(Detail::new("⚡️", format!("{:.1}", c.speed_km_per_h()), "km/h"));
                details.push(Detail::new("⛰", c.elevation_gain_m().to_string(), "m"));
            }
        }

        Self {
            id: w.id().clone(),
            kind,
            title: w.description().to_string(),
            details,
        }
    }
}
