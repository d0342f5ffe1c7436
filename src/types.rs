use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of trailing epoch-millisecond digits kept in a workout id.
const ID_DIGITS: usize = 10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} has to be a number")]
    NotFinite { field: &'static str },
    #[error("{field} has to be a positive number")]
    NotPositive { field: &'static str },
    #[error("coordinates out of range: lat={lat} lng={lng}")]
    CoordinatesOutOfRange { lat: f64, lng: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workout kind: {0:?} (expected \"running\" or \"cycling\")")]
pub struct ParseKindError(String);

/// Latitude/longitude pair in degrees. Stored as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let in_range = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        if !in_range {
            return Err(ValidationError::CoordinatesOutOfRange { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub const fn lat(&self) -> f64 {
        self.lat
    }

    pub const fn lng(&self) -> f64 {
        self.lng
    }
}

// Stored data is trusted on the way back in.
impl From<[f64; 2]> for Coordinates {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Identifier derived from the creation time.
///
/// Only the last 10 digits of the epoch milliseconds are kept, so two
/// workouts created within the same millisecond collide. Good enough for
/// entries typed in by hand; not a unique key in any stronger sense.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn from_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        let millis = at.timestamp_millis().to_string();
        let start = millis.len().saturating_sub(ID_DIGITS);
        Self(millis[start..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated user input for one workout, before it gets an id and a date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutEntry {
    pub distance_km: f64,
    pub duration_min: f64,
    pub detail: EntryDetail,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryDetail {
    Running { cadence_spm: f64 },
    Cycling { elevation_gain_m: f64 },
}

impl EntryDetail {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Running {
    cadence_spm: f64,
    pace_min_per_km: f64,
}

impl Running {
    pub const fn cadence_spm(&self) -> f64 {
        self.cadence_spm
    }

    pub const fn pace_min_per_km(&self) -> f64 {
        self.pace_min_per_km
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycling {
    elevation_gain_m: f64,
    speed_km_per_h: f64,
}

impl Cycling {
    pub const fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    pub const fn speed_km_per_h(&self) -> f64 {
        self.speed_km_per_h
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running(Running),
    Cycling(Cycling),
}

/// A recorded workout. Everything is fixed at construction; derived
/// metrics and the description are computed once and never touched again.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<FixedOffset>,
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    description: String,
    activity: Activity,
}

impl Workout {
    /// Builds a new workout stamped with `created_at`.
    ///
    /// The entry is expected to have passed validation already. The offset
    /// of `created_at` is kept and decides which calendar day the
    /// description names.
    pub fn new<Tz: TimeZone>(
        coordinates: Coordinates,
        entry: WorkoutEntry,
        created_at: DateTime<Tz>,
    ) -> Self {
        Self::restore(
            WorkoutId::from_timestamp(&created_at),
            created_at,
            coordinates,
            entry,
        )
    }

    /// Rebuilds a workout with a known id, recomputing the derived fields.
    pub fn restore<Tz: TimeZone>(
        id: WorkoutId,
        created_at: DateTime<Tz>,
        coordinates: Coordinates,
        entry: WorkoutEntry,
    ) -> Self {
        let WorkoutEntry {
            distance_km,
            duration_min,
            detail,
        } = entry;
        let created_at = created_at.fixed_offset();

        let activity = match detail {
            EntryDetail::Running { cadence_spm } => Activity::Running(Running {
                cadence_spm,
                pace_min_per_km: duration_min / distance_km,
            }),
            EntryDetail::Cycling { elevation_gain_m } => Activity::Cycling(Cycling {
                elevation_gain_m,
                speed_km_per_h: distance_km / (duration_min / 60.0),
            }),
        };

        Self {
            id,
            created_at,
            coordinates,
            distance_km,
            duration_min,
            description: describe(detail.kind(), &created_at),
            activity,
        }
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    pub const fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self.activity {
            Activity::Running(_) => WorkoutKind::Running,
            Activity::Cycling(_) => WorkoutKind::Cycling,
        }
    }

    /// The inputs this workout was built from.
    pub const fn entry(&self) -> WorkoutEntry {
        let detail = match self.activity {
            Activity::Running(r) => EntryDetail::Running {
                cadence_spm: r.cadence_spm,
            },
            Activity::Cycling(c) => EntryDetail::Cycling {
                elevation_gain_m: c.elevation_gain_m,
            },
        };
        WorkoutEntry {
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            detail,
        }
    }
}

/// "Running on March 5". Month and day are read in `at`'s own offset.
fn describe(kind: WorkoutKind, at: &DateTime<FixedOffset>) -> String {
    let month = MONTHS[at.month0() as usize];
    format!("{} on {month} {}", kind.label(), at.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn march_5() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, 9, 30, 0).unwrap()
    }

    fn london() -> Coordinates {
        Coordinates::new(51.5, -0.1).unwrap()
    }

    #[test]
    fn running_pace_is_duration_over_distance() {
        let w = Workout::new(
            london(),
            WorkoutEntry {
                distance_km: 5.0,
                duration_min: 30.0,
                detail: EntryDetail::Running { cadence_spm: 150.0 },
            },
            march_5(),
        );

        let Activity::Running(r) = w.activity() else {
            panic!("expected running, got {:?}", w.activity());
        };
        assert_eq!(r.pace_min_per_km(), 6.0);
        assert_eq!(r.cadence_spm(), 150.0);
        assert_eq!(w.description(), "Running on March 5");
        assert_eq!(w.kind(), WorkoutKind::Running);
    }

    #[test]
    fn pace_matches_formula_for_uneven_inputs() {
        for (d, t) in [(4.2, 27.5), (0.3, 1.1), (42.195, 181.0)] {
            let w = Workout::new(
                london(),
                WorkoutEntry {
                    distance_km: d,
                    duration_min: t,
                    detail: EntryDetail::Running { cadence_spm: 170.0 },
                },
                march_5(),
            );
            let Activity::Running(r) = w.activity() else {
                panic!("expected running");
            };
            assert_eq!(r.pace_min_per_km(), t / d);
        }
    }

    #[test]
    fn cycling_speed_is_km_per_hour() {
        let w = Workout::new(
            london(),
            WorkoutEntry {
                distance_km: 20.0,
                duration_min: 60.0,
                detail: EntryDetail::Cycling {
                    elevation_gain_m: 150.0,
                },
            },
            Utc.with_ymd_and_hms(2026, 12, 24, 18, 0, 0).unwrap(),
        );

        let Activity::Cycling(c) = w.activity() else {
            panic!("expected cycling");
        };
        assert_eq!(c.speed_km_per_h(), 20.0);
        assert_eq!(c.elevation_gain_m(), 150.0);
        assert_eq!(w.description(), "Cycling on December 24");
    }

    #[test]
    fn id_keeps_last_ten_millisecond_digits() {
        let at = Utc.timestamp_millis_opt(1_774_000_123_456).unwrap();
        assert_eq!(WorkoutId::from_timestamp(&at).as_str(), "4000123456");
    }

    #[test]
    fn description_uses_the_local_calendar_day() {
        // 23:30 on March 15 in UTC-5 is already March 16 in UTC.
        let evening = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 15, 23, 30, 0)
            .unwrap();
        let w = Workout::new(
            london(),
            WorkoutEntry {
                distance_km: 5.0,
                duration_min: 30.0,
                detail: EntryDetail::Running { cadence_spm: 150.0 },
            },
            evening,
        );

        assert_eq!(w.description(), "Running on March 15");
        assert_eq!(w.created_at().offset().local_minus_utc(), -5 * 3600);
        assert_eq!(w.id(), &WorkoutId::from_timestamp(&evening.with_timezone(&Utc)));
    }

    #[test]
    fn restore_recomputes_metrics_and_keeps_id() {
        let original = Workout::new(
            london(),
            WorkoutEntry {
                distance_km: 10.0,
                duration_min: 50.0,
                detail: EntryDetail::Running { cadence_spm: 160.0 },
            },
            march_5(),
        );
        let copy = Workout::restore(
            original.id().clone(),
            original.created_at(),
            original.coordinates(),
            original.entry(),
        );
        assert_eq!(copy, original);
    }

    #[test]
    fn coordinates_reject_out_of_range_and_nan() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Running".parse::<WorkoutKind>(), Ok(WorkoutKind::Running));
        assert_eq!(" cycling ".parse::<WorkoutKind>(), Ok(WorkoutKind::Cycling));
        assert!("swimming".parse::<WorkoutKind>().is_err());
    }
}
