use crate::types::WorkoutKind;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_STORE_DIR: &str = ".mapty";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts pinned to map locations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,

    /// Directory holding the saved workouts (`workouts.json`).
    #[arg(long, value_name = "DIR", default_value = DEFAULT_STORE_DIR, global = true)]
    pub store: PathBuf,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print every saved workout (default).
    List,
    /// Record a workout at a location.
    Add(AddArgs),
    /// Center the map on a saved workout.
    Show {
        /// Workout id as printed by `list`.
        id: String,
    },
    /// Delete every saved workout.
    Reset,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// running or cycling
    #[arg(long)]
    pub kind: WorkoutKind,

    /// Latitude of the clicked location, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the clicked location, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Distance in km.
    #[arg(long)]
    pub distance: String,

    /// Duration in minutes.
    #[arg(long)]
    pub duration: String,

    /// Steps per minute (running).
    #[arg(long, conflicts_with = "elevation")]
    pub cadence: Option<String>,

    /// Elevation gain in meters (cycling); may be negative.
    #[arg(long, allow_hyphen_values = true)]
    pub elevation: Option<String>,
}

impl Cmd {
    /// Whether saved workouts are printed as rows for this command.
    pub const fn lists_workouts(&self) -> bool {
        matches!(self, Self::List)
    }
}

impl AddArgs {
    /// The kind-specific field as typed, or empty if it was not given.
    pub fn extra_field(&self) -> &str {
        let field = match self.kind {
            WorkoutKind::Running => &self.cadence,
            WorkoutKind::Cycling => &self.elevation,
        };
        field.as_deref().unwrap_or("")
    }
}
