//! Terminal stand-ins for the map, the form and the list.

use crate::cli::Cmd;
use crate::controller::AppController;
use crate::gateway::{FormFields, FormLayer, ListView, MapGateway};
use crate::persistence::KeyValueStorage;
use crate::render::ListEntry;
use crate::types::{Coordinates, WorkoutId, WorkoutKind};
use anyhow::Result;
use std::io::{self, Write};

/// Controller wired to the terminal adapters.
pub type TerminalApp<W, S> = AppController<TerminalMap, PresetForm, TerminalList<W>, S>;

/// Has no tiles to draw; reports what a map widget would do.
#[derive(Debug, Default)]
pub struct TerminalMap {
    markers: usize,
}

impl TerminalMap {
    pub const fn marker_count(&self) -> usize {
        self.markers
    }
}

impl MapGateway for TerminalMap {
    fn place_marker(&mut self, at: Coordinates, label: &str) {
        self.markers += 1;
        tracing::debug!(at = %at, label, "marker placed");
    }

    fn recenter(&mut self, at: Coordinates, zoom: u8) {
        tracing::info!(lat = at.lat(), lng = at.lng(), zoom, "map centered");
        println!("centered\t{at}\tzoom={zoom}");
    }

    fn clear_markers(&mut self) {
        self.markers = 0;
    }
}

/// Prints each entry as a tab-separated line: id, title, then details.
pub struct TerminalList<W> {
    out: W,
    details: bool,
}

impl TerminalList<Box<dyn Write>> {
    /// Rows go to stdout when `visible`, otherwise they are dropped.
    pub fn stdout_if(visible: bool, details: bool) -> Self {
        let out: Box<dyn Write> = if visible {
            Box::new(io::stdout())
        } else {
            Box::new(io::sink())
        };
        Self { out, details }
    }
}

impl<W: Write> TerminalList<W> {
    pub const fn new(out: W, details: bool) -> Self {
        Self { out, details }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(entry: &ListEntry, details: bool) -> String {
        let mut line = format!("{}\t{}", entry.id, entry.title);
        if details {
            for d in &entry.details {
                line.push('\t');
                line.push_str(&d.to_string());
            }
        }
        line
    }
}

impl<W: Write> ListView for TerminalList<W> {
    fn render(&mut self, entry: &ListEntry) {
        if let Err(e) = writeln!(self.out, "{}", Self::line(entry, self.details)) {
            tracing::warn!(err = %e, "writing list entry failed");
        }
    }

    fn clear(&mut self) {}
}

/// Form whose values were filled in up front, from command-line arguments.
#[derive(Debug)]
pub struct PresetForm {
    fields: FormFields,
    errors: Vec<String>,
}

impl PresetForm {
    pub const fn new(fields: FormFields) -> Self {
        Self {
            fields,
            errors: Vec::new(),
        }
    }

    /// A form with nothing typed in; only useful when nothing is submitted.
    pub const fn empty() -> Self {
        Self::new(FormFields {
            kind: WorkoutKind::Running,
            distance_km: f64::NAN,
            duration_min: f64::NAN,
            cadence_or_elevation: f64::NAN,
        })
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl FormLayer for PresetForm {
    fn open(&mut self) {}

    fn close(&mut self) {}

    fn clear(&mut self) {}

    fn read_fields(&mut self) -> FormFields {
        self.fields
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
        self.errors.push(message.to_string());
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.fields.kind = kind;
    }
}

/// Runs one command against an app whose startup already restored
/// `restored` workouts. Returns the status line for stdout, if any.
pub fn run_command<W: Write, S: KeyValueStorage>(
    app: &mut TerminalApp<W, S>,
    cmd: &Cmd,
    restored: usize,
) -> Result<Option<String>> {
    match cmd {
        Cmd::List => {
            if restored == 0 {
                tracing::info!("no workouts saved yet");
            }
            Ok(None)
        }
        Cmd::Add(args) => {
            let at = Coordinates::new(args.lat, args.lng)?;
            app.on_map_click(at)?;
            app.on_kind_changed(args.kind);
            let id = app.submit_form()?;
            Ok(Some(format!("added\t{id}")))
        }
        Cmd::Show { id } => {
            if !app.on_workout_selected(&WorkoutId::from(id.as_str())) {
                tracing::info!(id = %id, "no workout with this id");
            }
            Ok(None)
        }
        Cmd::Reset => {
            app.reset()?;
            Ok(Some(format!("removed {restored} workouts")))
        }
    }
}
