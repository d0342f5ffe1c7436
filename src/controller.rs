//! Application controller
//!
//! Sequences every interaction between the map, the entry form, the list,
//! the in-memory store and persistence. All handlers take `&mut self` and
//! run to completion, so events are processed strictly one at a time.

use crate::dlog;
use crate::gateway::{Clock, FormFields, FormLayer, GeolocationError, ListView, MapGateway, SystemClock};
use crate::persistence::{KeyValueStorage, PersistenceAdapter, PersistenceError};
use crate::render::{ListEntry, marker_label};
use crate::store::WorkoutStore;
use crate::types::{
    Coordinates, EntryDetail, ValidationError, Workout, WorkoutEntry, WorkoutId, WorkoutKind,
};
use thiserror::Error;

pub const MAP_ZOOM_LEVEL: u8 = 13;
pub const CURRENT_POSITION_LABEL: &str = "You are here.";
pub const GEOLOCATION_NOTICE: &str = "Something went wrong reading your GPS position";
pub const SAVE_FAILED_NOTICE: &str = "Workout added, but it could not be saved";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AppState {
    /// Nothing pending; a map click opens the form.
    #[default]
    Idle,
    /// The form is open for a workout at these coordinates.
    AwaitingEntry(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapStatus {
    /// No position fix yet.
    #[default]
    Pending,
    Ready,
    /// Geolocation failed; only previously saved workouts can be reviewed.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Startup,
    PositionResolved(Result<Coordinates, GeolocationError>),
    MapClicked(Coordinates),
    KindChanged(WorkoutKind),
    FormSubmitted(FormFields),
    FormCancelled,
    WorkoutSelected(WorkoutId),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a workout entry is already open")]
    EntryInProgress,
    #[error("no workout entry is open")]
    NoPendingEntry,
    #[error("the map is unavailable")]
    MapUnavailable,
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub struct AppController<M, F, L, S> {
    map: M,
    form: F,
    list: L,
    persistence: PersistenceAdapter<S>,
    store: WorkoutStore,
    state: AppState,
    map_status: MapStatus,
    clock: Box<dyn Clock>,
}

impl<M, F, L, S> AppController<M, F, L, S>
where
    M: MapGateway,
    F: FormLayer,
    L: ListView,
    S: KeyValueStorage,
{
    pub fn new(map: M, form: F, list: L, storage: S) -> Self {
        Self {
            map,
            form,
            list,
            persistence: PersistenceAdapter::new(storage),
            store: WorkoutStore::new(),
            state: AppState::Idle,
            map_status: MapStatus::Pending,
            clock: Box::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub const fn state(&self) -> AppState {
        self.state
    }

    pub const fn map_status(&self) -> MapStatus {
        self.map_status
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn form(&self) -> &F {
        &self.form
    }

    pub const fn list(&self) -> &L {
        &self.list
    }

    pub const fn persistence(&self) -> &PersistenceAdapter<S> {
        &self.persistence
    }

    /// Routes one event to its handler.
    pub fn dispatch(&mut self, event: AppEvent) -> Result<(), AppError> {
        match event {
            AppEvent::Startup => {
                self.on_startup();
                Ok(())
            }
            AppEvent::PositionResolved(result) => {
                self.on_position_resolved(result);
                Ok(())
            }
            AppEvent::MapClicked(at) => self.on_map_click(at),
            AppEvent::KindChanged(kind) => {
                self.on_kind_changed(kind);
                Ok(())
            }
            AppEvent::FormSubmitted(fields) => self.on_form_submit(fields).map(|_| ()),
            AppEvent::FormCancelled => {
                self.on_form_cancel();
                Ok(())
            }
            AppEvent::WorkoutSelected(id) => {
                self.on_workout_selected(&id);
                Ok(())
            }
        }
    }

    /// Loads saved workouts and renders each one, in stored order.
    /// Returns how many were restored.
    pub fn on_startup(&mut self) -> usize {
        let workouts = self.persistence.load();
        self.store.restore(workouts);

        for w in self.store.snapshot() {
            self.map.place_marker(w.coordinates(), &marker_label(w));
            self.list.render(&ListEntry::from(w));
        }

        let count = self.store.len();
        tracing::info!(workouts = count, "startup complete");
        count
    }

    pub fn on_position_resolved(&mut self, result: Result<Coordinates, GeolocationError>) {
        match result {
            Ok(at) => {
                self.map.recenter(at, MAP_ZOOM_LEVEL);
                self.map.place_marker(at, CURRENT_POSITION_LABEL);
                self.map_status = MapStatus::Ready;
                tracing::info!(position = %at, "map ready");
            }
            Err(e) => {
                tracing::warn!(err = %e, "geolocation failed");
                self.form.show_error(GEOLOCATION_NOTICE);
                self.map_status = MapStatus::Unavailable;
            }
        }
    }

    pub fn on_map_click(&mut self, at: Coordinates) -> Result<(), AppError> {
        if self.map_status == MapStatus::Unavailable {
            return Err(AppError::MapUnavailable);
        }
        if self.state != AppState::Idle {
            dlog!("map click ignored while entry is open at={at}");
            return Err(AppError::EntryInProgress);
        }
        // The map widget should only hand out valid positions.
        let at = Coordinates::new(at.lat(), at.lng())?;

        self.state = AppState::AwaitingEntry(at);
        self.form.open();
        dlog!("entry opened at={at}");
        Ok(())
    }

    pub fn on_kind_changed(&mut self, kind: WorkoutKind) {
        self.form.show_kind_fields(kind);
    }

    /// Reads the form and submits whatever it holds.
    pub fn submit_form(&mut self) -> Result<WorkoutId, AppError> {
        let fields = self.form.read_fields();
        self.on_form_submit(fields)
    }

    /// Validates the entry, then records, renders and saves the workout.
    ///
    /// A validation failure leaves the form open and nothing changed. A
    /// failed save is reported but the workout stays in the session.
    pub fn on_form_submit(&mut self, fields: FormFields) -> Result<WorkoutId, AppError> {
        let AppState::AwaitingEntry(at) = self.state else {
            return Err(AppError::NoPendingEntry);
        };

        let entry = match validate(&fields) {
            Ok(entry) => entry,
            Err(e) => {
                dlog!("entry rejected: {e}");
                self.form.show_error(&e.to_string());
                return Err(e.into());
            }
        };

        let workout = Workout::new(at, entry, self.clock.now());
        let id = workout.id().clone();
        self.map.place_marker(at, &marker_label(&workout));
        self.list.render(&ListEntry::from(&workout));
        self.store.add(workout);

        if let Err(e) = self.persistence.save(self.store.snapshot()) {
            tracing::warn!(err = %e, id = %id, "saving workouts failed; kept in memory");
            self.form.show_error(SAVE_FAILED_NOTICE);
        }

        self.form.clear();
        self.form.close();
        self.state = AppState::Idle;
        tracing::info!(id = %id, kind = %fields.kind, "workout recorded");
        Ok(id)
    }

    pub fn on_form_cancel(&mut self) {
        if self.state == AppState::Idle {
            return;
        }
        self.form.clear();
        self.form.close();
        self.state = AppState::Idle;
        dlog!("entry cancelled");
    }

    /// Recenters the map on the selected workout. Unknown ids are ignored.
    /// Returns whether the map moved.
    pub fn on_workout_selected(&mut self, id: &WorkoutId) -> bool {
        let Some(w) = self.store.find_by_id(id) else {
            dlog!("selected id not found id={id}");
            return false;
        };
        self.map.recenter(w.coordinates(), MAP_ZOOM_LEVEL);
        true
    }

    /// Forgets every workout, in storage and on screen.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.persistence.clear()?;
        self.store.restore(Vec::new());
        self.list.clear();
        self.map.clear_markers();
        if self.state != AppState::Idle {
            self.form.clear();
            self.form.close();
            self.state = AppState::Idle;
        }
        tracing::info!("all workouts removed");
        Ok(())
    }
}

/// Checks raw form values. Distance, duration and cadence must be positive;
/// elevation only has to be a number, since it may be a loss.
pub fn validate(fields: &FormFields) -> Result<WorkoutEntry, ValidationError> {
    let distance_km = positive("distance", fields.distance_km)?;
    let duration_min = positive("duration", fields.duration_min)?;

    let detail = match fields.kind {
        WorkoutKind::Running => EntryDetail::Running {
            cadence_spm: positive("cadence", fields.cadence_or_elevation)?,
        },
        WorkoutKind::Cycling => EntryDetail::Cycling {
            elevation_gain_m: finite("elevation", fields.cadence_or_elevation)?,
        },
    };

    Ok(WorkoutEntry {
        distance_km,
        duration_min,
        detail,
    })
}

const fn finite(field: &'static str, v: f64) -> Result<f64, ValidationError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn positive(field: &'static str, v: f64) -> Result<f64, ValidationError> {
    let v = finite(field, v)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(ValidationError::NotPositive { field })
    }
}
