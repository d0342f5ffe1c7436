use crate::types::{Workout, WorkoutId};

/// Session-lifetime list of workouts, kept in entry order.
#[derive(Debug, Default)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, workout: Workout) {
        self.workouts.push(workout);
    }

    pub fn find_by_id(&self, id: &WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    /// Replaces everything with `workouts`. Nothing is validated; the
    /// records are expected to come straight from persistence.
    pub fn restore(&mut self, workouts: Vec<Workout>) {
        self.workouts = workouts;
    }

    /// Borrowed, read-only view of the stored sequence. Not a copy: callers
    /// that need to keep it past the next `add` must clone.
    pub fn snapshot(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}
