//! Ordered collection of measurements plus the current selection.

use crate::measurement::{Measurement, MeasurementId};
use std::collections::HashSet;

/// Append-only list of measurements and a selection set.
///
/// Measurements are never changed after insertion; only the selection is.
/// Ids are assigned on insertion, starting at 1.
#[derive(Debug, Default)]
pub struct Workspace {
    measurements: Vec<Measurement>,
    selection: HashSet<MeasurementId>,
    next_id: u64,
}

impl Workspace {
    /// Create an empty workspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of measurements
    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    /// True if there are no measurements
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// All measurements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Measurement> {
        self.measurements.iter()
    }

    /// Look up a measurement by id
    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.id == id)
    }

    /// First measurement with `name`
    pub fn find(&self, name: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.name == name)
    }

    /// Most recently inserted measurement
    pub fn last(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    /// Append a measurement and return its new id.
    pub fn insert(&mut self, mut measurement: Measurement) -> MeasurementId {
        self.next_id += 1;
        let id = MeasurementId(self.next_id);
        measurement.id = id;
        tracing::info!(
            %id,
            measurement = %measurement.name,
            kind = measurement.kind.label(),
            channels = measurement.channels.len(),
            "measurement added"
        );
        self.measurements.push(measurement);
        id
    }

    /// Append several fully built measurements together.
    pub fn insert_all(
        &mut self,
        measurements: impl IntoIterator<Item = Measurement>,
    ) -> Vec<MeasurementId> {
        measurements.into_iter().map(|m| self.insert(m)).collect()
    }

    /// Select a measurement. Returns `false` for unknown ids.
    pub fn select(&mut self, id: MeasurementId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.selection.insert(id);
        true
    }

    /// Deselect a measurement. Returns `false` if it was not selected.
    pub fn deselect(&mut self, id: MeasurementId) -> bool {
        self.selection.remove(&id)
    }

    /// Flip a measurement's selection; returns the new state.
    pub fn toggle(&mut self, id: MeasurementId) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.select(id)
        }
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// True if `id` is selected
    pub fn is_selected(&self, id: MeasurementId) -> bool {
        self.selection.contains(&id)
    }

    /// Selected measurements in insertion order
    pub fn selected(&self) -> Vec<&Measurement> {
        self.measurements
            .iter()
            .filter(|m| self.selection.contains(&m.id))
            .collect()
    }

    /// Ids of the selected measurements in insertion order
    pub fn selected_ids(&self) -> Vec<MeasurementId> {
        self.selected().iter().map(|m| m.id).collect()
    }
}
