//! Named waypoint sequences, persisted as a CSV table.
//!
//! One column per sequence name, one pose literal per cell, short
//! columns padded with empty cells. The reverse of every sequence is
//! available under `reverse_<name>` but is recomputed at load and save
//! time, never stored — the file only ever contains forward columns.
//!
//! The file is read and written whole; there is no incremental append.

use crate::pose::Pose;
use crate::{Result, TeleopError};
use log::info;
use std::collections::HashMap;
use std::path::Path;

/// Key prefix for the recomputed reverse entries.
pub const REVERSE_PREFIX: &str = "reverse_";

#[derive(Debug, Default, Clone)]
pub struct WaypointStore {
    /// Forward column names, in file order.
    columns: Vec<String>,
    /// Forward and reverse sequences.
    sequences: HashMap<String, Vec<Pose>>,
}

impl WaypointStore {
    /// Load the table. A missing file is an empty store — the first
    /// teach run starts from a fresh sheet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no waypoint file at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let mut lists: Vec<Vec<Pose>> = vec![Vec::new(); columns.len()];

        for (row_index, record) in reader.records().enumerate() {
            let record = record?;
            for (col_index, cell) in record.iter().enumerate() {
                if col_index >= columns.len() || cell.trim().is_empty() {
                    continue;
                }
                let pose = Pose::parse_literal(cell).map_err(|reason| {
                    TeleopError::MalformedWaypoint {
                        column: columns[col_index].clone(),
                        // +2: one for the header row, one for 1-based counting
                        row: row_index + 2,
                        reason,
                    }
                })?;
                lists[col_index].push(pose);
            }
        }

        let mut store = Self::default();
        for (name, poses) in columns.into_iter().zip(lists) {
            store.insert_unchecked(name, poses);
        }
        Ok(store)
    }

    /// Write the table back out: forward columns only, original column
    /// order, short columns padded with empty cells.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.columns.is_empty() {
            // Nothing taught yet; leave the file alone.
            return Ok(());
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        let depth = self
            .columns
            .iter()
            .map(|name| self.sequences[name].len())
            .max()
            .unwrap_or(0);
        for row in 0..depth {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|name| {
                    self.sequences[name]
                        .get(row)
                        .map(Pose::to_string)
                        .unwrap_or_default()
                })
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        info!(
            "saved {} sequence(s) to {}",
            self.columns.len(),
            path.display()
        );
        Ok(())
    }

    /// Add a newly taught sequence as a trailing column. Re-teaching an
    /// existing name with identical poses is a no-op; different poses
    /// are refused rather than silently overwritten.
    pub fn insert(&mut self, name: String, poses: Vec<Pose>) -> Result<()> {
        if let Some(existing) = self.sequences.get(&name) {
            if *existing == poses {
                return Ok(());
            }
            return Err(TeleopError::DuplicateSequence(name));
        }
        if name.starts_with(REVERSE_PREFIX) {
            // Reverse entries are derived, never taught.
            return Err(TeleopError::DuplicateSequence(name));
        }
        self.insert_unchecked(name, poses);
        Ok(())
    }

    fn insert_unchecked(&mut self, name: String, poses: Vec<Pose>) {
        let reversed: Vec<Pose> = poses.iter().rev().copied().collect();
        self.sequences
            .insert(format!("{REVERSE_PREFIX}{name}"), reversed);
        self.sequences.insert(name.clone(), poses);
        self.columns.push(name);
    }

    /// Forward sequence names, in file order.
    pub fn names(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a sequence, forward or `reverse_`-keyed.
    pub fn get(&self, name: &str) -> Option<&[Pose]> {
        self.sequences.get(name).map(Vec::as_slice)
    }

    /// The recomputed reverse of a forward sequence.
    pub fn reverse(&self, name: &str) -> Option<&[Pose]> {
        self.sequences
            .get(&format!("{REVERSE_PREFIX}{name}"))
            .map(Vec::as_slice)
    }
}
