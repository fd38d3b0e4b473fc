//! Writing a finished simulation to disk.
//!
//! [`HistoryExport`] is the complete history in a self-describing, serializable form. It can be
//! written as JSON, which keeps the nested `[city][compartment][step]` buffer intact, or as CSV
//! with one [`HistoryRow`] per city per step.

use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use csv::Writer;
use log::info;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};

use crate::error::PlagueError;
use crate::history::{Compartment, Count, EpidemicHistory};
use crate::network::CityLabel;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryExport {
    /// City labels in slot order.
    pub cities: Vec<String>,
    /// Compartment names in buffer order: `S`, `I`, `D`, `Itimes`.
    pub compartments: Vec<String>,
    pub horizon: usize,
    pub population: Count,
    /// Indexed as `counts[city][compartment][step]`.
    pub counts: Vec<Vec<Vec<Count>>>,
}

impl<C: CityLabel> From<&EpidemicHistory<C>> for HistoryExport {
    fn from(history: &EpidemicHistory<C>) -> Self {
        HistoryExport {
            cities: history.cities().iter().map(ToString::to_string).collect(),
            compartments: Compartment::iter().map(|c| c.to_string()).collect(),
            horizon: history.horizon(),
            population: history.population(),
            counts: history.to_nested(),
        }
    }
}

/// One city at one step.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryRow {
    pub city: String,
    pub step: usize,
    pub susceptible: Count,
    pub infected: Count,
    pub dead: Count,
    pub transmission_events: Count,
}

impl HistoryExport {
    /// Checks that `counts` holds one series of `horizon` values per city and compartment.
    ///
    /// # Errors
    ///
    /// Fails with a description of the first mismatch found.
    pub fn validate(&self) -> Result<(), PlagueError> {
        if self.counts.len() != self.cities.len() {
            return Err(PlagueError::PlagueError(format!(
                "History has {} cities but counts for {}",
                self.cities.len(),
                self.counts.len()
            )));
        }
        for (city, compartments) in self.cities.iter().zip(&self.counts) {
            if compartments.len() != Compartment::COUNT {
                return Err(PlagueError::PlagueError(format!(
                    "{city} has {} compartments, expected {}",
                    compartments.len(),
                    Compartment::COUNT
                )));
            }
            if let Some(series) = compartments.iter().find(|s| s.len() != self.horizon) {
                return Err(PlagueError::PlagueError(format!(
                    "{city} has a series of {} steps, expected {}",
                    series.len(),
                    self.horizon
                )));
            }
        }
        Ok(())
    }

    /// The export flattened into rows, city by city and step by step.
    ///
    /// # Panics
    ///
    /// Panics if the export does not pass [`HistoryExport::validate`].
    pub fn rows(&self) -> impl Iterator<Item = HistoryRow> + '_ {
        self.cities
            .iter()
            .zip(&self.counts)
            .flat_map(move |(city, compartments)| {
                (0..self.horizon).map(move |step| HistoryRow {
                    city: city.clone(),
                    step,
                    susceptible: compartments[Compartment::Susceptible as usize][step],
                    infected: compartments[Compartment::Infected as usize][step],
                    dead: compartments[Compartment::Dead as usize][step],
                    transmission_events: compartments[Compartment::TransmissionEvents as usize]
                        [step],
                })
            })
    }
}

// Checks that the path has the expected extension, then creates the file and all parent
// directories if they do not exist.
fn generate_validate_filepath(path: &Path, extension: &str) -> Result<File, PlagueError> {
    if path.extension().and_then(OsStr::to_str) != Some(extension) {
        return Err(PlagueError::PlagueError(format!(
            "{} must be a .{extension} file",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes the full export as JSON.
///
/// # Errors
///
/// Fails if `path` is not a `.json` path, or on any I/O or serialization error.
pub fn write_history_json(path: &Path, export: &HistoryExport) -> Result<(), PlagueError> {
    let file = generate_validate_filepath(path, "json")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, export)?;
    writer.flush()?;
    info!("wrote history of {} cities to {}", export.cities.len(), path.display());
    Ok(())
}

/// Reads back an export written by [`write_history_json`].
///
/// # Errors
///
/// Fails on any I/O or deserialization error, or if the counts do not match the declared cities
/// and horizon.
pub fn read_history_json(path: &Path) -> Result<HistoryExport, PlagueError> {
    let reader = BufReader::new(File::open(path)?);
    let export: HistoryExport = serde_json::from_reader(reader)?;
    export.validate()?;
    Ok(export)
}

/// Writes the export as CSV, one row per city per step.
///
/// # Errors
///
/// Fails if `path` is not a `.csv` path, if the export is malformed, or on any I/O or
/// serialization error.
pub fn write_history_csv(path: &Path, export: &HistoryExport) -> Result<(), PlagueError> {
    export.validate()?;
    let file = generate_validate_filepath(path, "csv")?;
    let mut writer = Writer::from_writer(file);
    for row in export.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote history rows to {}", path.display());
    Ok(())
}
