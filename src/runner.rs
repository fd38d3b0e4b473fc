use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use serde::Deserialize;
use strum::IntoEnumIterator;

use crate::error::PlagueError;
use crate::log::{set_log_level, LevelFilter};
use crate::model::{CityInfectionModel, SimulationSettings};
use crate::network::{RouteKind, RouteNetwork};
use crate::report::{write_history_csv, write_history_json, HistoryExport};

/// Default cli arguments for the plague runner
#[derive(Parser, Debug)]
#[command(name = "plague", version, about = "Simulates an epidemic spreading between cities")]
pub struct BaseArgs {
    /// Path to the scenario configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Random seed. Overrides the seed in the scenario file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// Directory for the history reports
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(short, long, default_value = "off")]
    pub log_level: LevelFilter,

    /// Number of steps to run, starting at step 1. Defaults to the rest of the horizon
    #[arg(short = 'n', long)]
    pub steps: Option<usize>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct RouteConfig {
    pub from: String,
    pub to: String,
    pub kind: RouteKind,
}

/// A scenario file: simulation settings, the network, and where the epidemic starts.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ScenarioConfig {
    #[serde(flatten)]
    pub settings: SimulationSettings,

    /// Cities to include even if no route reaches them
    #[serde(default)]
    pub cities: Vec<String>,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Only routes of these kinds are simulated
    #[serde(default = "all_route_kinds")]
    pub route_kinds: Vec<RouteKind>,

    #[serde(default)]
    pub initial_infected: Vec<String>,
}

fn all_route_kinds() -> Vec<RouteKind> {
    RouteKind::iter().collect()
}

impl ScenarioConfig {
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid scenario.
    pub fn load(path: &Path) -> Result<Self, PlagueError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Builds the network of the scenario's routes. When only some route kinds are selected,
    /// cities not on a selected route are left out.
    ///
    /// # Errors
    ///
    /// Fails on a route from a city to itself or a repeated route.
    pub fn network(&self) -> Result<RouteNetwork<String>, PlagueError> {
        let mut network = RouteNetwork::new();
        for city in &self.cities {
            network.add_city(city.clone());
        }
        for route in &self.routes {
            network.add_route(route.from.clone(), route.to.clone(), route.kind)?;
        }

        if RouteKind::iter().all(|kind| self.route_kinds.contains(&kind)) {
            Ok(network)
        } else {
            Ok(network.restricted_to(&self.route_kinds))
        }
    }
}

// Logging starts disabled, so `off` leaves the global configuration alone.
pub(crate) fn apply_log_level(level: LevelFilter) {
    if level != LevelFilter::Off {
        set_log_level(level);
    }
}

/// Loads the scenario named by `args`, runs it, and writes `history.json` and `history.csv` to
/// the output directory. Returns the exported history.
///
/// # Errors
///
/// Returns an error if the scenario is invalid, the run exceeds the horizon, or a report cannot
/// be written.
pub fn run_with_args(args: &BaseArgs) -> Result<HistoryExport, PlagueError> {
    apply_log_level(args.log_level);

    info!("loading scenario from {}", args.config.display());
    let mut scenario = ScenarioConfig::load(&args.config)?;
    if let Some(seed) = args.random_seed {
        scenario.settings.seed = seed;
    }

    let network = scenario.network()?;
    info!(
        "network has {} cities and {} routes (mean degree {:.2})",
        network.city_count(),
        network.route_count(),
        network.mean_degree()
    );

    let mut model = CityInfectionModel::from_seed(
        network,
        &scenario.settings,
        scenario.initial_infected.iter().cloned(),
    )?;
    let steps = args
        .steps
        .unwrap_or_else(|| scenario.settings.horizon.saturating_sub(1));
    model.run(steps, 1)?;

    let export = model.export();
    write_history_json(&args.output_dir.join("history.json"), &export)?;
    write_history_csv(&args.output_dir.join("history.csv"), &export)?;
    Ok(export)
}
