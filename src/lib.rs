//! A multi-city epidemic simulation.
//!
//! Every city of a trade and pilgrimage network runs its own small SIR-style model (susceptible,
//! infected, dead) over discrete time steps, and infection hops between neighboring cities through
//! random transmission events. The aim is to explore how the shape of the network shapes the
//! spread of the epidemic.
//!
//! The pieces, from the bottom up:
//! * [`network`]: the read-only [`CityNetwork`] view of the topology and the in-memory
//!   [`RouteNetwork`].
//! * [`history`]: [`EpidemicHistory`], the dense `[city][compartment][step]` record of a run.
//! * [`dynamics`]: the intra-city update and inter-city transmission for one city and one step.
//! * [`model`]: [`CityInfectionModel`], which steps the whole system through time.
//! * [`report`]: writing a finished run to JSON or CSV.
//! * [`runner`]: the scenario file and command line of the `plague` binary.
//!
//! ```rust
//! use plague::{CityInfectionModel, RouteKind, RouteNetwork, SimulationSettingsBuilder};
//!
//! let mut network = RouteNetwork::new();
//! network.add_route("Venice", "Genoa", RouteKind::Trade).unwrap();
//! network.add_route("Genoa", "Rome", RouteKind::Pilgrimage).unwrap();
//!
//! let settings = SimulationSettingsBuilder::default()
//!     .horizon(100)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//! let mut model = CityInfectionModel::from_seed(network, &settings, ["Venice"]).unwrap();
//! model.run_to_horizon().unwrap();
//!
//! let export = model.export();
//! assert_eq!(export.counts.len(), 3);
//! ```
pub mod dynamics;
pub mod error;
pub mod hashing;
pub mod history;
pub mod log;
pub mod model;
pub mod network;
pub mod parameters;
pub mod random;
pub mod report;
pub mod runner;

pub use error::PlagueError;
pub use history::{CityCounts, Compartment, Count, EpidemicHistory, Totals, DEFAULT_POPULATION};
pub use model::{
    CityInfectionModel, SimulationSettings, SimulationSettingsBuilder, DEFAULT_INOCULATION,
};
pub use network::{CityLabel, CityNetwork, RouteKind, RouteNetwork};
pub use parameters::ModelParameters;
pub use report::{HistoryExport, HistoryRow};

pub use crate::log::{debug, error, info, trace, warn};

// Re-exports used by `define_rng!`
pub use paste;
pub use rand;
