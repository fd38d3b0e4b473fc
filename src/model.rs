/*!

`CityInfectionModel` drives a simulation one time step at a time. A step

1. copies every city's `S`, `I` and `D` forward from the previous step,
2. snapshots the active-infection set,
3. runs the intra-city update for every city in the snapshot, then
4. runs inter-city transmission for every city in the same snapshot.

A city first infected during step `t` is therefore only updated and only transmits from step
`t + 1` on. The active set only grows, and it keeps insertion order so that a given seed always
draws its random numbers in the same order.

*/

use derive_builder::Builder;
use indexmap::IndexSet;
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::define_rng;
use crate::dynamics::{inter_city_step, intra_city_step};
use crate::error::PlagueError;
use crate::history::{Count, EpidemicHistory, DEFAULT_POPULATION};
use crate::network::CityNetwork;
use crate::parameters::ModelParameters;
use crate::random::rng_from_seed;
use crate::report::HistoryExport;

define_rng!(TransmissionRng);

/// The number of people infected in each initially infected city at step 0.
pub const DEFAULT_INOCULATION: Count = 10;

/// Progress is logged every this many steps.
const LOG_PERIOD: usize = 10;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[serde(default)]
pub struct SimulationSettings {
    /// The number of preallocated time steps, step 0 included.
    #[builder(default = "1500")]
    pub horizon: usize,

    #[builder(default = "DEFAULT_POPULATION")]
    pub population: Count,

    #[builder(default = "DEFAULT_INOCULATION")]
    pub inoculation: Count,

    #[builder(default)]
    pub parameters: ModelParameters,

    #[builder(default = "0")]
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettingsBuilder::default()
            .build()
            .expect("every field has a default")
    }
}

pub struct CityInfectionModel<N: CityNetwork, R: Rng = SmallRng> {
    network: N,
    history: EpidemicHistory<N::City>,
    active: IndexSet<N::City>,
    parameters: ModelParameters,
    rng: R,
    next_step: usize,
}

impl<N: CityNetwork> CityInfectionModel<N, SmallRng> {
    /// Builds a model whose transmission trials draw from a generator derived from
    /// `settings.seed`. The same seed on the same network reproduces the same run.
    ///
    /// # Errors
    ///
    /// See [`CityInfectionModel::with_settings`].
    pub fn from_seed(
        network: N,
        settings: &SimulationSettings,
        initial_infected: impl IntoIterator<Item = N::City>,
    ) -> Result<Self, PlagueError> {
        let rng = rng_from_seed::<TransmissionRng>(settings.seed);
        Self::with_settings(network, settings, initial_infected, rng)
    }
}

impl<N: CityNetwork, R: Rng> CityInfectionModel<N, R> {
    /// Builds a model over every city of `network` with the default population and inoculation.
    ///
    /// # Errors
    ///
    /// See [`CityInfectionModel::with_settings`].
    pub fn new(
        network: N,
        horizon: usize,
        initial_infected: impl IntoIterator<Item = N::City>,
        parameters: ModelParameters,
        rng: R,
    ) -> Result<Self, PlagueError> {
        let settings = SimulationSettings {
            horizon,
            parameters,
            ..SimulationSettings::default()
        };
        Self::with_settings(network, &settings, initial_infected, rng)
    }

    /// Builds a model over every city of `network`. Each city of `initial_infected` gets
    /// `settings.inoculation` people infected at step 0 and joins the active set.
    ///
    /// # Errors
    ///
    /// Fails if the horizon is zero or if an initially infected city is not in the network.
    pub fn with_settings(
        network: N,
        settings: &SimulationSettings,
        initial_infected: impl IntoIterator<Item = N::City>,
        rng: R,
    ) -> Result<Self, PlagueError> {
        let mut history = EpidemicHistory::new(
            network.cities().iter().cloned(),
            settings.horizon,
            settings.population,
        )?;

        let mut active = IndexSet::new();
        for city in initial_infected {
            history.seed_infection(&city, 0, settings.inoculation)?;
            debug!("seeded {} infections in {city}", settings.inoculation);
            active.insert(city);
        }

        info!(
            "created model of {} cities over {} steps with {} initially infected",
            history.cities().len(),
            settings.horizon,
            active.len()
        );
        Ok(CityInfectionModel {
            network,
            history,
            active,
            parameters: settings.parameters,
            rng,
            next_step: 1,
        })
    }

    fn check_step_bounds(&self, step: usize) -> Result<(), PlagueError> {
        let horizon = self.history.horizon();
        if step == 0 || step >= horizon {
            return Err(PlagueError::HorizonExceeded { step, horizon });
        }
        Ok(())
    }

    // Steps build on the previous column, so they run once each and in order.
    fn check_step_order(&self, step: usize) -> Result<(), PlagueError> {
        if step != self.next_step {
            return Err(PlagueError::PlagueError(format!(
                "Cannot run step {step}: the next step to run is {}",
                self.next_step
            )));
        }
        Ok(())
    }

    /// Runs one complete step. Returns the number of transmission events during the step.
    ///
    /// # Errors
    ///
    /// Fails with `HorizonExceeded` if `step` is 0 or not below the horizon, and with
    /// `PlagueError` if `step` is not [`CityInfectionModel::next_step`].
    pub fn step(&mut self, step: usize) -> Result<usize, PlagueError> {
        self.check_step_bounds(step)?;
        self.check_step_order(step)?;
        self.history.copy_forward(step)?;

        let snapshot: Vec<N::City> = self.active.iter().cloned().collect();
        for city in &snapshot {
            intra_city_step(&mut self.history, &self.parameters, city, step)?;
        }

        let mut events = 0;
        for city in &snapshot {
            events += inter_city_step(
                &mut self.history,
                &self.network,
                &mut self.active,
                &self.parameters,
                &mut self.rng,
                city,
                step,
            )?;
        }

        if self.active.len() > snapshot.len() {
            debug!(
                "step {step}: {} newly infected cities",
                self.active.len() - snapshot.len()
            );
        }
        self.next_step = step + 1;
        Ok(events)
    }

    /// Runs steps `start_step..start_step + n` in order. Stepping continues even when no city is
    /// infected.
    ///
    /// # Errors
    ///
    /// Fails, before running any step, with `HorizonExceeded` if `start_step` is 0 or if the
    /// last step would not be below the horizon, and with `PlagueError` if `start_step` is not
    /// [`CityInfectionModel::next_step`].
    pub fn run(&mut self, n: usize, start_step: usize) -> Result<(), PlagueError> {
        if n == 0 {
            return Ok(());
        }
        let last_step = start_step.saturating_add(n - 1);
        self.check_step_bounds(start_step)?;
        self.check_step_bounds(last_step)?;
        self.check_step_order(start_step)?;

        for step in start_step..=last_step {
            self.step(step)?;
            if step % LOG_PERIOD == 0 {
                let totals = self.history.totals(step)?;
                info!(
                    "step {step}: {} infected cities, {} infected, {} dead",
                    self.active.len(),
                    totals.infected,
                    totals.dead
                );
            }
        }
        Ok(())
    }

    /// Runs every remaining step of the horizon.
    ///
    /// # Errors
    ///
    /// See [`CityInfectionModel::run`].
    pub fn run_to_horizon(&mut self) -> Result<(), PlagueError> {
        let steps = self.history.horizon() - self.next_step;
        self.run(steps, self.next_step)
    }

    /// The step the next call to `step` or `run` must start at. It equals the horizon once every
    /// step has run.
    #[must_use]
    pub fn next_step(&self) -> usize {
        self.next_step
    }

    /// The complete `[city][compartment][step]` history in a serializable form.
    #[must_use]
    pub fn export(&self) -> HistoryExport {
        HistoryExport::from(&self.history)
    }

    #[must_use]
    pub fn history(&self) -> &EpidemicHistory<N::City> {
        &self.history
    }

    /// Cities that have been infected so far, in the order they were first infected.
    #[must_use]
    pub fn active_cities(&self) -> &IndexSet<N::City> {
        &self.active
    }

    #[must_use]
    pub fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }

    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }
}
