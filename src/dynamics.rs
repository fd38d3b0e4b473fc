//! The two per-city updates applied every step: the epidemic inside a city, and its spread
//! along routes to neighboring cities. Both operate on a step whose state was already copied
//! forward from the previous step.

use indexmap::IndexSet;
use log::trace;
use rand::Rng;

use crate::error::PlagueError;
use crate::history::{Count, EpidemicHistory};
use crate::network::{CityLabel, CityNetwork};
use crate::parameters::ModelParameters;
use crate::random::toss;

/// `floor(count * rate)`, saturating at the bounds of `Count`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled(count: Count, rate: f64) -> Count {
    (f64::from(count) * rate) as Count
}

/// Advances the epidemic inside `city` at `step`.
///
/// New infections and deaths are both derived from the infected count read before either is
/// applied. A city with no susceptible people left gets no new infections.
///
/// # Errors
///
/// Fails for an unknown city or a step outside the horizon.
pub fn intra_city_step<C: CityLabel>(
    history: &mut EpidemicHistory<C>,
    parameters: &ModelParameters,
    city: &C,
    step: usize,
) -> Result<(), PlagueError> {
    let counts = history.counts(city, step)?;

    let to_infect = if counts.susceptible > 0 {
        scaled(counts.infected, parameters.infection_rate)
    } else {
        0
    };
    let to_die = scaled(counts.infected, parameters.mortality_rate);

    history.seed_infection(city, step, to_infect)?;
    history.kill(city, step, to_die)?;
    Ok(())
}

/// Spreads the epidemic from `city` to its neighbors at `step`.
///
/// Each neighbor gets one independent trial with probability `transmission_rate * I`, where `I`
/// is the absolute infected count of `city`. The probability is not clamped. Each success infects
/// exactly one person in the neighbor, counts one event for `city`, and adds the neighbor to
/// `active`. Returns the number of successful trials.
///
/// # Errors
///
/// Fails for an unknown city or a step outside the horizon.
pub fn inter_city_step<N, R>(
    history: &mut EpidemicHistory<N::City>,
    network: &N,
    active: &mut IndexSet<N::City>,
    parameters: &ModelParameters,
    rng: &mut R,
    city: &N::City,
    step: usize,
) -> Result<usize, PlagueError>
where
    N: CityNetwork + ?Sized,
    R: Rng,
{
    let infected = history.counts(city, step)?.infected;
    let p_transmission = parameters.transmission_rate * f64::from(infected);

    let mut events = 0;
    for neighbor in network.neighbors(city) {
        if toss(rng, p_transmission) {
            trace!("transmitting from {city} to {neighbor} at step {step}");
            history.seed_infection(neighbor, step, 1)?;
            history.record_transmission_event(city, step)?;
            active.insert(neighbor.clone());
            events += 1;
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{CityCounts, Compartment, DEFAULT_POPULATION};
    use crate::network::{RouteKind, RouteNetwork};
    use crate::random::{define_rng, rng_from_seed};
    use rand::RngCore;

    define_rng!(DynamicsTestRng);

    /// Yields all-zero bits, so every uniform draw is 0.0 and every trial with `p > 0` succeeds.
    struct AlwaysRng;

    impl RngCore for AlwaysRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn single_city(infected: Count) -> EpidemicHistory<&'static str> {
        let mut history = EpidemicHistory::new(["Paris"], 2, DEFAULT_POPULATION).unwrap();
        history.seed_infection(&"Paris", 0, infected).unwrap();
        history
    }

    #[test]
    fn intra_city_scenario() {
        // 100 susceptible, 10 infected, 0 dead
        let mut history = EpidemicHistory::new(["Paris"], 2, 110).unwrap();
        history.seed_infection(&"Paris", 0, 10).unwrap();
        assert_eq!(history.counts(&"Paris", 0).unwrap().susceptible, 100);

        intra_city_step(&mut history, &ModelParameters::default(), &"Paris", 0).unwrap();
        assert_eq!(
            history.counts(&"Paris", 0).unwrap(),
            CityCounts {
                susceptible: 98,
                infected: 10,
                dead: 2,
                transmission_events: 0,
            }
        );
    }

    #[test]
    fn intra_city_truncates_rates() {
        let mut history = single_city(4);
        intra_city_step(&mut history, &ModelParameters::default(), &"Paris", 0).unwrap();
        // floor(4 * 0.2) == 0
        let counts = history.counts(&"Paris", 0).unwrap();
        assert_eq!((counts.susceptible, counts.infected, counts.dead), (96, 4, 0));
    }

    #[test]
    fn no_new_infections_without_susceptibles() {
        let mut history = EpidemicHistory::new(["Paris"], 2, 20).unwrap();
        history.seed_infection(&"Paris", 0, 20).unwrap();
        intra_city_step(&mut history, &ModelParameters::default(), &"Paris", 0).unwrap();
        let counts = history.counts(&"Paris", 0).unwrap();
        assert_eq!((counts.susceptible, counts.infected, counts.dead), (0, 16, 4));
    }

    #[test]
    fn intra_city_without_infected_is_a_no_op() {
        let mut history = single_city(0);
        intra_city_step(&mut history, &ModelParameters::from((1.0, 1.0, 1.0)), &"Paris", 0)
            .unwrap();
        assert_eq!(history.counts(&"Paris", 0).unwrap().susceptible, 100);
    }

    #[test]
    fn transmission_scenario() {
        let mut network = RouteNetwork::new();
        network.add_route("A", "B", RouteKind::Trade).unwrap();
        let mut history = EpidemicHistory::new(["A", "B"], 2, DEFAULT_POPULATION).unwrap();
        history.seed_infection(&"A", 0, 5).unwrap();
        let mut active = IndexSet::from(["A"]);

        let events = inter_city_step(
            &mut history,
            &network,
            &mut active,
            &ModelParameters::from((0.2, 0.2, 1.0)),
            &mut AlwaysRng,
            &"A",
            0,
        )
        .unwrap();

        assert_eq!(events, 1);
        assert_eq!(history.get(&"B", Compartment::Infected, 0).unwrap(), 1);
        assert_eq!(history.get(&"B", Compartment::Susceptible, 0).unwrap(), 99);
        assert_eq!(history.get(&"A", Compartment::TransmissionEvents, 0).unwrap(), 1);
        assert_eq!(history.get(&"A", Compartment::Infected, 0).unwrap(), 5);
        assert!(active.contains(&"B"));
    }

    #[test]
    fn one_trial_per_neighbor() {
        let mut network = RouteNetwork::new();
        for neighbor in ["B", "C", "D"] {
            network.add_route("A", neighbor, RouteKind::Pilgrimage).unwrap();
        }
        let mut history = EpidemicHistory::new(network.cities().to_vec(), 2, 100).unwrap();
        history.seed_infection(&"A", 0, 50).unwrap();
        let mut active = IndexSet::from(["A"]);

        let events = inter_city_step(
            &mut history,
            &network,
            &mut active,
            &ModelParameters::default(),
            &mut AlwaysRng,
            &"A",
            0,
        )
        .unwrap();

        assert_eq!(events, 3);
        assert_eq!(history.get(&"A", Compartment::TransmissionEvents, 0).unwrap(), 3);
        for neighbor in ["B", "C", "D"] {
            assert_eq!(history.get(&neighbor, Compartment::Infected, 0).unwrap(), 1);
        }
        assert_eq!(active.len(), 4);
    }

    #[test]
    fn no_transmission_without_infected() {
        let mut network = RouteNetwork::new();
        network.add_route("A", "B", RouteKind::Trade).unwrap();
        let mut history = EpidemicHistory::new(["A", "B"], 2, 100).unwrap();
        let mut active = IndexSet::new();
        let mut rng = rng_from_seed::<DynamicsTestRng>(42);

        let events = inter_city_step(
            &mut history,
            &network,
            &mut active,
            &ModelParameters::from((0.2, 0.2, 1.0)),
            &mut rng,
            &"A",
            0,
        )
        .unwrap();

        assert_eq!(events, 0);
        assert!(active.is_empty());
        assert_eq!(history.get(&"B", Compartment::Susceptible, 0).unwrap(), 100);
    }

    #[test]
    fn neighbor_outside_history_is_an_error() {
        let mut network = RouteNetwork::new();
        network.add_route("A", "B", RouteKind::Trade).unwrap();
        let mut history = EpidemicHistory::new(["A"], 2, 100).unwrap();
        history.seed_infection(&"A", 0, 5).unwrap();
        let mut active = IndexSet::new();

        let result = inter_city_step(
            &mut history,
            &network,
            &mut active,
            &ModelParameters::default(),
            &mut AlwaysRng,
            &"A",
            0,
        );
        assert!(matches!(result, Err(PlagueError::UnknownCity(ref city)) if city == "B"));
    }
}
