/*!

`EpidemicHistory` is the full trace of a simulation: for every city, every compartment and every
time step, a small count. The whole horizon is allocated up front as one flat buffer laid out as
`[city][compartment][step]` and is never resized, so stepping past the horizon is an error rather
than a reallocation.

Population only moves `Susceptible -> Infected -> Dead`. Every mutation clamps to what is available
in the source compartment, so no compartment can go negative and `S + I + D` stays equal to the
city's initial population.

*/

use serde::Serialize;
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

use crate::error::PlagueError;
use crate::hashing::{HashMap, HashMapExt};
use crate::network::CityLabel;

/// The cell type of the history buffer. Populations in this model are small fixed numbers.
pub type Count = u8;

/// The susceptible population of every city at step 0 unless configured otherwise.
pub const DEFAULT_POPULATION: Count = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, EnumCount, Display)]
pub enum Compartment {
    #[strum(serialize = "S")]
    Susceptible,
    #[strum(serialize = "I")]
    Infected,
    #[strum(serialize = "D")]
    Dead,
    /// Transmission events originating from the city during the step. Not a population.
    #[strum(serialize = "Itimes")]
    TransmissionEvents,
}

impl Compartment {
    fn offset(self) -> usize {
        self as usize
    }
}

/// The counts of one city at one step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CityCounts {
    pub susceptible: Count,
    pub infected: Count,
    pub dead: Count,
    pub transmission_events: Count,
}

impl CityCounts {
    #[must_use]
    pub fn population(&self) -> u32 {
        u32::from(self.susceptible) + u32::from(self.infected) + u32::from(self.dead)
    }
}

/// Compartment sums across all cities at one step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub susceptible: u64,
    pub infected: u64,
    pub dead: u64,
    pub transmission_events: u64,
}

#[derive(Clone, Debug)]
pub struct EpidemicHistory<C: CityLabel> {
    cities: Vec<C>,
    city_slots: HashMap<C, usize>,
    horizon: usize,
    population: Count,
    counts: Vec<Count>,
}

impl<C: CityLabel> EpidemicHistory<C> {
    /// Allocates the history of `cities` for `horizon` steps with every city fully susceptible
    /// at step 0. Duplicate labels share the slot of their first occurrence.
    ///
    /// # Errors
    ///
    /// Fails if `horizon` is zero.
    pub fn new(
        cities: impl IntoIterator<Item = C>,
        horizon: usize,
        population: Count,
    ) -> Result<Self, PlagueError> {
        if horizon == 0 {
            return Err(PlagueError::InvalidParameter(
                "the horizon must be at least one step".to_string(),
            ));
        }

        let mut city_slots: HashMap<C, usize> = HashMap::new();
        let mut unique_cities = Vec::new();
        for city in cities {
            if !city_slots.contains_key(&city) {
                city_slots.insert(city.clone(), unique_cities.len());
                unique_cities.push(city);
            }
        }

        let mut history = EpidemicHistory {
            counts: vec![0; unique_cities.len() * Compartment::COUNT * horizon],
            cities: unique_cities,
            city_slots,
            horizon,
            population,
        };
        for slot in 0..history.cities.len() {
            let index = history.index(slot, Compartment::Susceptible, 0);
            history.counts[index] = population;
        }
        Ok(history)
    }

    #[must_use]
    pub fn cities(&self) -> &[C] {
        &self.cities
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// The fixed population of every city.
    #[must_use]
    pub fn population(&self) -> Count {
        self.population
    }

    /// The slot of `city` in the buffer.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownCity` if the city was not part of the history's cities.
    pub fn city_index(&self, city: &C) -> Result<usize, PlagueError> {
        self.city_slots
            .get(city)
            .copied()
            .ok_or_else(|| PlagueError::UnknownCity(city.to_string()))
    }

    fn check_step(&self, step: usize) -> Result<(), PlagueError> {
        if step >= self.horizon {
            return Err(PlagueError::HorizonExceeded {
                step,
                horizon: self.horizon,
            });
        }
        Ok(())
    }

    fn index(&self, slot: usize, compartment: Compartment, step: usize) -> usize {
        (slot * Compartment::COUNT + compartment.offset()) * self.horizon + step
    }

    fn locate(
        &self,
        city: &C,
        compartment: Compartment,
        step: usize,
    ) -> Result<usize, PlagueError> {
        let slot = self.city_index(city)?;
        self.check_step(step)?;
        Ok(self.index(slot, compartment, step))
    }

    /// # Errors
    ///
    /// Fails for an unknown city or a step outside the horizon.
    pub fn get(&self, city: &C, compartment: Compartment, step: usize) -> Result<Count, PlagueError> {
        Ok(self.counts[self.locate(city, compartment, step)?])
    }

    /// # Errors
    ///
    /// Fails for an unknown city or a step outside the horizon.
    pub fn counts(&self, city: &C, step: usize) -> Result<CityCounts, PlagueError> {
        let slot = self.city_index(city)?;
        self.check_step(step)?;
        Ok(self.counts_at(slot, step))
    }

    fn counts_at(&self, slot: usize, step: usize) -> CityCounts {
        CityCounts {
            susceptible: self.counts[self.index(slot, Compartment::Susceptible, step)],
            infected: self.counts[self.index(slot, Compartment::Infected, step)],
            dead: self.counts[self.index(slot, Compartment::Dead, step)],
            transmission_events: self.counts[self.index(slot, Compartment::TransmissionEvents, step)],
        }
    }

    /// The whole time series of one compartment of one city.
    ///
    /// # Errors
    ///
    /// Fails for an unknown city.
    pub fn series(&self, city: &C, compartment: Compartment) -> Result<&[Count], PlagueError> {
        let slot = self.city_index(city)?;
        let start = self.index(slot, compartment, 0);
        Ok(&self.counts[start..start + self.horizon])
    }

    /// Compartment sums across all cities at `step`.
    ///
    /// # Errors
    ///
    /// Fails for a step outside the horizon.
    pub fn totals(&self, step: usize) -> Result<Totals, PlagueError> {
        self.check_step(step)?;
        let mut totals = Totals::default();
        for slot in 0..self.cities.len() {
            let counts = self.counts_at(slot, step);
            totals.susceptible += u64::from(counts.susceptible);
            totals.infected += u64::from(counts.infected);
            totals.dead += u64::from(counts.dead);
            totals.transmission_events += u64::from(counts.transmission_events);
        }
        Ok(totals)
    }

    /// Moves `from` to `to` for up to `count` people, clamped to what `from` holds. Returns the
    /// number of people moved.
    fn transfer(
        &mut self,
        city: &C,
        step: usize,
        from: Compartment,
        to: Compartment,
        count: Count,
    ) -> Result<Count, PlagueError> {
        let source = self.locate(city, from, step)?;
        let destination = self.locate(city, to, step)?;
        let moved = count.min(self.counts[source]);
        self.counts[source] -= moved;
        self.counts[destination] += moved;
        Ok(moved)
    }

    /// Moves up to `count` people of `city` from susceptible to infected at `step`. Returns the
    /// number actually infected, which is less than `count` when fewer are susceptible.
    ///
    /// # Errors
    ///
    /// Fails for an unknown city or a step outside the horizon.
    pub fn seed_infection(&mut self, city: &C, step: usize, count: Count) -> Result<Count, PlagueError> {
        self.transfer(city, step, Compartment::Susceptible, Compartment::Infected, count)
    }

    /// Moves up to `count` people of `city` from infected to dead at `step`. Returns the number
    /// actually killed.
    ///
    /// # Errors
    ///
    /// Fails for an unknown city or a step outside the horizon.
    pub fn kill(&mut self, city: &C, step: usize, count: Count) -> Result<Count, PlagueError> {
        self.transfer(city, step, Compartment::Infected, Compartment::Dead, count)
    }

    /// Counts one transmission event originating from `city` at `step`. The counter saturates.
    ///
    /// # Errors
    ///
    /// Fails for an unknown city or a step outside the horizon.
    pub fn record_transmission_event(&mut self, city: &C, step: usize) -> Result<(), PlagueError> {
        let index = self.locate(city, Compartment::TransmissionEvents, step)?;
        self.counts[index] = self.counts[index].saturating_add(1);
        Ok(())
    }

    /// Copies `S`, `I` and `D` of every city from `step - 1` into `step` and clears the
    /// transmission counter of `step`. Must precede any other mutation of `step`.
    ///
    /// # Errors
    ///
    /// Fails with `HorizonExceeded` if `step` is outside the horizon or is step 0, which has no
    /// previous step.
    pub fn copy_forward(&mut self, step: usize) -> Result<(), PlagueError> {
        self.check_step(step)?;
        if step == 0 {
            return Err(PlagueError::HorizonExceeded {
                step,
                horizon: self.horizon,
            });
        }
        for slot in 0..self.cities.len() {
            for compartment in Compartment::iter() {
                let value = match compartment {
                    Compartment::TransmissionEvents => 0,
                    _ => self.counts[self.index(slot, compartment, step - 1)],
                };
                let index = self.index(slot, compartment, step);
                self.counts[index] = value;
            }
        }
        Ok(())
    }

    /// The buffer as nested `[city][compartment][step]` vectors.
    #[must_use]
    pub fn to_nested(&self) -> Vec<Vec<Vec<Count>>> {
        self.counts
            .chunks(Compartment::COUNT * self.horizon)
            .map(|city| city.chunks(self.horizon).map(<[Count]>::to_vec).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(horizon: usize) -> EpidemicHistory<&'static str> {
        EpidemicHistory::new(["Paris", "Lyon"], horizon, DEFAULT_POPULATION).unwrap()
    }

    #[test]
    fn initial_state() {
        let history = history(3);
        for city in ["Paris", "Lyon"] {
            assert_eq!(
                history.counts(&city, 0).unwrap(),
                CityCounts {
                    susceptible: 100,
                    ..CityCounts::default()
                }
            );
            assert_eq!(history.counts(&city, 1).unwrap(), CityCounts::default());
        }
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let result = EpidemicHistory::new(["Paris"], 0, DEFAULT_POPULATION);
        assert!(matches!(result, Err(PlagueError::InvalidParameter(_))));
    }

    #[test]
    fn duplicate_cities_share_a_slot() {
        let history = EpidemicHistory::new(["Paris", "Lyon", "Paris"], 2, 100).unwrap();
        assert_eq!(history.cities(), &["Paris", "Lyon"]);
        assert_eq!(history.city_index(&"Lyon").unwrap(), 1);
    }

    #[test]
    fn seed_infection_clamps_to_susceptible() {
        let mut history = EpidemicHistory::new(["Paris"], 2, 5).unwrap();
        assert_eq!(history.seed_infection(&"Paris", 0, 3).unwrap(), 3);
        assert_eq!(history.seed_infection(&"Paris", 0, 200).unwrap(), 2);

        let counts = history.counts(&"Paris", 0).unwrap();
        assert_eq!(counts.susceptible, 0);
        assert_eq!(counts.infected, 5);
        assert_eq!(counts.population(), 5);
    }

    #[test]
    fn kill_clamps_to_infected() {
        let mut history = history(2);
        history.seed_infection(&"Lyon", 0, 4).unwrap();
        assert_eq!(history.kill(&"Lyon", 0, 10).unwrap(), 4);

        let counts = history.counts(&"Lyon", 0).unwrap();
        assert_eq!((counts.susceptible, counts.infected, counts.dead), (96, 0, 4));
    }

    #[test]
    fn transmission_counter_saturates() {
        let mut history = history(2);
        for _ in 0..300 {
            history.record_transmission_event(&"Paris", 0).unwrap();
        }
        assert_eq!(
            history.get(&"Paris", Compartment::TransmissionEvents, 0).unwrap(),
            Count::MAX
        );
        assert_eq!(history.get(&"Paris", Compartment::Susceptible, 0).unwrap(), 100);
    }

    #[test]
    fn copy_forward_copies_populations_and_clears_events() {
        let mut history = history(3);
        history.seed_infection(&"Paris", 0, 10).unwrap();
        history.kill(&"Paris", 0, 2).unwrap();
        history.record_transmission_event(&"Paris", 0).unwrap();

        history.copy_forward(1).unwrap();
        for city in ["Paris", "Lyon"] {
            let previous = history.counts(&city, 0).unwrap();
            let current = history.counts(&city, 1).unwrap();
            assert_eq!(current.susceptible, previous.susceptible);
            assert_eq!(current.infected, previous.infected);
            assert_eq!(current.dead, previous.dead);
            assert_eq!(current.transmission_events, 0);
        }
    }

    #[test]
    fn copy_forward_bounds() {
        let mut history = history(3);
        assert!(matches!(
            history.copy_forward(0),
            Err(PlagueError::HorizonExceeded { step: 0, horizon: 3 })
        ));
        assert!(matches!(
            history.copy_forward(3),
            Err(PlagueError::HorizonExceeded { step: 3, horizon: 3 })
        ));
    }

    #[test]
    fn unknown_city_and_out_of_range_step() {
        let mut history = history(2);
        assert!(matches!(
            history.seed_infection(&"Atlantis", 0, 1),
            Err(PlagueError::UnknownCity(ref city)) if city == "Atlantis"
        ));
        assert!(matches!(
            history.kill(&"Paris", 2, 1),
            Err(PlagueError::HorizonExceeded { step: 2, horizon: 2 })
        ));
        assert!(history.get(&"Lyon", Compartment::Dead, 5).is_err());
    }

    #[test]
    fn series_and_totals() {
        let mut history = history(3);
        history.seed_infection(&"Paris", 0, 10).unwrap();
        history.copy_forward(1).unwrap();
        history.kill(&"Paris", 1, 1).unwrap();

        assert_eq!(
            history.series(&"Paris", Compartment::Infected).unwrap(),
            &[10, 9, 0]
        );
        assert_eq!(
            history.totals(1).unwrap(),
            Totals {
                susceptible: 190,
                infected: 9,
                dead: 1,
                transmission_events: 0,
            }
        );
    }

    #[test]
    fn nested_layout() {
        let mut history = history(2);
        history.seed_infection(&"Lyon", 0, 7).unwrap();
        let nested = history.to_nested();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0], vec![vec![100, 0], vec![0, 0], vec![0, 0], vec![0, 0]]);
        assert_eq!(nested[1][0], vec![93, 0]);
        assert_eq!(nested[1][1], vec![7, 0]);
    }
}
