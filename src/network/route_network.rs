/*!

`RouteNetwork` stores an undirected city graph as adjacency lists of city labels, indexed by each
city's slot. Every route is stored twice, once in each endpoint's list. The kinds of each route
(trade, pilgrimage, or both) are kept separately, keyed by the ordered pair of slots.

*/

use crate::error::PlagueError;
use crate::hashing::{HashMap, HashMapExt};
use crate::network::{CityLabel, CityNetwork, RouteKind};

#[derive(Clone, Debug)]
pub struct RouteNetwork<C: CityLabel> {
    cities: Vec<C>,
    slots: HashMap<C, usize>,
    adjacency_lists: Vec<Vec<C>>,
    route_kinds: HashMap<(usize, usize), Vec<RouteKind>>,
}

impl<C: CityLabel> Default for RouteNetwork<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CityLabel> RouteNetwork<C> {
    #[must_use]
    pub fn new() -> Self {
        RouteNetwork {
            cities: Vec::new(),
            slots: HashMap::new(),
            adjacency_lists: Vec::new(),
            route_kinds: HashMap::new(),
        }
    }

    /// Adds `city` if it is not already present and returns its slot.
    pub fn add_city(&mut self, city: C) -> usize {
        if let Some(&slot) = self.slots.get(&city) {
            return slot;
        }
        let slot = self.cities.len();
        self.slots.insert(city.clone(), slot);
        self.cities.push(city);
        self.adjacency_lists.push(Vec::new());
        slot
    }

    /// Adds an undirected route of the given kind between two cities, adding the cities as
    /// needed. A second route of a different kind between the same cities records the extra kind
    /// without adding a second edge.
    ///
    /// # Errors
    ///
    /// Fails if both ends are the same city or if a route of this kind already exists.
    pub fn add_route(&mut self, city: C, neighbor: C, kind: RouteKind) -> Result<(), PlagueError> {
        if city == neighbor {
            return Err(PlagueError::PlagueError(format!(
                "Cannot make route from {city} to itself"
            )));
        }

        let city_slot = self.add_city(city.clone());
        let neighbor_slot = self.add_city(neighbor.clone());
        let key = ordered_pair(city_slot, neighbor_slot);

        match self.route_kinds.get_mut(&key) {
            Some(kinds) => {
                if kinds.contains(&kind) {
                    return Err(PlagueError::PlagueError(format!(
                        "Route {city} - {neighbor} ({kind}) already exists"
                    )));
                }
                kinds.push(kind);
            }
            None => self.connect(city_slot, neighbor_slot, vec![kind]),
        }
        Ok(())
    }

    // Inserts a new edge between two existing slots. The pair must not be connected yet.
    fn connect(&mut self, city_slot: usize, neighbor_slot: usize, kinds: Vec<RouteKind>) {
        self.route_kinds.insert(ordered_pair(city_slot, neighbor_slot), kinds);
        let city = self.cities[city_slot].clone();
        let neighbor = self.cities[neighbor_slot].clone();
        self.adjacency_lists[city_slot].push(neighbor);
        self.adjacency_lists[neighbor_slot].push(city);
    }

    /// Returns the subnetwork made of the routes having at least one of `kinds`. Only cities on
    /// such a route are included.
    #[must_use]
    pub fn restricted_to(&self, kinds: &[RouteKind]) -> RouteNetwork<C> {
        let mut pairs: Vec<(&(usize, usize), &Vec<RouteKind>)> = self.route_kinds.iter().collect();
        // Rebuild in a stable order so that city slots do not depend on hash order.
        pairs.sort_unstable_by_key(|(key, _)| **key);

        let mut subnetwork = RouteNetwork::new();
        for (&(first, second), route_kinds) in pairs {
            let selected: Vec<RouteKind> = route_kinds
                .iter()
                .filter(|kind| kinds.contains(kind))
                .copied()
                .collect();
            if selected.is_empty() {
                continue;
            }
            let first = subnetwork.add_city(self.cities[first].clone());
            let second = subnetwork.add_city(self.cities[second].clone());
            subnetwork.connect(first, second, selected);
        }
        subnetwork
    }

    #[must_use]
    pub fn contains_city(&self, city: &C) -> bool {
        self.slots.contains_key(city)
    }

    #[must_use]
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.route_kinds.len()
    }

    /// The kinds of the route between two cities, or `None` if they are not connected.
    #[must_use]
    pub fn route_kinds(&self, city: &C, neighbor: &C) -> Option<&[RouteKind]> {
        let city_slot = *self.slots.get(city)?;
        let neighbor_slot = *self.slots.get(neighbor)?;
        self.route_kinds
            .get(&ordered_pair(city_slot, neighbor_slot))
            .map(Vec::as_slice)
    }

    /// The number of routes touching `city`, or `None` for an unknown city.
    #[must_use]
    pub fn degree(&self, city: &C) -> Option<usize> {
        self.slots
            .get(city)
            .map(|slot| self.adjacency_lists[*slot].len())
    }

    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        if self.cities.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = (2 * self.route_count()) as f64 / self.cities.len() as f64;
        mean
    }

    /// Returns the cities having exactly the given number of routes.
    #[must_use]
    pub fn cities_with_degree(&self, degree: usize) -> Vec<&C> {
        self.adjacency_lists
            .iter()
            .enumerate()
            .filter_map(|(slot, routes)| (routes.len() == degree).then_some(&self.cities[slot]))
            .collect()
    }
}

impl<C: CityLabel> CityNetwork for RouteNetwork<C> {
    type City = C;

    fn cities(&self) -> &[C] {
        &self.cities
    }

    fn neighbors(&self, city: &C) -> &[C] {
        match self.slots.get(city) {
            Some(slot) => &self.adjacency_lists[*slot],
            None => &[],
        }
    }
}

fn ordered_pair(first: usize, second: usize) -> (usize, usize) {
    if first < second {
        (first, second)
    } else {
        (second, first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_network() -> RouteNetwork<&'static str> {
        let mut network = RouteNetwork::new();
        network.add_route("Paris", "Lyon", RouteKind::Trade).unwrap();
        network.add_route("Lyon", "Rome", RouteKind::Pilgrimage).unwrap();
        network.add_route("Paris", "Rome", RouteKind::Pilgrimage).unwrap();
        network.add_route("Lyon", "Paris", RouteKind::Pilgrimage).unwrap();
        network
    }

    #[test]
    fn routes_are_undirected() {
        let network = sample_network();
        assert_eq!(network.neighbors(&"Paris"), &["Lyon", "Rome"]);
        assert_eq!(network.neighbors(&"Lyon"), &["Paris", "Rome"]);
        assert_eq!(network.neighbors(&"Rome"), &["Lyon", "Paris"]);
        assert_eq!(network.cities(), &["Paris", "Lyon", "Rome"]);
    }

    #[test]
    fn second_kind_does_not_duplicate_edge() {
        let network = sample_network();
        assert_eq!(network.route_count(), 3);
        assert_eq!(network.degree(&"Paris"), Some(2));
        assert_eq!(
            network.route_kinds(&"Lyon", &"Paris"),
            Some(&[RouteKind::Trade, RouteKind::Pilgrimage][..])
        );
    }

    #[test]
    fn cannot_route_to_self() {
        let mut network = RouteNetwork::new();
        let result = network.add_route("Paris", "Paris", RouteKind::Trade);
        assert!(matches!(result, Err(PlagueError::PlagueError(_))));
        assert_eq!(network.city_count(), 0);
    }

    #[test]
    fn duplicate_route_is_an_error() {
        let mut network = sample_network();
        let result = network.add_route("Lyon", "Paris", RouteKind::Trade);
        assert!(matches!(result, Err(PlagueError::PlagueError(_))));
        assert_eq!(network.route_count(), 3);
    }

    #[test]
    fn unknown_city_has_no_neighbors() {
        let network = sample_network();
        assert!(network.neighbors(&"Atlantis").is_empty());
        assert_eq!(network.degree(&"Atlantis"), None);
        assert!(!network.contains_city(&"Atlantis"));
    }

    #[test]
    fn restricted_networks() {
        let network = sample_network();

        let trade = network.restricted_to(&[RouteKind::Trade]);
        assert_eq!(trade.route_count(), 1);
        assert_eq!(trade.city_count(), 2);
        assert!(!trade.contains_city(&"Rome"));

        let pilgrimage = network.restricted_to(&[RouteKind::Pilgrimage]);
        assert_eq!(pilgrimage.route_count(), 3);
        assert_eq!(pilgrimage.city_count(), 3);

        let combined = network.restricted_to(&[RouteKind::Trade, RouteKind::Pilgrimage]);
        assert_eq!(combined.route_count(), network.route_count());
        assert_eq!(
            combined.route_kinds(&"Paris", &"Lyon"),
            Some(&[RouteKind::Trade, RouteKind::Pilgrimage][..])
        );
        for city in network.cities() {
            let mut expected = network.neighbors(city).to_vec();
            let mut actual = combined.neighbors(city).to_vec();
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected);
        }
        assert_eq!(
            trade.route_kinds(&"Lyon", &"Paris"),
            Some(&[RouteKind::Trade][..])
        );
    }

    #[test]
    fn degree_statistics() {
        let mut network = sample_network();
        network.add_city("Cordoba");
        assert_eq!(network.cities_with_degree(0), vec![&"Cordoba"]);
        assert_eq!(network.cities_with_degree(2).len(), 3);
        assert!((network.mean_degree() - 1.5).abs() < f64::EPSILON);
    }
}
