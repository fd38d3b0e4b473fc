//! The topology the epidemic spreads over.
//!
//! A network is an undirected graph whose nodes are city labels and whose edges are trade or
//! pilgrimage routes. The simulation only ever reads a network through the [`CityNetwork`]
//! trait: the ordered sequence of cities, and the neighbors of a given city.

mod route_network;

use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter};

pub use route_network::RouteNetwork;

/// Anything usable as a city label: a name, an integer id, etc.
pub trait CityLabel: Clone + Eq + Hash + Debug + Display + 'static {}

impl<T: Clone + Eq + Hash + Debug + Display + 'static> CityLabel for T {}

/// Read-only view of a city network.
pub trait CityNetwork {
    type City: CityLabel;

    /// All cities, in a stable order. This order fixes each city's slot in the history buffer.
    fn cities(&self) -> &[Self::City];

    /// The neighbors of `city`. A city the network does not know has no neighbors.
    fn neighbors(&self, city: &Self::City) -> &[Self::City];
}

impl<N: CityNetwork + ?Sized> CityNetwork for &N {
    type City = N::City;

    fn cities(&self) -> &[Self::City] {
        (**self).cities()
    }

    fn neighbors(&self, city: &Self::City) -> &[Self::City] {
        (**self).neighbors(city)
    }
}

/// What a route is used for.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
    StrumDisplay,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouteKind {
    #[serde(alias = "trd")]
    Trade,
    #[serde(alias = "plg")]
    Pilgrimage,
}
