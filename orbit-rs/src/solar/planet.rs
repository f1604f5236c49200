//! Planet data source.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Planet {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub trait SolarSystemRepository: Send + Sync {
    fn planets(&self) -> Vec<Planet>;
}

/// The nine bodies shown by the carousel, sun first.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticSolarSystem;

const PLANETS: [Planet; 9] = [
    Planet {
        name: "Sun",
        description: "The star at the centre of the solar system.",
        icon: "ic_sun",
    },
    Planet {
        name: "Mercury",
        description: "The smallest planet and the closest to the Sun.",
        icon: "ic_mercury",
    },
    Planet {
        name: "Venus",
        description: "The hottest planet, wrapped in thick clouds of sulfuric acid.",
        icon: "ic_venus",
    },
    Planet {
        name: "Earth",
        description: "The only known planet with liquid surface water and life.",
        icon: "ic_earth",
    },
    Planet {
        name: "Mars",
        description: "A cold desert world with the tallest volcano in the solar system.",
        icon: "ic_mars",
    },
    Planet {
        name: "Jupiter",
        description: "The largest planet, a gas giant with a storm older than telescopes.",
        icon: "ic_jupiter",
    },
    Planet {
        name: "Saturn",
        description: "A gas giant known for its bright ring system.",
        icon: "ic_saturn",
    },
    Planet {
        name: "Uranus",
        description: "An ice giant that rotates on its side.",
        icon: "ic_uranus",
    },
    Planet {
        name: "Neptune",
        description: "The windiest planet and the farthest from the Sun.",
        icon: "ic_neptune",
    },
];

impl SolarSystemRepository for StaticSolarSystem {
    fn planets(&self) -> Vec<Planet> {
        PLANETS.to_vec()
    }
}
