//! Components of the solar-system app: app-wide services, the planet data component and the
//! two screen components built on it.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::planet::{Planet, SolarSystemRepository};
use crate::{Alias, Component};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "planet", rename_all = "snake_case")]
pub enum Screen {
    Main,
    Detail(usize),
}

/// Back stack of screens; never empty.
#[derive(Debug)]
pub struct Router {
    stack: Mutex<Vec<Screen>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(vec![Screen::Main]),
        }
    }

    pub fn navigate_to(&self, screen: Screen) {
        tracing::debug!(?screen, "navigate");
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(screen);
    }

    /// Pop the current screen. Returns the screen left, or `None` on the root screen.
    pub fn back(&self) -> Option<Screen> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        if stack.len() > 1 {
            stack.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> Screen {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
            .unwrap_or(Screen::Main)
    }

    pub fn depth(&self) -> usize {
        self.stack
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

pub trait AppApi: Send + Sync {
    fn router(&self) -> &Router;
}

#[derive(Debug, Default, Component)]
#[component(aliases(dyn AppApi))]
pub struct AppComponent {
    router: Router,
}

impl AppComponent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AppApi for AppComponent {
    fn router(&self) -> &Router {
        &self.router
    }
}

pub trait SolarSystemApi: Send + Sync {
    fn planets(&self) -> Vec<Planet>;

    fn planet(&self, index: usize) -> Option<Planet> {
        self.planets().into_iter().nth(index)
    }
}

#[derive(Component)]
#[component(aliases(dyn SolarSystemApi))]
pub struct SolarSystemComponent {
    repository: Box<dyn SolarSystemRepository>,
}

impl SolarSystemComponent {
    pub fn new(repository: Box<dyn SolarSystemRepository>) -> Self {
        Self { repository }
    }
}

impl SolarSystemApi for SolarSystemComponent {
    fn planets(&self) -> Vec<Planet> {
        self.repository.planets()
    }
}

/// Carousel screen.
#[derive(Component)]
pub struct MainComponent {
    planets: Vec<Planet>,
    app: Arc<dyn AppApi>,
}

impl MainComponent {
    pub fn new(planets: Vec<Planet>, app: Arc<dyn AppApi>) -> Self {
        Self { planets, app }
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn open_detail(&self, index: usize) -> Screen {
        let screen = Screen::Detail(index);
        self.app.router().navigate_to(screen);
        screen
    }
}

/// Detail screen for one planet, keyed by its carousel index.
#[derive(Debug, Component)]
pub struct DetailComponent {
    index: usize,
    planet: Planet,
}

impl DetailComponent {
    pub fn new(index: usize, planet: Planet) -> Self {
        Self { index, planet }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn planet(&self) -> &Planet {
        &self.planet
    }
}
