//! Solar-system demo: the components the app registers at startup and a scripted navigation tour.

pub mod components;
pub mod planet;
pub mod tour;

use std::sync::Arc;

use orbit_core::{Params, StoreError};

use crate::core::{Application, Module};
pub use components::{
    AppApi, AppComponent, DetailComponent, MainComponent, Router, Screen, SolarSystemApi,
    SolarSystemComponent,
};
pub use planet::{Planet, SolarSystemRepository, StaticSolarSystem};
pub use tour::{run_tour, TourStep};

type RepositoryFactory = Arc<dyn Fn() -> Box<dyn SolarSystemRepository> + Send + Sync>;

/// Registers `AppComponent`, `SolarSystemComponent`, `MainComponent` (child of the solar
/// system) and `DetailComponent` (child of the solar system, params = planet index).
pub struct SolarModule {
    repository: RepositoryFactory,
}

impl SolarModule {
    pub fn new() -> Self {
        Self::with_repository(|| Box::new(StaticSolarSystem))
    }

    pub fn with_repository<F>(repository: F) -> Self
    where
        F: Fn() -> Box<dyn SolarSystemRepository> + Send + Sync + 'static,
    {
        Self {
            repository: Arc::new(repository),
        }
    }
}

impl Default for SolarModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for SolarModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), StoreError> {
        let container = app.container();

        container.component::<AppComponent>().provide(AppComponent::new)?;

        let repository = Arc::clone(&self.repository);
        container
            .component::<SolarSystemComponent>()
            .provide(move || SolarSystemComponent::new(repository()))?;

        let weak = container.downgrade();
        container
            .component::<MainComponent>()
            .child_of::<dyn SolarSystemApi>()
            .parent_params(|_| Params::none())
            .try_provide(move |solar| {
                let container = weak
                    .upgrade()
                    .ok_or_else(|| StoreError::Construction("container dropped".into()))?;
                let app = container.get::<dyn AppApi>()?;
                Ok(MainComponent::new(solar.planets(), app))
            })?;

        container
            .component::<DetailComponent>()
            .child_of::<dyn SolarSystemApi>()
            .parent_params(|_| Params::none())
            .try_provide_with_params(|solar, index: &usize| {
                let planet = solar.planet(*index).ok_or_else(|| {
                    StoreError::Construction(format!("no planet at index {index}"))
                })?;
                Ok(DetailComponent::new(*index, planet))
            })?;

        tracing::debug!("solar module registered");
        Ok(())
    }
}
