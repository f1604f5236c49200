//! Scripted walk through the app: carousel, detail screen, back-stack re-entry, configuration
//! change and back navigation, recording the container state after each step.

use std::sync::Arc;

use orbit_core::{Params, StoreError, StoreStats};
use serde::Serialize;

use super::components::{AppApi, DetailComponent, MainComponent, Screen};
use crate::core::Application;
use crate::lifecycle::{LinkStats, RetainedOwner, ScopeLifecycle};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TourStep {
    pub step: &'static str,
    pub screen: Screen,
    pub stats: StoreStats,
    pub scoped_bindings: usize,
    pub retained: LinkStats,
}

struct Recorder<'a> {
    app: &'a Application,
    router: Arc<dyn AppApi>,
    steps: Vec<TourStep>,
}

impl Recorder<'_> {
    fn record(&mut self, step: &'static str) {
        let entry = TourStep {
            step,
            screen: self.router.router().current(),
            stats: self.app.container().stats(),
            scoped_bindings: self.app.binder().scoped_bindings(),
            retained: self.app.binder().retained_stats(),
        };
        tracing::info!(step, holders = entry.stats.holders, "tour step");
        self.steps.push(entry);
    }
}

/// Run the tour on an application with `SolarModule` registered. `planet` is the carousel
/// index opened on the detail screen.
pub fn run_tour(app: &Application, planet: usize) -> Result<Vec<TourStep>, StoreError> {
    let mut recorder = Recorder {
        app,
        router: app.container().get::<dyn AppApi>()?,
        steps: Vec::new(),
    };
    recorder.record("start");

    let main_owner = RetainedOwner::new();
    let main = app.retained::<MainComponent>(Params::none(), &main_owner)?;
    recorder.record("open carousel");

    main.open_detail(planet);
    let detail_scope = ScopeLifecycle::with_id(format!("detail/{planet}"));
    let detail = app.scoped::<DetailComponent>(Params::new(planet), &detail_scope)?;
    recorder.record("open detail");

    // Returning to the same back-stack entry binds the same scope again.
    let reentered = app.scoped::<DetailComponent>(Params::new(planet), &detail_scope)?;
    if reentered.id() != detail.id() {
        tracing::warn!("detail screen rebuilt on re-entry");
    }
    recorder.record("re-enter detail");

    let recreated_owner = RetainedOwner::new();
    app.retained::<MainComponent>(Params::none(), &recreated_owner)?;
    main_owner.close();
    recorder.record("configuration change");

    recorder.router.router().back();
    detail_scope.destroy();
    recorder.record("back");

    recreated_owner.close();
    recorder.record("leave carousel");

    Ok(recorder.steps)
}
