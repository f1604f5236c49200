//! Module: a group of registrations applied to an application at startup.

use orbit_core::StoreError;

use super::app::Application;

/// Module: registers its components into the application's container.
pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), StoreError>;
}
