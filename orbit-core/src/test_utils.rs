//! Helpers for tests that touch the process-wide container.

use crate::container::global;

/// Empty the process-wide container: holders, registrations and exclusions.
pub fn reset_global() {
    global().shutdown_and_clear_all();
}
