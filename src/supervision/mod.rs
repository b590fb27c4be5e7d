//! Supervision: links, monitors, and exit-notification delivery.
//!
//! Links are bidirectional (two pool entries, one in each peer's list) and
//! symmetric; monitors are unidirectional (one entry in the target's watcher
//! list, a reference returned to the observer). Both deliver a System-class
//! exit message when the watched actor dies.

pub mod exit;
pub mod links;
pub mod monitors;

pub use exit::{decode_exit, is_exit};
pub use links::{link, unlink};
pub use monitors::{demonitor, monitor};
