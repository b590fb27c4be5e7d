//! Runtime event observation.
//!
//! The runtime reports lifecycle and fault events through a pluggable
//! [`RuntimeMonitor`]. The default sink discards everything; tests and
//! embedders that want visibility install an [`InMemoryMonitor`] (or their
//! own sink) with [`install`].

pub mod events;
pub mod in_memory;
pub mod noop;
pub mod traits;

pub use events::{RuntimeEvent, RuntimeEventKind};
pub use in_memory::InMemoryMonitor;
pub use noop::NoopMonitor;
pub use traits::{EventSeverity, RuntimeMonitor};

use crate::error::RtResult;
use crate::runtime::context::with_rt;

/// Install a monitor sink on the running runtime, replacing the previous
/// sink. The sink must not call back into runtime operations.
pub fn install(sink: Box<dyn RuntimeMonitor>) -> RtResult<()> {
    with_rt(|rt| {
        rt.sink = sink;
        Ok(())
    })
}
