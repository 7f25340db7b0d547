//! Timestamped register writes
//!
//! Hosts that run the CPU ahead of audio can queue writes with the CPU cycle
//! they happened on; [`Apu::process`](crate::Apu::process) applies them at the
//! matching output sample. A recorded stream of such writes is a
//! [`RegisterLog`], which [`render_log`] turns back into PCM.

pub mod cycle_counter;
pub mod log;
pub mod queue;

pub use cycle_counter::CycleCounter;
pub use log::{render_log, RegisterLog, RegisterWrite};
pub use queue::{WriteQueue, QUEUE_CAPACITY};
