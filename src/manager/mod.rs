//! Command dispatcher over the service graph.
//!
//! ## Files & responsibilities
//! - **command.rs**: the textual command grammar and its parser.
//! - **queue.rs**: the cloneable handle over the bounded command queue.
//! - **manager.rs**: the `Manager`: loads the registry, owns the bus and the
//!   subscriber fan-out, and runs the single-task dispatch loop.
//! - **signal.rs**: cross-platform OS signal handling; a termination signal
//!   is treated as an implicit `EXIT`.

mod command;
mod manager;
mod queue;
mod signal;

pub use command::Command;
pub use manager::Manager;
pub use queue::CommandQueue;
