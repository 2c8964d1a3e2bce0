//! Dependency graph: loading, validation, registry.
//!
//! ## Files & responsibilities
//! - **loader.rs**: parses the dependency file into an id adjacency map,
//!   validates it, then builds and wires the service entities.
//! - **cycle.rs**: three-colour depth-first search proving the declared
//!   dependencies form a DAG; runs before any entity is built.
//! - **registry.rs**: the read-only `id → Service` map with source/sink
//!   queries.

mod cycle;
mod loader;
mod registry;

pub(crate) use loader::load;
pub use registry::Registry;
