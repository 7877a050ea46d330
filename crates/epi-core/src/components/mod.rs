//! ECS Components
//!
//! Per-agent components and the world-level resources.

pub mod person;
pub mod world;

pub use person::*;
pub use world::*;
