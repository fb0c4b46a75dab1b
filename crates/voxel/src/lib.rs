//! Voxel world seam for the aerial AI.
//!
//! The AI never owns world data. It talks to whatever hosts it through the
//! [`WorldAccess`] trait: entity enumeration, block reads and writes, impulses,
//! sounds and particles. [`SimWorld`] is an in-memory implementation (hecs
//! entities + chunked voxel terrain) used by tests and the headless demo.

pub mod block;
pub mod chunk;
pub mod sim_world;
pub mod terrain;
pub mod world;

pub use block::*;
pub use chunk::*;
pub use sim_world::*;
pub use terrain::*;
pub use world::*;
