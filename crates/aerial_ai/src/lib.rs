//! Behavioral core for autonomous aerial creatures.
//!
//! Two families share one per-tick pipeline:
//! - **Flyers** hold an altitude band above the ground and harass the nearest target.
//! - **Torpedoes** cruise high, dive to ram targets while tunnelling through
//!   terrain, and self-destruct once their destruction budget is spent.
//!
//! [`AerialScheduler`] is the entry point: call [`AerialScheduler::tick`] every
//! game tick with the host world.

pub mod altitude;
pub mod config;
pub mod debug;
pub mod detonation;
pub mod flyer;
pub mod outcome;
pub mod scheduler;
pub mod sight;
pub mod spatial_cache;
pub mod steering;
pub mod target;
pub mod terrain;
pub mod torpedo;

pub use altitude::*;
pub use config::*;
pub use debug::DebugFlags;
pub use detonation::*;
pub use flyer::*;
pub use outcome::*;
pub use scheduler::*;
pub use sight::*;
pub use spatial_cache::*;
pub use steering::*;
pub use target::*;
pub use terrain::*;
pub use torpedo::*;
