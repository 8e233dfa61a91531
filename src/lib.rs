//! PocketPal: a virtual pet with decaying needs, a coin economy, levels and
//! three minigames.
//!
//! Everything that changes the pet goes through [`game::Game`], which owns the
//! pet, a virtual-time [`scheduler::Scheduler`], the random source and the
//! save backend. The other modules are pure rules over [`model::Pet`] and can
//! be driven directly in tests.
pub mod actions;
pub mod config;
pub mod economy;
pub mod error;
pub mod game;
pub mod leveling;
pub mod minigame;
pub mod model;
pub mod scheduler;
pub mod sim;
pub mod snapshot;
pub mod storage;
