//! `apel-world` – the seam between the loader and a host simulation world.
//!
//! The loader never talks to a physics engine directly.  It describes each
//! object as an [`ObjectSpec`] and hands it to whatever implements
//! [`HostWorld`].
//!
//! # Modules
//!
//! - [`world`] – the [`HostWorld`] trait and the object description types.
//! - [`sim`] – [`SimWorld`][sim::SimWorld]: in-process host that records
//!   created objects, for headless runs and tests.

pub mod sim;
pub mod world;

pub use sim::SimWorld;
pub use world::{Geometry, HostWorld, ObjectHandle, ObjectKind, ObjectSpec};
