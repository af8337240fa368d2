//! Core of the ambient canvas simulations: spline fitting for brush strokes
//! and the double-buffered slot engine that animates wind wisps and growth
//! filaments along them.
//!
//! Main components:
//! - [`bezier`]: cubic Bezier spline fitting, evaluation and bounds.
//! - [`slot_buffer`]: fixed-capacity array of path slots.
//! - [`double_buffer`]: read/write pair of slot buffers.
//! - [`stepper`]: one generation of the simulation.
//! - [`spawner`]: seeding new paths from a stroke.
//! - [`simulation`]: owner of buffers, tuning and randomness.
//! - [`geometry`]: ribbon triangles for drawing paths.
//! - [`stroke`]: pointer sample decimation.
//! - [`config`]: tuning, presets and loading.
//! - [`types`]: shared type aliases and the node type.

pub mod bezier;
pub mod config;
pub mod double_buffer;
pub mod geometry;
pub mod simulation;
pub mod slot_buffer;
pub mod spawner;
pub mod stepper;
pub mod stroke;
pub mod types;
