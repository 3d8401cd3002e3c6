//! Street Simulation Library
//!
//! Open-world street life: autonomous traffic, wandering pedestrians and a
//! player who can take over any car. Runs headless on in-memory engine
//! collaborators.

pub mod simulation;
