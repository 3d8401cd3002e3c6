//! Error types for the street simulation

use thiserror::Error;

use super::types::VehicleId;

/// Errors raised by simulation operations.
///
/// Only `PathTooShort` is fatal; the others describe an operation that was
/// abandoned without touching any state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimError {
    #[error("vehicle path needs at least 2 nodes, got {len}")]
    PathTooShort { len: usize },

    #[error("vehicle {vehicle:?} has no {marker} marker")]
    MissingMarker { vehicle: VehicleId, marker: &'static str },

    #[error("vehicle {0:?} does not exist")]
    UnknownVehicle(VehicleId),

    #[error("a possession session is already active")]
    SessionActive,
}

pub type SimResult<T> = Result<T, SimError>;
