use crate::attendance::state::{ClockAction, ClockState};
use thiserror::Error;

/// Failure outcomes of a clock action. All variants except `Storage` are
/// expected, caller-recoverable results rather than faults.
#[derive(Debug, Error)]
pub enum ClockError {
    /// The employee is not linked to any store, so there is no geofence to
    /// validate against.
    #[error("employee {employee_id} has no assigned store")]
    NoStoreAssigned { employee_id: u64 },

    /// Reported position is outside the store geofence. Carries the measured
    /// distance so callers can show how far off the employee is.
    #[error("{distance_m:.0} m from the store, beyond the {limit_m:.0} m limit")]
    OutOfRange { distance_m: f64, limit_m: f64 },

    /// The action is not legal from the current clock state.
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: ClockState,
        action: ClockAction,
    },

    /// Latitude/longitude outside their valid ranges or not finite.
    #[error("invalid coordinates: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Someone else wrote today's record between our read and our write.
    /// Reload the current state and resubmit if the action still applies.
    #[error("attendance record was updated concurrently")]
    Conflict,

    #[error("attendance storage failure")]
    Storage(#[from] sqlx::Error),
}
