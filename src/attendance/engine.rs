use crate::attendance::error::ClockError;
use crate::attendance::geo::{self, Coordinates};
use crate::attendance::state::{self, ActionContext, ClockAction, ClockState};
use crate::attendance::store::{
    AttendanceStore, SqlAttendanceStore, SqlStoreDirectory, StoreDirectory,
};
use crate::model::attendance::AttendanceRecord;
use chrono::Utc;
use tracing::{debug, info};

/// The daily clock-state machine. Stateless between calls: everything is
/// read from and written back to the attendance store, so any number of
/// service instances can run it. Atomicity per (employee, day) comes from
/// the store's conditional write.
pub struct AttendanceEngine<D, S> {
    directory: D,
    records: S,
    geofence_radius_m: f64,
}

/// Engine wired to the MySQL-backed seams, as served by the HTTP layer.
pub type SqlAttendanceEngine = AttendanceEngine<SqlStoreDirectory, SqlAttendanceStore>;

impl<D: StoreDirectory, S: AttendanceStore> AttendanceEngine<D, S> {
    pub fn new(directory: D, records: S, geofence_radius_m: f64) -> Self {
        Self {
            directory,
            records,
            geofence_radius_m,
        }
    }

    /// Runs one clock action end to end: validate the reported position,
    /// check the geofence against the assigned store, load today's record,
    /// apply the transition, and persist with exactly one conditional write.
    /// Every failure path leaves storage untouched.
    pub async fn submit_action(
        &self,
        employee_id: u64,
        action: ClockAction,
        position: Coordinates,
    ) -> Result<AttendanceRecord, ClockError> {
        geo::validate(&position)?;

        let store = self
            .directory
            .assigned_store(employee_id)
            .await?
            .ok_or(ClockError::NoStoreAssigned { employee_id })?;

        let store_position = Coordinates::new(store.latitude, store.longitude);
        let distance_m = geo::distance_meters(&position, &store_position);
        debug!(employee_id, store_id = store.id, distance_m, "geofence check");
        if distance_m > self.geofence_radius_m {
            return Err(ClockError::OutOfRange {
                distance_m,
                limit_m: self.geofence_radius_m,
            });
        }

        let now = Utc::now();
        let today = now.date_naive();

        let prior = self.records.today_record(employee_id, today).await?;
        let expected_version = prior.as_ref().map(|r| r.version);

        let ctx = ActionContext {
            employee_id,
            store_id: store.id,
            now,
            position,
        };
        let next = state::apply(prior, action, &ctx)?;

        let saved = self.records.write(next, expected_version).await?;
        info!(
            employee_id,
            store_id = store.id,
            %action,
            state = %ClockState::derive(Some(&saved)),
            "clock action recorded"
        );
        Ok(saved)
    }

    /// Read-only view of where the employee stands today. Same derivation
    /// the transitions use; performs no writes.
    pub async fn current_state(
        &self,
        employee_id: u64,
    ) -> Result<(ClockState, Option<AttendanceRecord>), ClockError> {
        let today = Utc::now().date_naive();
        let record = self.records.today_record(employee_id, today).await?;
        let state = ClockState::derive(record.as_ref());
        Ok((state, record))
    }
}
