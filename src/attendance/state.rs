use crate::attendance::error::ClockError;
use crate::attendance::geo::Coordinates;
use crate::model::attendance::AttendanceRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Where an employee stands in today's clock cycle. Never stored; always
/// derived from the day's record so the record stays the single source of
/// truth.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockState {
    /// Not checked in today.
    Absent,
    /// Checked in, working.
    Present,
    /// On the (single) daily break.
    OnBreak,
    /// Checked out. Terminal for the day.
    Done,
}

/// The four clock actions an employee can submit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockAction {
    CheckIn,
    BreakStart,
    BreakEnd,
    CheckOut,
}

impl ClockState {
    /// Derives the state from today's record. Evaluation order matters:
    /// check-out wins over an open break, an open break wins over plain
    /// presence.
    pub fn derive(record: Option<&AttendanceRecord>) -> Self {
        let Some(rec) = record else {
            return ClockState::Absent;
        };
        if rec.check_in_time.is_none() {
            return ClockState::Absent;
        }
        if rec.check_out_time.is_some() {
            return ClockState::Done;
        }
        if rec.break_start_time.is_some() && rec.break_end_time.is_none() {
            return ClockState::OnBreak;
        }
        ClockState::Present
    }
}

/// Everything a transition needs besides the record itself. `now` is stamped
/// once per engine call so date and timestamps cannot disagree.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext {
    pub employee_id: u64,
    pub store_id: u64,
    pub now: DateTime<Utc>,
    pub position: Coordinates,
}

/// Applies one clock action to today's record and returns the record to be
/// persisted. Pure: no clock reads, no storage. Every (state, action) pair
/// outside the transition table is rejected with `InvalidTransition` so the
/// caller writes nothing.
pub fn apply(
    record: Option<AttendanceRecord>,
    action: ClockAction,
    ctx: &ActionContext,
) -> Result<AttendanceRecord, ClockError> {
    let state = ClockState::derive(record.as_ref());

    if state == ClockState::Absent {
        if action != ClockAction::CheckIn {
            return Err(ClockError::InvalidTransition { state, action });
        }
        let mut rec = record
            .unwrap_or_else(|| AttendanceRecord::new(ctx.employee_id, ctx.store_id, ctx.now.date_naive()));
        rec.check_in_time = Some(ctx.now);
        rec.check_in_latitude = Some(ctx.position.latitude);
        rec.check_in_longitude = Some(ctx.position.longitude);
        return Ok(rec);
    }

    let Some(mut rec) = record else {
        // Non-absent states always come from an existing record.
        return Err(ClockError::InvalidTransition { state, action });
    };

    match (state, action) {
        (ClockState::Present, ClockAction::BreakStart) => {
            if rec.break_start_time.is_some() {
                // The day's single break is already used up.
                return Err(ClockError::InvalidTransition { state, action });
            }
            rec.break_start_time = Some(ctx.now);
            Ok(rec)
        }
        (ClockState::OnBreak, ClockAction::BreakEnd) => {
            if let Some(start) = rec.break_start_time {
                rec.break_end_time = Some(ctx.now);
                rec.break_duration_minutes = Some((ctx.now - start).num_minutes());
            }
            Ok(rec)
        }
        (ClockState::Present, ClockAction::CheckOut) => {
            rec.check_out_time = Some(ctx.now);
            rec.check_out_latitude = Some(ctx.position.latitude);
            rec.check_out_longitude = Some(ctx.position.longitude);
            Ok(rec)
        }
        (state, action) => Err(ClockError::InvalidTransition { state, action }),
    }
}
