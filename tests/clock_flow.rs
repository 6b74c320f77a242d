//! Integration tests for the attendance clock engine.
//!
//! These drive the engine end to end against in-memory implementations of
//! the store directory and attendance store, covering:
//! - precondition failures (no assigned store, out of geofence range)
//! - the full check-in / break / check-out day
//! - rejection of every action once the day is closed
//! - the conditional-write path under concurrent check-ins

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};

use storeops::attendance::engine::AttendanceEngine;
use storeops::attendance::error::ClockError;
use storeops::attendance::geo::Coordinates;
use storeops::attendance::state::{ClockAction, ClockState};
use storeops::attendance::store::{AttendanceStore, StoreDirectory};
use storeops::model::attendance::AttendanceRecord;
use storeops::model::store::StoreLocation;

// ----------------------------------------------------------------------------
// In-memory seams
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
struct MemoryDirectory {
    assignments: HashMap<u64, StoreLocation>,
}

impl MemoryDirectory {
    fn with_assignment(employee_id: u64, store: StoreLocation) -> Self {
        let mut assignments = HashMap::new();
        assignments.insert(employee_id, store);
        Self { assignments }
    }
}

impl StoreDirectory for MemoryDirectory {
    async fn assigned_store(&self, employee_id: u64) -> Result<Option<StoreLocation>, ClockError> {
        Ok(self.assignments.get(&employee_id).copied())
    }
}

#[derive(Default)]
struct MemoryAttendanceInner {
    records: Mutex<HashMap<(u64, NaiveDate), AttendanceRecord>>,
    // Yield before committing so two in-flight writes both observe the
    // pre-write state, like two requests racing a real database.
    delay_writes: bool,
}

#[derive(Clone, Default)]
struct MemoryAttendance(Arc<MemoryAttendanceInner>);

impl MemoryAttendance {
    fn racy() -> Self {
        Self(Arc::new(MemoryAttendanceInner {
            records: Mutex::new(HashMap::new()),
            delay_writes: true,
        }))
    }

    fn record(&self, employee_id: u64, date: NaiveDate) -> Option<AttendanceRecord> {
        self.0
            .records
            .lock()
            .unwrap()
            .get(&(employee_id, date))
            .cloned()
    }

    fn len(&self) -> usize {
        self.0.records.lock().unwrap().len()
    }
}

impl AttendanceStore for MemoryAttendance {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, ClockError> {
        Ok(self.record(employee_id, date))
    }

    async fn write(
        &self,
        mut record: AttendanceRecord,
        expected_version: Option<u64>,
    ) -> Result<AttendanceRecord, ClockError> {
        if self.0.delay_writes {
            actix_web::rt::task::yield_now().await;
        }

        let mut records = self.0.records.lock().unwrap();
        let key = (record.employee_id, record.date);
        match expected_version {
            None => {
                if records.contains_key(&key) {
                    return Err(ClockError::Conflict);
                }
                record.version = 1;
                records.insert(key, record.clone());
                Ok(record)
            }
            Some(version) => match records.get_mut(&key) {
                Some(existing) if existing.version == version => {
                    record.version = version + 1;
                    *existing = record.clone();
                    Ok(record)
                }
                _ => Err(ClockError::Conflict),
            },
        }
    }
}

// ----------------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------------

const EMPLOYEE: u64 = 42;
const RADIUS_M: f64 = 100.0;

fn store_at_origin() -> StoreLocation {
    StoreLocation {
        id: 3,
        latitude: 0.0,
        longitude: 0.0,
    }
}

/// Roughly 45 m east of the origin store.
fn near_position() -> Coordinates {
    Coordinates::new(0.0, 0.0004)
}

/// Roughly 150 m east of the origin store.
fn far_position() -> Coordinates {
    Coordinates::new(0.0, 0.00135)
}

fn engine_with(
    directory: MemoryDirectory,
    records: MemoryAttendance,
) -> AttendanceEngine<MemoryDirectory, MemoryAttendance> {
    AttendanceEngine::new(directory, records, RADIUS_M)
}

// ----------------------------------------------------------------------------
// Scenarios
// ----------------------------------------------------------------------------

#[actix_web::test]
async fn check_in_without_assignment_is_rejected() {
    let records = MemoryAttendance::default();
    let engine = engine_with(MemoryDirectory::default(), records.clone());

    let err = engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClockError::NoStoreAssigned { employee_id: EMPLOYEE }
    ));
    assert_eq!(records.len(), 0, "no record may be created");
}

#[actix_web::test]
async fn check_in_out_of_range_reports_the_distance() {
    let records = MemoryAttendance::default();
    let engine = engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    );

    let err = engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, far_position())
        .await
        .unwrap_err();

    match err {
        ClockError::OutOfRange {
            distance_m,
            limit_m,
        } => {
            assert!((149.0..152.0).contains(&distance_m), "got {distance_m}");
            assert_eq!(limit_m, RADIUS_M);
        }
        other => panic!("expected OutOfRange, got {other:?}"),
    }
    assert_eq!(records.len(), 0, "no record may be created");
}

#[actix_web::test]
async fn invalid_coordinates_are_rejected_before_anything_else() {
    let records = MemoryAttendance::default();
    let engine = engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    );

    let err = engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, Coordinates::new(91.0, 0.0))
        .await
        .unwrap_err();

    assert!(matches!(err, ClockError::InvalidCoordinates { .. }));
    assert_eq!(records.len(), 0);
}

#[actix_web::test]
async fn full_day_walks_through_every_state() {
    let records = MemoryAttendance::default();
    let engine = engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    );

    let rec = engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
        .await
        .unwrap();
    assert_eq!(ClockState::derive(Some(&rec)), ClockState::Present);
    assert_eq!(rec.store_id, 3);
    assert!(rec.check_in_time.is_some());
    assert_eq!(rec.check_in_longitude, Some(near_position().longitude));

    let rec = engine
        .submit_action(EMPLOYEE, ClockAction::BreakStart, near_position())
        .await
        .unwrap();
    assert_eq!(ClockState::derive(Some(&rec)), ClockState::OnBreak);

    let rec = engine
        .submit_action(EMPLOYEE, ClockAction::BreakEnd, near_position())
        .await
        .unwrap();
    assert_eq!(ClockState::derive(Some(&rec)), ClockState::Present);
    assert_eq!(rec.break_duration_minutes, Some(0), "break lasted under a minute");

    let rec = engine
        .submit_action(EMPLOYEE, ClockAction::CheckOut, near_position())
        .await
        .unwrap();
    assert_eq!(ClockState::derive(Some(&rec)), ClockState::Done);
    assert!(rec.check_out_time.is_some());

    // The day is closed: every further action bounces and storage is
    // untouched.
    let closed = records.record(EMPLOYEE, rec.date).unwrap();
    for action in [
        ClockAction::CheckIn,
        ClockAction::BreakStart,
        ClockAction::BreakEnd,
        ClockAction::CheckOut,
    ] {
        let err = engine
            .submit_action(EMPLOYEE, action, near_position())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClockError::InvalidTransition {
                state: ClockState::Done,
                ..
            }
        ));
    }
    assert_eq!(records.record(EMPLOYEE, rec.date).unwrap(), closed);
    assert_eq!(records.len(), 1);
}

#[actix_web::test]
async fn status_reflects_the_stored_record_without_writing() {
    let records = MemoryAttendance::default();
    let engine = engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    );

    let (state, record) = engine.current_state(EMPLOYEE).await.unwrap();
    assert_eq!(state, ClockState::Absent);
    assert!(record.is_none());
    assert_eq!(records.len(), 0);

    engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
        .await
        .unwrap();

    let (state, record) = engine.current_state(EMPLOYEE).await.unwrap();
    assert_eq!(state, ClockState::Present);
    assert!(record.is_some());

    // Idempotent read
    let (again, _) = engine.current_state(EMPLOYEE).await.unwrap();
    assert_eq!(again, state);
}

#[actix_web::test]
async fn concurrent_check_ins_produce_exactly_one_record() {
    let records = MemoryAttendance::racy();
    let engine = Arc::new(engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    ));

    let first = {
        let engine = engine.clone();
        actix_web::rt::spawn(async move {
            engine
                .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
                .await
        })
    };
    let second = {
        let engine = engine.clone();
        actix_web::rt::spawn(async move {
            engine
                .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one double-tap check-in may win");

    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(
                    err,
                    ClockError::Conflict | ClockError::InvalidTransition { .. }
                ),
                "loser must see a conflict or a rejected transition, got {err:?}"
            );
        }
    }

    assert_eq!(records.len(), 1);
    let today = Utc::now().date_naive();
    let stored = records.record(EMPLOYEE, today).unwrap();
    assert!(stored.check_in_time.is_some());
    assert_eq!(stored.version, 1, "a single write must have landed");
}

#[actix_web::test]
async fn stale_version_write_is_a_conflict() {
    let records = MemoryAttendance::default();
    let engine = engine_with(
        MemoryDirectory::with_assignment(EMPLOYEE, store_at_origin()),
        records.clone(),
    );

    let rec = engine
        .submit_action(EMPLOYEE, ClockAction::CheckIn, near_position())
        .await
        .unwrap();

    // Writing against a version that was already superseded must fail.
    let mut stale = rec.clone();
    stale.break_start_time = stale.check_in_time;
    let err = records.write(stale, Some(rec.version + 5)).await.unwrap_err();
    assert!(matches!(err, ClockError::Conflict));

    // And a second create for the same day must fail too.
    let duplicate = AttendanceRecord::new(EMPLOYEE, 3, rec.date);
    let err = records.write(duplicate, None).await.unwrap_err();
    assert!(matches!(err, ClockError::Conflict));

    assert_eq!(records.record(EMPLOYEE, rec.date).unwrap(), rec);
}
