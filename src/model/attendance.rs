use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One attendance record per employee per calendar date (UTC).
///
/// Created by the first successful check-in of the day, mutated in place by
/// later clock actions, immutable once `check_out_time` is set. `version` is
/// bumped by the store on every successful write and guards against
/// concurrent updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "employee_id": 42,
        "store_id": 3,
        "date": "2026-08-05",
        "check_in_time": "2026-08-05T08:01:12Z",
        "break_start_time": "2026-08-05T12:00:04Z",
        "break_end_time": "2026-08-05T12:32:40Z",
        "check_out_time": null,
        "break_duration_minutes": 32,
        "check_in_latitude": 48.85837,
        "check_in_longitude": 2.294481,
        "check_out_latitude": null,
        "check_out_longitude": null,
        "version": 3
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 42)]
    pub employee_id: u64,

    #[schema(example = 3)]
    pub store_id: u64,

    #[schema(example = "2026-08-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub break_start_time: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub break_end_time: Option<DateTime<Utc>>,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,

    /// Whole minutes between break start and break end, fixed at the moment
    /// the break ends.
    #[schema(example = 32)]
    pub break_duration_minutes: Option<i64>,

    pub check_in_latitude: Option<f64>,
    pub check_in_longitude: Option<f64>,
    pub check_out_latitude: Option<f64>,
    pub check_out_longitude: Option<f64>,

    #[schema(example = 3)]
    pub version: u64,
}

impl AttendanceRecord {
    /// Fresh record for the given day, before any timestamp is stamped.
    pub fn new(employee_id: u64, store_id: u64, date: NaiveDate) -> Self {
        Self {
            employee_id,
            store_id,
            date,
            check_in_time: None,
            break_start_time: None,
            break_end_time: None,
            check_out_time: None,
            break_duration_minutes: None,
            check_in_latitude: None,
            check_in_longitude: None,
            check_out_latitude: None,
            check_out_longitude: None,
            version: 0,
        }
    }
}
