use crate::attendance::engine::SqlAttendanceEngine;
use crate::attendance::error::ClockError;
use crate::attendance::geo::Coordinates;
use crate::attendance::state::{ClockAction, ClockState};
use crate::model::attendance::AttendanceRecord;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ClockRequest {
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = 48.85837)]
    pub latitude: f64,
    #[schema(example = 2.294481)]
    pub longitude: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct StatusQuery {
    #[schema(example = 42)]
    pub employee_id: u64,
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "present")]
    pub state: ClockState,
    pub record: Option<AttendanceRecord>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    #[schema(example = 42)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = 3)]
    /// Filter by store ID
    pub store_id: Option<u64>,
    #[schema(example = "2026-08-01", value_type = String, format = "date")]
    /// Earliest date (inclusive)
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-08-31", value_type = String, format = "date")]
    /// Latest date (inclusive)
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 20)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

fn clock_error_response(err: ClockError, employee_id: u64) -> HttpResponse {
    match err {
        ClockError::NoStoreAssigned { .. } => HttpResponse::Forbidden().json(json!({
            "message": "No store assigned. Contact your administrator."
        })),
        ClockError::OutOfRange {
            distance_m,
            limit_m,
        } => HttpResponse::BadRequest().json(json!({
            "message": format!(
                "Too far from the store ({} m). You must be within {} m.",
                distance_m.round() as i64,
                limit_m.round() as i64
            ),
            "distance_m": distance_m.round() as i64
        })),
        ClockError::InvalidTransition { state, action } => HttpResponse::BadRequest().json(json!({
            "message": format!("Cannot {} while {}", action, state),
            "state": state
        })),
        ClockError::InvalidCoordinates { .. } => HttpResponse::BadRequest().json(json!({
            "message": "Invalid coordinates. Check that geolocation is enabled on the device."
        })),
        ClockError::Conflict => HttpResponse::Conflict().json(json!({
            "message": "Attendance was updated concurrently. Reload your status and try again."
        })),
        ClockError::Storage(e) => {
            error!(error = %e, employee_id, "Clock action failed");
            HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }))
        }
    }
}

async fn handle_clock(
    engine: &SqlAttendanceEngine,
    payload: ClockRequest,
    action: ClockAction,
) -> HttpResponse {
    let position = Coordinates::new(payload.latitude, payload.longitude);
    match engine
        .submit_action(payload.employee_id, action, position)
        .await
    {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(err) => clock_error_response(err, payload.employee_id),
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceRecord),
        (status = 400, description = "Out of range, invalid coordinates, or already checked in today", body = Object, example = json!({
            "message": "Too far from the store (152 m). You must be within 100 m.",
            "distance_m": 152
        })),
        (status = 403, description = "No store assigned", body = Object, example = json!({
            "message": "No store assigned. Contact your administrator."
        })),
        (status = 409, description = "Concurrent update detected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    engine: web::Data<SqlAttendanceEngine>,
    payload: web::Json<ClockRequest>,
) -> impl Responder {
    handle_clock(engine.get_ref(), payload.into_inner(), ClockAction::CheckIn).await
}

/// Break-start endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/break-start",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Break started", body = AttendanceRecord),
        (status = 400, description = "Out of range or not currently checked in", body = Object, example = json!({
            "message": "Cannot break_start while absent",
            "state": "absent"
        })),
        (status = 403, description = "No store assigned"),
        (status = 409, description = "Concurrent update detected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn break_start(
    engine: web::Data<SqlAttendanceEngine>,
    payload: web::Json<ClockRequest>,
) -> impl Responder {
    handle_clock(engine.get_ref(), payload.into_inner(), ClockAction::BreakStart).await
}

/// Break-end endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/break-end",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Break ended, duration recorded", body = AttendanceRecord),
        (status = 400, description = "Out of range or no open break", body = Object, example = json!({
            "message": "Cannot break_end while present",
            "state": "present"
        })),
        (status = 403, description = "No store assigned"),
        (status = 409, description = "Concurrent update detected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn break_end(
    engine: web::Data<SqlAttendanceEngine>,
    payload: web::Json<ClockRequest>,
) -> impl Responder {
    handle_clock(engine.get_ref(), payload.into_inner(), ClockAction::BreakEnd).await
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    request_body = ClockRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceRecord),
        (status = 400, description = "Out of range or no active check-in", body = Object, example = json!({
            "message": "Cannot check_out while done",
            "state": "done"
        })),
        (status = 403, description = "No store assigned"),
        (status = 409, description = "Concurrent update detected"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    engine: web::Data<SqlAttendanceEngine>,
    payload: web::Json<ClockRequest>,
) -> impl Responder {
    handle_clock(engine.get_ref(), payload.into_inner(), ClockAction::CheckOut).await
}

/// Current clock state for an employee
#[utoipa::path(
    get,
    path = "/api/v1/attendance/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "Current state and today's record", body = StatusResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn status(
    engine: web::Data<SqlAttendanceEngine>,
    query: web::Query<StatusQuery>,
) -> impl Responder {
    match engine.current_state(query.employee_id).await {
        Ok((state, record)) => HttpResponse::Ok().json(StatusResponse { state, record }),
        Err(err) => clock_error_response(err, query.employee_id),
    }
}

/// Attendance history, filterable and paginated
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn attendance_list(
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(20).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    if let Some(store_id) = query.store_id {
        where_sql.push_str(" AND store_id = ?");
        args.push(FilterValue::U64(store_id));
    }

    if let Some(from) = query.from {
        where_sql.push_str(" AND date >= ?");
        args.push(FilterValue::Date(from));
    }

    if let Some(to) = query.to {
        where_sql.push_str(" AND date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance records");
        ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        SELECT
            employee_id, store_id, date,
            check_in_time, break_start_time, break_end_time, check_out_time,
            break_duration_minutes,
            check_in_latitude, check_in_longitude,
            check_out_latitude, check_out_longitude,
            version
        FROM attendance
        {}
        ORDER BY date DESC, employee_id
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let records = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance list");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data: records,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}
