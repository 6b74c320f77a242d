use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, ClockRequest, StatusQuery, StatusResponse,
};
use crate::attendance::state::{ClockAction, ClockState};
use crate::model::attendance::AttendanceRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StoreOps Attendance API",
        version = "1.0.0",
        description = r#"
## Retail Attendance Clock Service

This API powers the attendance clock of a retail operations console.

### 🔹 Key Features
- **Clock Actions**
  - Check in, start and end the daily break, check out
  - Every action is geofenced: it must be performed within 100 m of the
    employee's assigned store
  - One record per employee per day; the record becomes immutable after
    check-out
- **Status**
  - Read-only view of the current clock state, derived from today's record
- **History**
  - Paginated attendance listing, filterable by employee, store, and date range

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for the history endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::break_start,
        crate::api::attendance::break_end,
        crate::api::attendance::check_out,
        crate::api::attendance::status,
        crate::api::attendance::attendance_list
    ),
    components(
        schemas(
            ClockRequest,
            StatusQuery,
            StatusResponse,
            AttendanceFilter,
            AttendanceListResponse,
            AttendanceRecord,
            ClockState,
            ClockAction
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance clock APIs"),
    )
)]
pub struct ApiDoc;
