use crate::attendance::error::ClockError;
use crate::model::attendance::AttendanceRecord;
use crate::model::store::StoreLocation;
use crate::utils::store_cache;
use chrono::NaiveDate;
use sqlx::MySqlPool;

/// Resolves which store an employee clocks against. Store management owns the
/// data; this service only reads it.
#[allow(async_fn_in_trait)]
pub trait StoreDirectory {
    async fn assigned_store(&self, employee_id: u64) -> Result<Option<StoreLocation>, ClockError>;
}

/// Persistence for daily attendance records. `write` is conditional on the
/// version read beforehand so two concurrent clock actions for the same
/// employee and day cannot both land.
#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, ClockError>;

    /// Persists the record. `expected_version = None` creates the day's
    /// record; `Some(v)` updates it only if it is still at version `v`.
    /// Returns the stored record with its new version.
    async fn write(
        &self,
        record: AttendanceRecord,
        expected_version: Option<u64>,
    ) -> Result<AttendanceRecord, ClockError>;
}

// -------------------- MySQL implementations --------------------

#[derive(Clone)]
pub struct SqlStoreDirectory {
    pool: MySqlPool,
}

impl SqlStoreDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl StoreDirectory for SqlStoreDirectory {
    async fn assigned_store(&self, employee_id: u64) -> Result<Option<StoreLocation>, ClockError> {
        let store_id: Option<Option<u64>> =
            sqlx::query_scalar("SELECT store_id FROM employees WHERE id = ?")
                .bind(employee_id)
                .fetch_optional(&self.pool)
                .await?;

        // Unknown employee and unassigned employee both mean "no geofence".
        let Some(Some(store_id)) = store_id else {
            return Ok(None);
        };

        if let Some(location) = store_cache::cached(store_id).await {
            return Ok(Some(location));
        }

        let location: Option<StoreLocation> =
            sqlx::query_as("SELECT id, latitude, longitude FROM stores WHERE id = ?")
                .bind(store_id)
                .fetch_optional(&self.pool)
                .await?;

        if let Some(location) = &location {
            store_cache::remember(location).await;
        }

        Ok(location)
    }
}

#[derive(Clone)]
pub struct SqlAttendanceStore {
    pool: MySqlPool,
}

impl SqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for SqlAttendanceStore {
    async fn today_record(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, ClockError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            SELECT
                employee_id, store_id, date,
                check_in_time, break_start_time, break_end_time, check_out_time,
                break_duration_minutes,
                check_in_latitude, check_in_longitude,
                check_out_latitude, check_out_longitude,
                version
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn write(
        &self,
        mut record: AttendanceRecord,
        expected_version: Option<u64>,
    ) -> Result<AttendanceRecord, ClockError> {
        match expected_version {
            None => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO attendance
                        (employee_id, store_id, date,
                         check_in_time, check_in_latitude, check_in_longitude,
                         version)
                    VALUES (?, ?, ?, ?, ?, ?, 1)
                    "#,
                )
                .bind(record.employee_id)
                .bind(record.store_id)
                .bind(record.date)
                .bind(record.check_in_time)
                .bind(record.check_in_latitude)
                .bind(record.check_in_longitude)
                .execute(&self.pool)
                .await;

                match result {
                    Ok(_) => {
                        record.version = 1;
                        Ok(record)
                    }
                    Err(e) => {
                        // Unique (employee_id, date): a concurrent check-in
                        // already created today's record.
                        if let sqlx::Error::Database(db_err) = &e {
                            if db_err.code().as_deref() == Some("23000") {
                                return Err(ClockError::Conflict);
                            }
                        }
                        Err(e.into())
                    }
                }
            }
            Some(version) => {
                let result = sqlx::query(
                    r#"
                    UPDATE attendance
                    SET break_start_time = ?,
                        break_end_time = ?,
                        check_out_time = ?,
                        break_duration_minutes = ?,
                        check_out_latitude = ?,
                        check_out_longitude = ?,
                        version = version + 1
                    WHERE employee_id = ?
                    AND date = ?
                    AND version = ?
                    "#,
                )
                .bind(record.break_start_time)
                .bind(record.break_end_time)
                .bind(record.check_out_time)
                .bind(record.break_duration_minutes)
                .bind(record.check_out_latitude)
                .bind(record.check_out_longitude)
                .bind(record.employee_id)
                .bind(record.date)
                .bind(version)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(ClockError::Conflict);
                }

                record.version = version + 1;
                Ok(record)
            }
        }
    }
}
