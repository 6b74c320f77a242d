use serde::{Deserialize, Serialize};

/// Registered coordinates of a store. Owned by store management;
/// this service only reads it to anchor the geofence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoreLocation {
    pub id: u64,
    pub latitude: f64,
    pub longitude: f64,
}
