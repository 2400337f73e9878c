use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "09:02:11")]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:10:40")]
    pub check_out: Option<NaiveTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub out_latitude: Option<f64>,
    pub out_longitude: Option<f64>,
    pub out_address: Option<String>,
}

/// Where the device was when the employee checked in or out.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "Gulshan 1, Dhaka")]
    pub address: Option<String>,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
