//! Merchant location model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::validation::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "location_type")]
pub enum LocationType {
    Physical,
    Virtual,
}

/// Represents a row of the `merchant_locations` table.
///
/// Address fields follow the ISO 20022 postal address breakdown; all of them
/// are optional because virtual locations only carry a web URL.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MerchantLocation {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub location_type: LocationType,
    pub web_url: Option<String>,
    pub department: Option<String>,
    pub sub_department: Option<String>,
    pub street_name: Option<String>,
    pub building_number: Option<String>,
    pub building_name: Option<String>,
    pub floor_number: Option<String>,
    pub room_number: Option<String>,
    pub post_box: Option<String>,
    pub postal_code: Option<String>,
    pub town_name: Option<String>,
    pub district_name: Option<String>,
    pub country_subdivision: Option<String>,
    pub country: Option<String>,
    pub address_line: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating (POST) or replacing (PUT) a location.
///
/// ```json
/// {
///   "location_type": "Physical",
///   "street_name": "Main Street",
///   "building_number": "12",
///   "town_name": "Yangon",
///   "country": "Myanmar",
///   "latitude": 16.8409,
///   "longitude": 96.1735
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LocationRequest {
    pub location_type: LocationType,
    pub web_url: Option<String>,
    pub department: Option<String>,
    pub sub_department: Option<String>,
    pub street_name: Option<String>,
    pub building_number: Option<String>,
    pub building_name: Option<String>,
    pub floor_number: Option<String>,
    pub room_number: Option<String>,
    pub post_box: Option<String>,
    pub postal_code: Option<String>,
    pub town_name: Option<String>,
    pub district_name: Option<String>,
    pub country_subdivision: Option<String>,
    pub country: Option<String>,
    pub address_line: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationRequest {
    /// Virtual locations need a web URL; physical ones need at least a town
    /// or an address line so the location can be found.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();

        match self.location_type {
            LocationType::Virtual => match self.web_url.as_deref() {
                Some(url) => v.web_url("web_url", url),
                None => v.push("web_url", "is required for virtual locations"),
            },
            LocationType::Physical => {
                if let Some(url) = self.web_url.as_deref() {
                    v.web_url("web_url", url);
                }
                let has_address = [self.town_name.as_deref(), self.address_line.as_deref()]
                    .into_iter()
                    .flatten()
                    .any(|s| !s.trim().is_empty());
                if !has_address {
                    v.push(
                        "town_name",
                        "town_name or address_line is required for physical locations",
                    );
                }
            }
        }

        for (field, value, max) in [
            ("department", &self.department, 255),
            ("sub_department", &self.sub_department, 255),
            ("street_name", &self.street_name, 255),
            ("building_number", &self.building_number, 64),
            ("building_name", &self.building_name, 255),
            ("floor_number", &self.floor_number, 64),
            ("room_number", &self.room_number, 64),
            ("post_box", &self.post_box, 64),
            ("postal_code", &self.postal_code, 64),
            ("town_name", &self.town_name, 255),
            ("district_name", &self.district_name, 255),
            ("country_subdivision", &self.country_subdivision, 255),
            ("country", &self.country, 255),
        ] {
            v.optional(field, value.as_deref(), max);
        }

        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                v.latitude("latitude", lat);
                v.longitude("longitude", lon);
            }
            (None, None) => {}
            _ => v.push("latitude", "latitude and longitude must be given together"),
        }

        v.finish()
    }
}
