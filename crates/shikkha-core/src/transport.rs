//! # Transport Module
//!
//! School bus routes, vehicles and student seat assignments.
//!
//! ```text
//! TransportRoute "Mirpur-10"
//!   ├── Vehicle DHA-11-2345  capacity 40 ┐
//!   ├── Vehicle DHA-13-9876  capacity 30 ┴─► route capacity 70
//!   └── assignments (one per student, max 70)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::validation::{
    validate_amount, validate_name, validate_optional_mobile, validate_positive, validate_uuid,
    ValidationResult,
};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransportRoute {
    pub id: String,
    pub school_id: String,
    pub name: String,
    pub start_point: String,
    pub end_point: String,
    pub stops: Vec<String>,
    #[ts(type = "number")]
    pub monthly_fee_paisa: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl TransportRoute {
    /// Whether `stop` is a pickup point on this route.
    ///
    /// The start and end points always count; a route with no listed
    /// intermediate stops accepts any stop name.
    pub fn serves(&self, stop: &str) -> bool {
        let stop = stop.trim();
        self.stops.is_empty()
            || self.start_point == stop
            || self.end_point == stop
            || self.stops.iter().any(|s| s == stop)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Vehicle {
    pub id: String,
    pub school_id: String,
    pub route_id: Option<String>,
    pub registration_no: String,
    pub capacity: i32,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransportAssignment {
    pub id: String,
    pub school_id: String,
    pub student_id: String,
    pub route_id: String,
    pub pickup_stop: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A student riding a route, as listed by `GET /api/transport/routes/{id}/students`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RouteRider {
    pub student_id: String,
    pub student_code: String,
    pub name: String,
    pub class_name: String,
    pub section: Option<String>,
    pub roll_number: Option<i32>,
    pub pickup_stop: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewRoute {
    pub name: String,
    pub start_point: String,
    pub end_point: String,
    #[serde(default)]
    pub stops: Vec<String>,
    #[serde(default)]
    #[ts(type = "number")]
    pub monthly_fee_paisa: i64,
}

impl NewRoute {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_name("start_point", &self.start_point)?;
        validate_name("end_point", &self.end_point)?;
        for stop in &self.stops {
            validate_name("stops", stop)?;
        }
        validate_amount("monthly_fee_paisa", self.monthly_fee_paisa)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RouteUpdate {
    pub name: Option<String>,
    pub start_point: Option<String>,
    pub end_point: Option<String>,
    pub stops: Option<Vec<String>>,
    #[ts(type = "number | null")]
    pub monthly_fee_paisa: Option<i64>,
    pub is_active: Option<bool>,
}

impl RouteUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        for (field, value) in [
            ("name", &self.name),
            ("start_point", &self.start_point),
            ("end_point", &self.end_point),
        ] {
            if let Some(v) = value {
                validate_name(field, v)?;
            }
        }
        if let Some(fee) = self.monthly_fee_paisa {
            validate_amount("monthly_fee_paisa", fee)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewVehicle {
    pub route_id: Option<String>,
    pub registration_no: String,
    pub capacity: i32,
    pub driver_name: Option<String>,
    pub driver_phone: Option<String>,
}

impl NewVehicle {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(route) = &self.route_id {
            validate_uuid("route_id", route)?;
        }
        validate_name("registration_no", &self.registration_no)?;
        validate_positive("capacity", self.capacity as i64)?;
        validate_optional_mobile("driver_phone", self.driver_phone.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssignmentRequest {
    pub student_id: String,
    pub route_id: String,
    pub pickup_stop: Option<String>,
}

impl AssignmentRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("student_id", &self.student_id)?;
        validate_uuid("route_id", &self.route_id)
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Seats on a route: the sum of its vehicles' capacities.
pub fn route_capacity<I>(capacities: I) -> i64
where
    I: IntoIterator<Item = i32>,
{
    capacities.into_iter().map(|c| c.max(0) as i64).sum()
}

/// Checks a student can be seated on `route`.
///
/// `riders` is the number of students already assigned; `already_on_route`
/// is true when this student is one of them, which makes the call a no-op
/// re-assignment (for example, changing pickup stop).
pub fn check_seat(
    route: &TransportRoute,
    capacity: i64,
    riders: i64,
    already_on_route: bool,
    pickup_stop: Option<&str>,
) -> CoreResult<()> {
    if !route.is_active {
        return Err(ValidationError::invalid("route_id", "route is not active").into());
    }
    if let Some(stop) = pickup_stop.filter(|s| !s.trim().is_empty()) {
        if !route.serves(stop) {
            return Err(ValidationError::NotAllowed {
                field: "pickup_stop".to_string(),
                allowed: route.stops.clone(),
            }
            .into());
        }
    }
    if !already_on_route && riders >= capacity {
        return Err(CoreError::RouteFull {
            route: route.name.clone(),
            capacity,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn route(stops: &[&str]) -> TransportRoute {
        TransportRoute {
            id: "r-1".to_string(),
            school_id: "s-1".to_string(),
            name: "Mirpur-10".to_string(),
            start_point: "Mirpur 10".to_string(),
            end_point: "School".to_string(),
            stops: stops.iter().map(|s| s.to_string()).collect(),
            monthly_fee_paisa: 150_000,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_capacity_sums_vehicles() {
        assert_eq!(route_capacity([40, 30]), 70);
        assert_eq!(route_capacity(Vec::<i32>::new()), 0);
        assert_eq!(route_capacity([40, -5]), 40);
    }

    #[test]
    fn test_route_full() {
        let r = route(&[]);
        assert!(check_seat(&r, 70, 69, false, None).is_ok());
        match check_seat(&r, 70, 70, false, None) {
            Err(CoreError::RouteFull { route, capacity }) => {
                assert_eq!(route, "Mirpur-10");
                assert_eq!(capacity, 70);
            }
            other => panic!("expected RouteFull, got {:?}", other),
        }
    }

    #[test]
    fn test_reassignment_on_full_route() {
        let r = route(&[]);
        assert!(check_seat(&r, 70, 70, true, None).is_ok());
    }

    #[test]
    fn test_route_without_vehicles_is_full() {
        assert!(matches!(
            check_seat(&route(&[]), 0, 0, false, None),
            Err(CoreError::RouteFull { .. })
        ));
    }

    #[test]
    fn test_pickup_stop_must_be_on_route() {
        let r = route(&["Pallabi", "Kazipara"]);
        assert!(check_seat(&r, 10, 0, false, Some("Pallabi")).is_ok());
        assert!(check_seat(&r, 10, 0, false, Some("Mirpur 10")).is_ok());
        assert!(check_seat(&r, 10, 0, false, Some("Gulshan")).is_err());
        assert!(check_seat(&route(&[]), 10, 0, false, Some("Gulshan")).is_ok());
    }

    #[test]
    fn test_inactive_route() {
        let mut r = route(&[]);
        r.is_active = false;
        assert!(check_seat(&r, 10, 0, false, None).is_err());
    }

    #[test]
    fn test_vehicle_validation() {
        let v = NewVehicle {
            route_id: None,
            registration_no: "DHAKA METRO-JA-11-2345".to_string(),
            capacity: 40,
            driver_name: Some("Abdul".to_string()),
            driver_phone: Some("01812345678".to_string()),
        };
        assert!(v.validate().is_ok());
        assert!(NewVehicle { capacity: 0, ..v.clone() }.validate().is_err());
        assert!(NewVehicle {
            driver_phone: Some("12345".to_string()),
            ..v
        }
        .validate()
        .is_err());
    }
}
