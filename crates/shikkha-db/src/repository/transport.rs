//! # Transport Repository
//!
//! Routes, vehicles and student seat assignments.
//!
//! ## Seat Assignment
//! ```text
//! assign(student, route)
//!     │  BEGIN
//!     ├── lock route row (FOR UPDATE)    serialises concurrent assigns
//!     ├── capacity = Σ vehicle capacity on the route
//!     ├── riders   = assignments on the route
//!     ├── check_seat()                   active? stop served? seat left?
//!     └── upsert assignment (one route per student)
//!        COMMIT
//! ```

use sqlx::PgPool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::transport::{
    check_seat, route_capacity, AssignmentRequest, NewRoute, NewVehicle, RouteRider, RouteUpdate,
    TransportAssignment, TransportRoute, Vehicle,
};

const ROUTE_COLUMNS: &str = r#"
    id, school_id, name, start_point, end_point, stops, monthly_fee_paisa, is_active,
    created_at, updated_at
"#;

const VEHICLE_COLUMNS: &str = r#"
    id, school_id, route_id, registration_no, capacity, driver_name, driver_phone, created_at
"#;

const ASSIGNMENT_COLUMNS: &str = "id, school_id, student_id, route_id, pickup_stop, created_at";

/// Repository for transport database operations.
#[derive(Debug, Clone)]
pub struct TransportRepository {
    pool: PgPool,
}

impl TransportRepository {
    pub fn new(pool: PgPool) -> Self {
        TransportRepository { pool }
    }

    // =========================================================================
    // Routes
    // =========================================================================

    pub async fn get_route(&self, school_id: &str, id: &str) -> DbResult<Option<TransportRoute>> {
        let route = sqlx::query_as::<_, TransportRoute>(&format!(
            "SELECT {ROUTE_COLUMNS} FROM transport_routes WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(route)
    }

    pub async fn list_routes(&self, school_id: &str, include_inactive: bool) -> DbResult<Vec<TransportRoute>> {
        let routes = sqlx::query_as::<_, TransportRoute>(&format!(
            r#"
            SELECT {ROUTE_COLUMNS} FROM transport_routes
            WHERE school_id = $1 AND ($2 OR is_active)
            ORDER BY name
            "#
        ))
        .bind(school_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(routes)
    }

    pub async fn create_route(&self, school_id: &str, new: &NewRoute) -> DbResult<TransportRoute> {
        new.validate()?;

        let stops: Vec<String> = new.stops.iter().map(|s| s.trim().to_string()).collect();
        let route = sqlx::query_as::<_, TransportRoute>(&format!(
            r#"
            INSERT INTO transport_routes (id, school_id, name, start_point, end_point, stops, monthly_fee_paisa)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ROUTE_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(new.name.trim())
        .bind(new.start_point.trim())
        .bind(new.end_point.trim())
        .bind(&stops)
        .bind(new.monthly_fee_paisa)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", new.name.trim()))?;

        info!(school_id = %school_id, route_id = %route.id, name = %route.name, "Route created");
        Ok(route)
    }

    pub async fn update_route(&self, school_id: &str, id: &str, update: &RouteUpdate) -> DbResult<TransportRoute> {
        update.validate()?;

        let stops: Option<Vec<String>> = update
            .stops
            .as_ref()
            .map(|stops| stops.iter().map(|s| s.trim().to_string()).collect());

        let route = sqlx::query_as::<_, TransportRoute>(&format!(
            r#"
            UPDATE transport_routes SET
                name = COALESCE($3, name),
                start_point = COALESCE($4, start_point),
                end_point = COALESCE($5, end_point),
                stops = COALESCE($6, stops),
                monthly_fee_paisa = COALESCE($7, monthly_fee_paisa),
                is_active = COALESCE($8, is_active),
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {ROUTE_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.start_point.as_deref().map(str::trim))
        .bind(update.end_point.as_deref().map(str::trim))
        .bind(stops)
        .bind(update.monthly_fee_paisa)
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", update.name.as_deref().unwrap_or_default()))?
        .ok_or_else(|| DbError::not_found("Route", id))?;

        info!(school_id = %school_id, route_id = %id, "Route updated");
        Ok(route)
    }

    /// Deletes a route with its assignments; its vehicles become unassigned.
    pub async fn delete_route(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM transport_routes WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Route", id));
        }
        info!(school_id = %school_id, route_id = %id, "Route deleted");
        Ok(())
    }

    // =========================================================================
    // Vehicles
    // =========================================================================

    pub async fn list_vehicles(&self, school_id: &str, route_id: Option<&str>) -> DbResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            SELECT {VEHICLE_COLUMNS} FROM vehicles
            WHERE school_id = $1 AND ($2::text IS NULL OR route_id = $2)
            ORDER BY registration_no
            "#
        ))
        .bind(school_id)
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    pub async fn create_vehicle(&self, school_id: &str, new: &NewVehicle) -> DbResult<Vehicle> {
        new.validate()?;

        if let Some(route_id) = new.route_id.as_deref() {
            self.get_route(school_id, route_id)
                .await?
                .ok_or_else(|| DbError::not_found("Route", route_id))?;
        }

        let registration = new.registration_no.trim().to_uppercase();
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"
            INSERT INTO vehicles (id, school_id, route_id, registration_no, capacity, driver_name, driver_phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VEHICLE_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(new.route_id.as_deref())
        .bind(&registration)
        .bind(new.capacity)
        .bind(&new.driver_name)
        .bind(&new.driver_phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("registration_no", &registration))?;

        info!(
            school_id = %school_id,
            vehicle_id = %vehicle.id,
            capacity = vehicle.capacity,
            "Vehicle added"
        );
        Ok(vehicle)
    }

    pub async fn delete_vehicle(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vehicle", id));
        }
        info!(school_id = %school_id, vehicle_id = %id, "Vehicle removed");
        Ok(())
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    /// Gives a student a seat on a route, moving them off any previous route.
    ///
    /// ## Errors
    /// - `CoreError::RouteFull` when every seat is taken
    /// - `CoreError::Validation` for an inactive route or unknown stop
    /// - `DbError::NotFound` for an unknown route or student
    pub async fn assign(&self, school_id: &str, request: &AssignmentRequest) -> DbResult<TransportAssignment> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        let route = sqlx::query_as::<_, TransportRoute>(&format!(
            "SELECT {ROUTE_COLUMNS} FROM transport_routes WHERE school_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(school_id)
        .bind(&request.route_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Route", request.route_id.as_str()))?;

        let student: Option<String> = sqlx::query_scalar(
            "SELECT id FROM students WHERE school_id = $1 AND id = $2 AND is_active",
        )
        .bind(school_id)
        .bind(&request.student_id)
        .fetch_optional(&mut *tx)
        .await?;
        if student.is_none() {
            return Err(DbError::not_found("Student", request.student_id.as_str()));
        }

        let capacities: Vec<i32> = sqlx::query_scalar("SELECT capacity FROM vehicles WHERE route_id = $1")
            .bind(&route.id)
            .fetch_all(&mut *tx)
            .await?;

        let riders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transport_assignments WHERE route_id = $1")
            .bind(&route.id)
            .fetch_one(&mut *tx)
            .await?;

        let current_route: Option<String> =
            sqlx::query_scalar("SELECT route_id FROM transport_assignments WHERE student_id = $1")
                .bind(&request.student_id)
                .fetch_optional(&mut *tx)
                .await?;
        let already_on_route = current_route.as_deref() == Some(route.id.as_str());

        let pickup_stop = request
            .pickup_stop
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        check_seat(
            &route,
            route_capacity(capacities),
            riders,
            already_on_route,
            pickup_stop,
        )?;

        let assignment = sqlx::query_as::<_, TransportAssignment>(&format!(
            r#"
            INSERT INTO transport_assignments (id, school_id, student_id, route_id, pickup_stop)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (student_id) DO UPDATE SET
                route_id = EXCLUDED.route_id,
                pickup_stop = EXCLUDED.pickup_stop,
                created_at = now()
            RETURNING {ASSIGNMENT_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(&request.student_id)
        .bind(&route.id)
        .bind(pickup_stop)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            school_id = %school_id,
            student_id = %request.student_id,
            route = %route.name,
            moved_from = ?current_route.filter(|r| r != &route.id),
            "Student assigned to route"
        );
        Ok(assignment)
    }

    /// Removes a student's seat.
    pub async fn unassign(&self, school_id: &str, student_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM transport_assignments WHERE school_id = $1 AND student_id = $2")
            .bind(school_id)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transport assignment", student_id));
        }
        info!(school_id = %school_id, student_id = %student_id, "Student removed from route");
        Ok(())
    }

    /// Students riding a route, by class and roll.
    pub async fn riders(&self, school_id: &str, route_id: &str) -> DbResult<Vec<RouteRider>> {
        let riders = sqlx::query_as::<_, RouteRider>(
            r#"
            SELECT s.id AS student_id, s.student_code, s.name, s.class_name, s.section,
                   s.roll_number, a.pickup_stop
            FROM transport_assignments a
            JOIN students s ON s.id = a.student_id
            WHERE a.school_id = $1 AND a.route_id = $2
            ORDER BY s.class_name, s.section NULLS FIRST, s.roll_number NULLS LAST, s.name
            "#,
        )
        .bind(school_id)
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(riders)
    }

    pub async fn for_student(&self, school_id: &str, student_id: &str) -> DbResult<Option<TransportAssignment>> {
        let assignment = sqlx::query_as::<_, TransportAssignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM transport_assignments WHERE school_id = $1 AND student_id = $2"
        ))
        .bind(school_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }
}
