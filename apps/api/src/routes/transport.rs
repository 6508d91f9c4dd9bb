//! Routes, vehicles and student seat assignments.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::transport::{
    AssignmentRequest, NewRoute, NewVehicle, RouteRider, RouteUpdate, TransportAssignment,
    TransportRoute, Vehicle,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/{id}", put(update_route).delete(delete_route))
        .route("/routes/{id}/students", get(route_students))
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route("/vehicles/{id}", delete(delete_vehicle))
        .route("/assignments", post(assign))
        .route("/assignments/{student_id}", delete(unassign))
}

// =============================================================================
// Routes
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RouteQuery {
    #[serde(default)]
    include_inactive: bool,
}

/// GET /api/transport/routes
async fn list_routes(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<RouteQuery>,
) -> ApiResult<ApiResponse<Vec<TransportRoute>>> {
    auth.require(Resource::Transport, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let routes = state.db.transport().list_routes(&school, query.include_inactive).await?;
    Ok(ApiResponse::ok(routes))
}

/// POST /api/transport/routes
async fn create_route(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewRoute>,
) -> ApiResult<ApiResponse<TransportRoute>> {
    auth.require(Resource::Transport, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let route = state.db.transport().create_route(&school, &new).await?;
    Ok(ApiResponse::created(route))
}

/// PUT /api/transport/routes/{id}
async fn update_route(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<RouteUpdate>,
) -> ApiResult<ApiResponse<TransportRoute>> {
    auth.require(Resource::Transport, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let route = state.db.transport().update_route(&school, &id, &update).await?;
    Ok(ApiResponse::ok(route))
}

/// DELETE /api/transport/routes/{id}
async fn delete_route(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Transport, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.transport().delete_route(&school, &id).await?;
    Ok(ApiResponse::message("Route deleted"))
}

/// GET /api/transport/routes/{id}/students
async fn route_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<RouteRider>>> {
    auth.require(Resource::Transport, Action::Read)?;
    let school = auth.school(scope.requested())?;

    Ok(ApiResponse::ok(state.db.transport().riders(&school, &id).await?))
}

// =============================================================================
// Vehicles
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct VehicleQuery {
    route_id: Option<String>,
}

/// GET /api/transport/vehicles?route_id=
async fn list_vehicles(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<VehicleQuery>,
) -> ApiResult<ApiResponse<Vec<Vehicle>>> {
    auth.require(Resource::Transport, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let vehicles = state.db.transport().list_vehicles(&school, query.route_id.as_deref()).await?;
    Ok(ApiResponse::ok(vehicles))
}

/// POST /api/transport/vehicles
async fn create_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewVehicle>,
) -> ApiResult<ApiResponse<Vehicle>> {
    auth.require(Resource::Transport, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let vehicle = state.db.transport().create_vehicle(&school, &new).await?;
    Ok(ApiResponse::created(vehicle))
}

/// DELETE /api/transport/vehicles/{id}
async fn delete_vehicle(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Transport, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.transport().delete_vehicle(&school, &id).await?;
    Ok(ApiResponse::message("Vehicle deleted"))
}

// =============================================================================
// Assignments
// =============================================================================

/// POST /api/transport/assignments
///
/// A student already on a route is moved; a full route answers 422.
async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(request): Body<AssignmentRequest>,
) -> ApiResult<ApiResponse<TransportAssignment>> {
    auth.require(Resource::Transport, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let assignment = state.db.transport().assign(&school, &request).await?;
    Ok(ApiResponse::created(assignment))
}

/// DELETE /api/transport/assignments/{student_id}
async fn unassign(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(student_id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Transport, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.transport().unassign(&school, &student_id).await?;
    Ok(ApiResponse::message("Assignment removed"))
}
