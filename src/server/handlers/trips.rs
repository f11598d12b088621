use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::TrackingMode;
use crate::auth::User;
use crate::entities::{PositionSample, RouteChangeRequest, Trip};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    route_id: Uuid,
}

#[derive(Serialize, Deserialize)]
pub struct StartParams {
    mode: TrackingMode,
}

#[derive(Serialize, Deserialize)]
pub struct RouteChangeParams {
    reason: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api.create_trip(user, params.route_id).await?;

    Ok(trip.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.find_trip(user, id).await?;

    Ok(trip.into())
}

pub async fn start(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    params: Option<Json<StartParams>>,
) -> Result<Json<Trip>, Error> {
    // no body means the device reports its own positions
    let mode = params.map_or(TrackingMode::Live, |Json(params)| params.mode);

    let trip = api.start_trip(user, id, mode).await?;

    Ok(trip.into())
}

pub async fn pause(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.pause_trip(user, id).await?;

    Ok(trip.into())
}

pub async fn restart(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.restart_trip(user, id).await?;

    Ok(trip.into())
}

/// Responds with the updated trip, or `null` if a live tracker took the sample.
pub async fn record_position(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(sample): Json<PositionSample>,
) -> Result<Json<Option<Trip>>, Error> {
    let trip = api.record_position(user, id, sample).await?;

    Ok(trip.into())
}

pub async fn request_route_change(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
    Json(params): Json<RouteChangeParams>,
) -> Result<Json<RouteChangeRequest>, Error> {
    let request = api.request_route_change(user, id, params.reason).await?;

    Ok(request.into())
}
