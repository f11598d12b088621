use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::User;
use crate::entities::Coordinates;
use crate::server::DynAPI;
use crate::{entities::Route, error::Error};

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    name: String,
    points: Vec<Coordinates>,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Route>, Error> {
    let route = api.create_route(user, params.name, params.points).await?;

    Ok(route.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, Error> {
    let route = api.find_route(user, id).await?;

    Ok(route.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Route>>, Error> {
    let routes = api.list_routes(user).await?;

    Ok(routes.into())
}
