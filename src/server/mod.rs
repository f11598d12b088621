mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, patch, post},
    Router,
};

use crate::server::handlers::{posts, routes, trips};
use crate::{
    api::API,
    auth::User,
    error::{unexpected_error, Error},
};

type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/routes", post(routes::create).get(routes::list))
        .route("/routes/:id", get(routes::find))
        .route("/trips", post(trips::create))
        .route("/trips/:id", get(trips::find))
        .route("/trips/:id/start", patch(trips::start))
        .route("/trips/:id/pause", patch(trips::pause))
        .route("/trips/:id/restart", patch(trips::restart))
        .route("/trips/:id/positions", post(trips::record_position))
        .route("/trips/:id/route_change", post(trips::request_route_change))
        .route(
            "/trips/:id/report",
            patch(posts::begin_report).post(posts::report_issue),
        )
        .route("/trips/:id/report/cancel", patch(posts::cancel_report))
        .route("/trips/:id/complete", post(posts::complete_trip))
        .route("/posts", get(posts::list))
        .route("/posts/:id", delete(posts::delete))
        .layer(Extension(api))
        .layer(Extension(User::new_system_user()))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(router(api).into_make_service())
        .await
        .map_err(|err| {
            tracing::error!("server error: {}", err);
            unexpected_error()
        })
}
