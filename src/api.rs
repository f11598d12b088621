use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::auth::User;
use crate::entities::{Coordinates, PositionSample, Post, Route, RouteChangeRequest, Trip};
use crate::error::Error;

/// Where a started trip gets its position samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Samples are posted by the walker's device.
    Live,
    /// A timer walks the route on the walker's behalf.
    Simulated,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IssueReport {
    #[serde(default)]
    pub comment: String,
    pub image: Option<String>,
    pub category: Option<String>,
}

#[async_trait]
pub trait RouteAPI {
    async fn create_route(
        &self,
        user: User,
        name: String,
        points: Vec<Coordinates>,
    ) -> Result<Route, Error>;
    async fn find_route(&self, user: User, id: Uuid) -> Result<Route, Error>;
    async fn list_routes(&self, user: User) -> Result<Vec<Route>, Error>;
}

#[async_trait]
pub trait TripAPI {
    async fn create_trip(&self, user: User, route_id: Uuid) -> Result<Trip, Error>;
    async fn find_trip(&self, user: User, id: Uuid) -> Result<Trip, Error>;
    async fn start_trip(&self, user: User, id: Uuid, mode: TrackingMode) -> Result<Trip, Error>;
    async fn pause_trip(&self, user: User, id: Uuid) -> Result<Trip, Error>;
    async fn restart_trip(&self, user: User, id: Uuid) -> Result<Trip, Error>;
    /// Returns the updated trip, or `None` when the sample was queued for a
    /// live tracker.
    async fn record_position(
        &self,
        user: User,
        id: Uuid,
        sample: PositionSample,
    ) -> Result<Option<Trip>, Error>;
    /// Follows the trip's tracker. Without a running tracker the receiver
    /// only holds the current trip and its sender is already gone, so
    /// `changed()` fails at once.
    async fn subscribe_trip(&self, user: User, id: Uuid) -> Result<watch::Receiver<Trip>, Error>;
    async fn request_route_change(
        &self,
        user: User,
        id: Uuid,
        reason: String,
    ) -> Result<RouteChangeRequest, Error>;
}

#[async_trait]
pub trait PostAPI {
    async fn begin_report(&self, user: User, trip_id: Uuid) -> Result<Trip, Error>;
    async fn cancel_report(&self, user: User, trip_id: Uuid) -> Result<Trip, Error>;
    async fn report_issue(
        &self,
        user: User,
        trip_id: Uuid,
        report: IssueReport,
    ) -> Result<Post, Error>;
    async fn complete_trip(
        &self,
        user: User,
        trip_id: Uuid,
        comment: String,
        image: Option<String>,
    ) -> Result<Post, Error>;
    async fn list_posts(&self, user: User, limit: usize) -> Result<Vec<Post>, Error>;
    async fn delete_post(&self, user: User, id: Uuid) -> Result<(), Error>;
}

pub trait API: RouteAPI + TripAPI + PostAPI {}
