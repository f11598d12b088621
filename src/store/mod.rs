mod locks;
mod memory;
mod postgres;

pub use locks::{RowGuard, RowLocks};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Post, Route, RouteChangeRequest, Trip};
use crate::error::Error;

/// Row storage for everything the engine persists. Lookups of unknown ids
/// fail with `invalid_input_error`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_route(&self, route: &Route) -> Result<(), Error>;
    async fn find_route(&self, id: Uuid) -> Result<Route, Error>;
    async fn list_routes(&self) -> Result<Vec<Route>, Error>;

    async fn insert_trip(&self, trip: &Trip) -> Result<(), Error>;
    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error>;
    async fn update_trip(&self, trip: &Trip) -> Result<(), Error>;

    async fn insert_post(&self, post: &Post) -> Result<(), Error>;
    async fn find_post(&self, id: Uuid) -> Result<Post, Error>;
    async fn delete_post(&self, id: Uuid) -> Result<(), Error>;
    /// Newest first.
    async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, Error>;

    async fn insert_route_change_request(&self, request: &RouteChangeRequest)
        -> Result<(), Error>;
}
