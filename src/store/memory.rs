use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::entities::{Post, Route, RouteChangeRequest, Trip};
use crate::error::{invalid_input_error, Error};

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    routes: RwLock<HashMap<Uuid, Route>>,
    trips: RwLock<HashMap<Uuid, Trip>>,
    posts: RwLock<Vec<Post>>,
    route_change_requests: RwLock<Vec<RouteChangeRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn route_change_requests(&self) -> Vec<RouteChangeRequest> {
        self.route_change_requests.read().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_route(&self, route: &Route) -> Result<(), Error> {
        self.routes.write().await.insert(route.id, route.clone());
        Ok(())
    }

    async fn find_route(&self, id: Uuid) -> Result<Route, Error> {
        self.routes
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(invalid_input_error)
    }

    async fn list_routes(&self) -> Result<Vec<Route>, Error> {
        let mut routes: Vec<Route> = self.routes.read().await.values().cloned().collect();
        routes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(routes)
    }

    async fn insert_trip(&self, trip: &Trip) -> Result<(), Error> {
        self.trips.write().await.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn find_trip(&self, id: Uuid) -> Result<Trip, Error> {
        self.trips
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(invalid_input_error)
    }

    async fn update_trip(&self, trip: &Trip) -> Result<(), Error> {
        let mut trips = self.trips.write().await;
        let slot = trips.get_mut(&trip.id).ok_or_else(invalid_input_error)?;
        *slot = trip.clone();
        Ok(())
    }

    async fn insert_post(&self, post: &Post) -> Result<(), Error> {
        self.posts.write().await.insert(0, post.clone());
        Ok(())
    }

    async fn find_post(&self, id: Uuid) -> Result<Post, Error> {
        self.posts
            .read()
            .await
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .ok_or_else(invalid_input_error)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), Error> {
        let mut posts = self.posts.write().await;
        let index = posts
            .iter()
            .position(|post| post.id == id)
            .ok_or_else(invalid_input_error)?;
        posts.remove(index);
        Ok(())
    }

    async fn list_posts(&self, limit: usize) -> Result<Vec<Post>, Error> {
        Ok(self.posts.read().await.iter().take(limit).cloned().collect())
    }

    async fn insert_route_change_request(
        &self,
        request: &RouteChangeRequest,
    ) -> Result<(), Error> {
        self.route_change_requests
            .write()
            .await
            .push(request.clone());
        Ok(())
    }
}
