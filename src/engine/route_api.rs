use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RouteAPI,
    auth::{Platform, User},
    entities::{Coordinates, Route},
    error::Error,
};

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self, points))]
    async fn create_route(
        &self,
        user: User,
        name: String,
        points: Vec<Coordinates>,
    ) -> Result<Route, Error> {
        self.authorize(user.clone(), "create_route", Platform::default())?;

        let route = Route::new(name, points)?;

        self.store().insert_route(&route).await?;

        tracing::info!("created route {} of {:.0}m", route.id, route.length_m);

        Ok(route)
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self, user: User, id: Uuid) -> Result<Route, Error> {
        self.authorize(user.clone(), "read_routes", Platform::default())?;

        self.store().find_route(id).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_routes(&self, user: User) -> Result<Vec<Route>, Error> {
        self.authorize(user.clone(), "read_routes", Platform::default())?;

        self.store().list_routes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{engine, route_points};
    use tokio_test::block_on;

    #[test]
    fn coordinators_create_routes() {
        let (engine, _) = engine();

        let walker = User::new("walker".into());
        let coordinator = User::new("coordinator".into()).with_role("coordinator");

        let err = block_on(engine.create_route(walker.clone(), "a".into(), route_points()))
            .unwrap_err();
        assert!(err.is_unauthorized_error());

        let route =
            block_on(engine.create_route(coordinator, "Center City".into(), route_points()))
                .unwrap();

        let found = block_on(engine.find_route(walker.clone(), route.id)).unwrap();
        assert_eq!(found, route);

        let routes = block_on(engine.list_routes(walker)).unwrap();
        assert_eq!(routes.len(), 1);
    }

    #[test]
    fn short_routes_are_rejected() {
        let (engine, _) = engine();

        let err = block_on(engine.create_route(
            User::new_system_user(),
            "dot".into(),
            vec![Coordinates::new(0.0, 0.0)],
        ))
        .unwrap_err();

        assert!(err.is_invalid_input_error());
    }
}
