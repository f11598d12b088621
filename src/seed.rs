//! Loading routes from a JSON file at startup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::RouteAPI;
use crate::auth::User;
use crate::entities::{Coordinates, Route};
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteSeed {
    pub name: String,
    pub points: Vec<Coordinates>,
}

pub fn parse_routes(json: &str) -> Result<Vec<RouteSeed>, Error> {
    Ok(serde_json::from_str(json)?)
}

#[tracing::instrument]
pub fn read_routes(path: &Path) -> Result<Vec<RouteSeed>, Error> {
    let json = fs::read_to_string(path)?;

    parse_routes(&json)
}

/// Creates every seeded route as the system user.
pub async fn seed_routes<A>(api: &A, seeds: Vec<RouteSeed>) -> Result<Vec<Route>, Error>
where
    A: RouteAPI + ?Sized,
{
    let mut routes = Vec::with_capacity(seeds.len());

    for seed in seeds {
        let route = api
            .create_route(User::new_system_user(), seed.name, seed.points)
            .await?;

        tracing::info!("seeded route {} ({:.0}m)", route.name, route.length_m);

        routes.push(route);
    }

    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::engine;

    const ROUTES: &str = r#"[
        {
            "name": "Rittenhouse",
            "points": [
                { "lat": 39.9496, "lng": -75.1719 },
                { "lat": 39.9496, "lng": -75.1700 },
                { "lat": 39.9510, "lng": -75.1700 }
            ]
        }
    ]"#;

    #[test]
    fn parses_route_file() {
        let seeds = parse_routes(ROUTES).unwrap();

        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].name, "Rittenhouse");
        assert_eq!(seeds[0].points[2], Coordinates::new(39.9510, -75.1700));

        let err = parse_routes("[{\"name\": 1}]").unwrap_err();
        assert!(err.is_invalid_input_error());
    }

    #[tokio::test]
    async fn seeds_routes_as_system_user() {
        let (engine, _) = engine();

        let routes = seed_routes(&engine, parse_routes(ROUTES).unwrap())
            .await
            .unwrap();
        assert_eq!(routes.len(), 1);

        let listed = engine
            .list_routes(User::new("walker".into()))
            .await
            .unwrap();
        assert_eq!(listed[0].id, routes[0].id);
        assert!(listed[0].length_m > 0.0);
    }

    #[test]
    fn short_routes_are_rejected() {
        let (engine, _) = engine();
        let seeds = vec![RouteSeed {
            name: "stub".into(),
            points: vec![Coordinates::new(0.0, 0.0)],
        }];

        let err = tokio_test::block_on(seed_routes(&engine, seeds)).unwrap_err();
        assert!(err.is_invalid_input_error());
    }
}
