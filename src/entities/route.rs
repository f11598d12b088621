use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};
use crate::progress::route_length;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub points: Vec<Coordinates>,
    pub length_m: f64,
}

impl Route {
    pub fn new(name: String, points: Vec<Coordinates>) -> Result<Self, Error> {
        if points.len() < 2 {
            return Err(invalid_input_error());
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            length_m: route_length(&points),
            points,
        })
    }

    pub fn start(&self) -> Coordinates {
        self.points[0]
    }

    pub fn end(&self) -> Coordinates {
        self.points[self.points.len() - 1]
    }
}

#[test]
fn route_requires_two_points() {
    let err = Route::new("short".into(), vec![Coordinates::new(0.0, 0.0)]).unwrap_err();
    assert!(err.is_invalid_input_error());

    let route = Route::new(
        "equator".into(),
        vec![Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 0.01)],
    )
    .unwrap();
    assert!((route.length_m - 1111.95).abs() < 0.1);
    assert_eq!(route.start(), Coordinates::new(0.0, 0.0));
    assert_eq!(route.end(), Coordinates::new(0.0, 0.01));
}
