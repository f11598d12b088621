mod coordinates;
mod position;
mod post;
mod route;
mod route_change;
mod trip;

pub use coordinates::Coordinates;
pub use position::PositionSample;
pub use post::{Kind as PostKind, Post, ALERT_AUTHOR, DEFAULT_ALERT_COMMENT};
pub use route::Route;
pub use route_change::RouteChangeRequest;
pub use trip::{Status as TripStatus, Trip};
