pub mod posts;
pub mod routes;
pub mod trips;
