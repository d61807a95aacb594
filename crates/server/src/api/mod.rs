pub mod catalog;
pub mod debug;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod webhook;

pub use routes::create_router;
