pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod process;
pub mod routes;

pub use routes::create_router;
