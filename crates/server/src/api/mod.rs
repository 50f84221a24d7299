pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod summary;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
