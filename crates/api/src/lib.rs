pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};
