//! HTTP routes.

pub mod health;
pub mod openapi;
pub mod session;

pub use health::{HealthResponse, health_routes};
pub use openapi::{ApiDoc, openapi_routes};
pub use session::{
    SessionView, delete_value_handler, destroy_session_handler, get_session_handler,
    get_value_handler, put_value_handler, session_routes,
};
