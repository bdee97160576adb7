//! sizer-api — REST façade over the sizing engine.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/size/custom` | Compute a sizing plan for the given workloads |
//! | GET | `/size/platforms` | List supported platforms |
//! | GET | `/size/instances/{platform}` | A platform's instance catalog |

pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sizer_core::policy::ControlPlanePolicy;

pub use handlers::SizeRequest;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub policy: Arc<ControlPlanePolicy>,
}

/// Build the API router.
pub fn build_router(policy: ControlPlanePolicy) -> Router {
    let state = ApiState { policy: Arc::new(policy) };

    Router::new()
        .route("/size/custom", post(handlers::size_custom))
        .route("/size/platforms", get(handlers::list_platforms))
        .route("/size/instances/{platform}", get(handlers::platform_instances))
        .with_state(state)
}
