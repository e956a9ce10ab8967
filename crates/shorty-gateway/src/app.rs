use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    health_handler, home_handler, list_handler, redirect_handler, shorten_handler, stats_handler,
};
use crate::state::AppState;

pub struct App {}

impl App {
    /// Builds the router. `/list` is only mounted when `debug` is set.
    pub fn router(state: AppState, debug: bool) -> Router {
        let mut router = Router::new()
            .route("/", get(home_handler))
            .route("/health", get(health_handler))
            .route("/shorten", post(shorten_handler))
            .route("/s/{short_code}", get(redirect_handler))
            .route("/stats/{short_code}", get(stats_handler));

        if debug {
            router = router.route("/list", get(list_handler));
        }

        router.layer(TraceLayer::new_for_http()).with_state(state)
    }
}
