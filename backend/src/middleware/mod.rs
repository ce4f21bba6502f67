//! General-purpose middleware for the web application.
//!
//! Request tracing is applied to the whole router; route-level access
//! control lives in the `auth` extractors instead.

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Wrap the finished router with the shared HTTP layers.
pub fn with_http_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        ),
    )
}
