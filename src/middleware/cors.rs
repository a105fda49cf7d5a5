use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

pub fn read_only_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any)
}
