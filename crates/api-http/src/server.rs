//! HTTP server setup and request routing.
//!
//! Requests flow through request-id injection, tracing and a timeout before
//! reaching a handler.

use crate::{handlers, AppState};
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_router(state: AppState) -> Router {
    let queue_routes = Router::new()
        .route(
            "/queues",
            post(handlers::create_queue).get(handlers::list_queues),
        )
        .route("/queues/{id}", delete(handlers::delete_queue))
        .route("/queues/{id}/empty", post(handlers::empty_queue))
        .route(
            "/queues/{id}/subscribers",
            post(handlers::add_subscriber).get(handlers::list_subscribers),
        )
        .route(
            "/queues/{id}/subscribers/{sub_id}",
            delete(handlers::remove_subscriber),
        )
        .route("/queues/{id}/messages", post(handlers::send_message));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(queue_routes)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Propagate the caller's X-Request-Id, or mint one, and echo it back
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(request_id.clone());
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serve until `shutdown` resolves, then drain in-flight requests
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
