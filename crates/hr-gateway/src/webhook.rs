//! Webhook server for receiving USSD callbacks from the aggregator

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use hr_core::{UssdRequest, UssdRouter};

use crate::rate_limit::RateLimiter;

const MSG_BUSY: &str = "END Network busy. Please try again later.";
const MSG_UNAVAILABLE: &str = "END Service temporarily unavailable.";

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub router: Arc<UssdRouter>,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Webhook server
pub struct WebhookServer {
    addr: SocketAddr,
    state: WebhookState,
}

impl WebhookServer {
    /// Create a new webhook server
    pub fn new(addr: SocketAddr, router: Arc<UssdRouter>, rate_limiter: Arc<RateLimiter>) -> Self {
        let state = WebhookState {
            router,
            rate_limiter,
        };

        Self { addr, state }
    }

    /// Start the webhook server
    pub async fn start(self) -> anyhow::Result<()> {
        info!("Starting USSD webhook server on {}", self.addr);

        let app = routes(self.state);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the router; split out so tests can drive it directly
pub fn routes(state: WebhookState) -> Router {
    Router::new()
        .route("/ussd", post(handle_ussd))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Handle an incoming USSD callback.
///
/// The aggregator expects a plain-text body starting with CON or END;
/// anything else drops the call, so every path must produce one.
async fn handle_ussd(
    State(state): State<Arc<WebhookState>>,
    Form(req): Form<UssdRequest>,
) -> impl IntoResponse {
    info!(
        session_id = %req.session_id,
        caller = %req.phone_number,
        "USSD callback: {:?}",
        req.text
    );

    if !state.rate_limiter.check(&req.phone_number).await {
        return MSG_BUSY.to_string();
    }

    // Exchanges take per-session locks and may hit SQLite; keep them off
    // the async workers.
    let router = Arc::clone(&state.router);
    match tokio::task::spawn_blocking(move || router.handle(&req).render()).await {
        Ok(body) => body,
        Err(e) => {
            error!("USSD exchange panicked: {}", e);
            MSG_UNAVAILABLE.to_string()
        }
    }
}

/// Liveness probe
async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_core::{
        DialogRegistry, LogNotifier, SessionConfig, SessionStore, StaticDirectory,
    };
    use tower::ServiceExt;

    fn test_state() -> WebhookState {
        let store = Arc::new(SessionStore::new());
        let directory = Arc::new(StaticDirectory::new([(
            "EMP001".to_string(),
            "Alice".to_string(),
        )]));
        let router = UssdRouter::new(
            store,
            DialogRegistry::new(),
            directory,
            Arc::new(LogNotifier),
            SessionConfig::default(),
        );
        WebhookState {
            router: Arc::new(router),
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }

    #[tokio::test]
    async fn test_ussd_callback_returns_auth_prompt() {
        let app = routes(test_state());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/ussd")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(axum::body::Body::from(
                        "sessionId=s1&phoneNumber=%2B254711000111&text=",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.starts_with("CON "), "unexpected body: {body}");
        assert!(body.contains("Enter your Employee ID"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = routes(test_state());

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
