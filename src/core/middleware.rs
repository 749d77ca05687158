use crate::core::error::AppError;
use crate::features::auth::AuthGate;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

fn bearer_token(req: &Request) -> Result<&str, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })
}

/// Require a valid bearer token; the resolved identity lands in request
/// extensions. Missing header is a 401, a bad token a 403.
pub async fn auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;
    let user = gate.resolve(token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Resolve an identity if a valid token is present; never rejects. Used on
/// the public surface where authentication is informative, not required.
pub async fn optional_auth_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = bearer_token(&req).ok().map(str::to_string);
    if let Some(token) = token {
        if let Ok(user) = gate.resolve(&token).await {
            req.extensions_mut().insert(user);
        }
    }
    next.run(req).await
}

struct WindowSlot {
    window_start: Instant,
    count: u32,
}

/// Fixed-window per-IP request limiter held in process memory. Counters
/// reset when a window elapses; the map is pruned once it grows past
/// 10k addresses.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    slots: Mutex<HashMap<IpAddr, WindowSlot>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        if slots.len() > 10_000 {
            let window = self.window;
            slots.retain(|_, slot| now.duration_since(slot.window_start) < window);
        }

        let slot = slots.entry(ip).or_insert(WindowSlot {
            window_start: now,
            count: 0,
        });

        if now.duration_since(slot.window_start) >= self.window {
            slot.window_start = now;
            slot.count = 0;
        }

        slot.count += 1;
        slot.count <= self.max_requests
    }
}

/// Reject clients that exceed the per-window request budget with a 429.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Connect info is absent in tests that drive the router directly
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check(ip) {
        return Err(AppError::RateLimitExceeded(
            "Too many requests, please try again later".to_string(),
        ));
    }

    Ok(next.run(req).await)
}
