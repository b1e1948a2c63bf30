use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service, ServiceExt};

/// Tower Layer for access logging.
///
/// Emits one structured tracing event per API request with method,
/// normalized path, status, and timing. Session tokens appearing in
/// paths are collapsed before logging so they never reach the logs.
#[derive(Clone, Default)]
pub struct AccessLogLayer;

impl AccessLogLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

#[derive(Clone)]
pub struct AccessLogService<S> {
    inner: S,
}

impl<S> Service<Request> for AccessLogService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let not_ready = self.inner.clone();
        let ready = std::mem::replace(&mut self.inner, not_ready);

        Box::pin(async move {
            let path = req.uri().path().to_owned();

            // Only log API endpoints
            if !path.starts_with("/v1/") {
                return Ok(ready.oneshot(req).await.into_response());
            }

            let start = Instant::now();
            let method = req.method().to_string();
            let normalized_path = normalize_path(&path);

            let response = ready.oneshot(req).await.into_response();

            let status_code = response.status().as_u16();
            let response_time_ms = start.elapsed().as_millis().min(i32::MAX as u128) as i32;

            tracing::info!(
                method = %method,
                path = %normalized_path,
                status_code,
                response_time_ms,
                "api access"
            );

            Ok(response)
        })
    }
}

/// Collapse the session-token tail of `/v1/session/{id}` so tokens are
/// never logged.
fn normalize_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/v1/session/")
        && !rest.is_empty()
    {
        "/v1/session/{id}".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_session_token() {
        assert_eq!(
            normalize_path("/v1/session/3q2-8fJx_token-material"),
            "/v1/session/{id}"
        );
    }

    #[test]
    fn normalize_keeps_other_paths() {
        assert_eq!(normalize_path("/v1/ask"), "/v1/ask");
        assert_eq!(normalize_path("/v1/session"), "/v1/session");
        assert_eq!(normalize_path("/health"), "/health");
    }
}
