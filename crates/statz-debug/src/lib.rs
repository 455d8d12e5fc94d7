//! statz-debug — on-demand HTML inspection of the current snapshot.
//!
//! Serves one route, `GET /statz`. Every request fetches a fresh
//! snapshot (no caching across requests) and renders it into a fixed
//! HTML template. The response is always 200 with an HTML body: a
//! fetch failure is reported in-band via a placeholder entry on the
//! page, never as an HTTP error.

pub mod renderer;

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tracing::{debug, warn};

use statz_client::SnapshotSource;

pub use renderer::{render, ACCESS_ERROR_DIAGNOSTIC, ACCESS_ERROR_NAME};

/// Shared state for the debug handler.
#[derive(Clone)]
pub struct DebugState {
    pub source: Arc<dyn SnapshotSource>,
}

/// Build the debug router.
pub fn debug_router(state: DebugState) -> Router {
    Router::new()
        .route("/statz", get(statz_page))
        .with_state(state)
}

/// GET /statz — fetch a fresh snapshot and render it.
async fn statz_page(State(state): State<DebugState>) -> Html<String> {
    debug!("fetching snapshot for debug page");
    let fetch = state.source.get_snapshot().await;
    if let Err(e) = &fetch {
        // Shown in-band as the fixed placeholder; details go here only.
        warn!(error = %e, "snapshot fetch failed for debug page");
    }
    Html(render(fetch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use statz_client::{BoxFuture, ClientError, ClientResult};
    use statz_core::{Aggregation, Snapshot, View};

    struct FixedSource {
        snapshot: Option<Snapshot>,
    }

    impl SnapshotSource for FixedSource {
        fn get_snapshot(&self) -> BoxFuture<'_, ClientResult<Snapshot>> {
            Box::pin(async move {
                match &self.snapshot {
                    Some(s) => Ok(s.clone()),
                    None => Err(ClientError::Connect {
                        addr: "127.0.0.1:8080".to_string(),
                        reason: "connection refused".to_string(),
                    }),
                }
            })
        }
    }

    fn router(snapshot: Option<Snapshot>) -> Router {
        debug_router(DebugState {
            source: Arc::new(FixedSource { snapshot }),
        })
    }

    async fn get_statz(router: Router) -> (u16, String, String) {
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/statz")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_the_snapshot_as_html() {
        let snapshot = Snapshot {
            views: vec![View {
                name: "rpc.count".to_string(),
                description: "completed rpcs".to_string(),
                aggregation: Aggregation::Interval { value: 42.0 },
            }],
        };

        let (status, content_type, body) = get_statz(router(Some(snapshot))).await;
        assert_eq!(status, 200);
        assert!(content_type.starts_with("text/html"));
        assert!(body.contains("rpc.count"));
    }

    #[tokio::test]
    async fn repeated_source_failures_still_return_success_pages() {
        for _ in 0..3 {
            let (status, content_type, body) = get_statz(router(None)).await;
            assert_eq!(status, 200, "failures are reported in-band, not as HTTP errors");
            assert!(content_type.starts_with("text/html"));
            assert!(body.contains(ACCESS_ERROR_NAME));
        }
    }
}
