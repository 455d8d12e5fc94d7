//! One-shot HTTP/1 request plumbing shared by both clients.
//!
//! Each call opens a fresh TCP connection, performs an http1 handshake,
//! sends a single request, and reads the full body, all under one
//! deadline. A missed deadline is a failure for this call; retries
//! happen at the cycle boundary, never here.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// A decoded response: status code plus collected body bytes.
pub(crate) struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Send one request and collect the response body under `timeout`.
pub(crate) async fn request(
    method: &str,
    address: &str,
    path: &str,
    body: Option<Vec<u8>>,
    timeout: Duration,
) -> ClientResult<RawResponse> {
    let uri = format!("http://{address}{path}");
    let millis = timeout.as_millis() as u64;

    let fut = async {
        let stream = tokio::net::TcpStream::connect(address).await.map_err(|e| {
            ClientError::Connect {
                addr: address.to_string(),
                reason: e.to_string(),
            }
        })?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) =
            hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| ClientError::Connect {
                    addr: address.to_string(),
                    reason: e.to_string(),
                })?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "statz-bridge/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| ClientError::Request {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Request {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Request {
                uri: uri.clone(),
                reason: e.to_string(),
            })?
            .to_bytes();

        debug!(%uri, status, bytes = body.len(), "collaborator call completed");
        Ok(RawResponse { status, body })
    };

    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Deadline { uri, millis }),
    }
}
