//! HTTP client for agent-to-agent calls
//!
//! `call` never fails: non-2xx answers, unreadable bodies and connection
//! faults all come back as error envelopes so callers branch on a single
//! shape. One attempt per call, bounded by the client timeout.

use super::{RpcError, RpcRequest, RpcResponse, JSONRPC_VERSION};
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn call(
        &self,
        url: &str,
        method: &str,
        params: Value,
        request_id: i64,
    ) -> RpcResponse {
        let request = RpcRequest::new(method, params, request_id);

        debug!(url, method, request_id, "Sending agent request");

        let response = match self.client.post(url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, method, request_id, error = %e, "Agent request failed");
                return RpcResponse::failure(request_id, self.transport_error(url, &e));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(url, request_id, error = %e, "Failed to read agent response body");
                return RpcResponse::failure(request_id, self.transport_error(url, &e));
            }
        };

        if !status.is_success() {
            warn!(url, request_id, status = status.as_u16(), "Agent returned error status");
            return RpcResponse::failure(
                request_id,
                RpcError::new(
                    i64::from(status.as_u16()),
                    format!("Agent endpoint {} returned HTTP {}: {}", url, status, body),
                ),
            );
        }

        decode_envelope(&body, request_id)
    }

    fn transport_error(&self, url: &str, error: &reqwest::Error) -> RpcError {
        if error.is_timeout() {
            RpcError::transport(format!(
                "Request to {} timed out after {:?}: {}",
                url, self.timeout, error
            ))
        } else {
            RpcError::transport(format!("Request to {} failed: {}", url, error))
        }
    }
}

/// Decode and structurally validate a response body
fn decode_envelope(body: &str, request_id: i64) -> RpcResponse {
    let envelope: RpcResponse = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return RpcResponse::failure(
                request_id,
                RpcError::malformed(format!("Invalid response envelope: {} | body={}", e, body)),
            );
        }
    };

    if envelope.jsonrpc != JSONRPC_VERSION {
        return RpcResponse::failure(
            request_id,
            RpcError::malformed(format!(
                "Unsupported protocol version {:?}",
                envelope.jsonrpc
            )),
        );
    }

    if envelope.id != request_id {
        return RpcResponse::failure(
            request_id,
            RpcError::malformed(format!(
                "Response id {} does not match request id {}",
                envelope.id, request_id
            )),
        );
    }

    RpcResponse::from_outcome(request_id, envelope.into_outcome())
}
