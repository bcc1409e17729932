//! GitHub webhook ingestion.
//!
//! Signature verification runs before any payload parsing. When a secret is
//! configured, a missing, malformed, or mismatched `X-Hub-Signature-256`
//! header rejects the delivery with 403; no secret disables verification.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info};

use diffscope::types::Task;

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
pub const EVENT_HEADER: &str = "x-github-event";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Actions that trigger a background ranking task.
const RANKED_ACTIONS: &[&str] = &["opened", "synchronize"];

#[derive(Debug, Default, Deserialize)]
struct PullRequestEvent {
    #[serde(default)]
    action: String,
    #[serde(default)]
    pull_request: PullRequestRef,
    #[serde(default)]
    repository: RepositoryRef,
}

#[derive(Debug, Default, Deserialize)]
struct PullRequestRef {
    #[serde(default)]
    number: u64,
}

#[derive(Debug, Default, Deserialize)]
struct RepositoryRef {
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: OwnerRef,
}

#[derive(Debug, Default, Deserialize)]
struct OwnerRef {
    #[serde(default)]
    login: String,
}

/// Verifies `sha256=<hex>` against an HMAC-SHA256 of the raw body.
///
/// `verify_slice` compares in constant time; everything before it only
/// rejects structurally invalid headers.
pub fn verify_signature(secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header else {
        return false;
    };
    let Some(hex_digest) = header.strip_prefix(SIGNATURE_PREFIX) else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

pub async fn webhook_handler(
    State(state): State<HandlerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !verify_signature(secret, &body, signature) {
            return Err(GatewayError::SignatureInvalid);
        }
    }

    // Every event carries a JSON body, including ping.
    let payload: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if event == "ping" {
        return Ok(axum::Json(serde_json::json!({ "ok": true })).into_response());
    }

    if event == "pull_request" {
        let event: PullRequestEvent =
            serde_json::from_value(payload).unwrap_or_default();

        if RANKED_ACTIONS.contains(&event.action.as_str()) {
            let repo = format!("{}/{}", event.repository.owner.login, event.repository.name);
            info!(
                pr_id = event.pull_request.number,
                repo = %repo,
                action = %event.action,
                "Enqueueing ranking task from webhook"
            );
            // The queue worker resolves the changed files.
            state
                .queue
                .enqueue(Task::rank_pr(event.pull_request.number, repo));
        } else {
            debug!(action = %event.action, "Ignoring pull_request action");
        }

        return Ok(StatusCode::OK.into_response());
    }

    debug!(event, "Ignoring webhook event");
    Ok(StatusCode::OK.into_response())
}
