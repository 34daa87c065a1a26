//! RPC request handlers.
//!
//! Storage work runs on tokio's blocking pool; handlers only parse, resolve
//! the client address, consult the captcha oracle and shape responses.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use pmp_confessions::{BrowsePage, VoteOutcome};
use pmp_crypto::secret_matches;
use pmp_lottery::{ClaimOutcome, DrawRequest, DEFAULT_DRAW_COUNT};
use pmp_service::{Campaign, ServiceError, Submission};
use pmp_store::{Lottery, LotteryWinner, TicketRange};
use pmp_types::{ConfessionId, LotteryId, TicketCode, Timestamp};

use crate::client_ip::client_ip;
use crate::error::RpcError;
use crate::pagination::{next_offset, BrowseQuery};
use crate::server::AppState;

// ── Shared ───────────────────────────────────────────────────────────────

/// A JSON integer that may also arrive as a decimal string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LooseInt {
    Number(i64),
    Text(String),
}

impl LooseInt {
    pub fn value(&self) -> Option<i64> {
        match self {
            LooseInt::Number(n) => Some(*n),
            LooseInt::Text(s) => s.trim().parse().ok(),
        }
    }

    fn positive(&self) -> Option<u64> {
        self.value().and_then(|n| u64::try_from(n).ok()).filter(|&n| n > 0)
    }
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| RpcError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

/// Run a campaign call on the blocking pool.
async fn blocking<T, F>(campaign: &Arc<Campaign>, call: F) -> Result<T, RpcError>
where
    T: Send + 'static,
    F: FnOnce(&Campaign) -> Result<T, ServiceError> + Send + 'static,
{
    let campaign = Arc::clone(campaign);
    Ok(tokio::task::spawn_blocking(move || call(&campaign)).await??)
}

fn peer_addr(peer: Option<ConnectInfo<SocketAddr>>) -> Option<SocketAddr> {
    peer.map(|ConnectInfo(addr)| addr)
}

// ── Confess ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfessRequest {
    pub confession_text: Option<String>,
    pub turnstile_token: Option<String>,
    pub fp_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfessResponse {
    pub code: TicketCode,
}

pub async fn confess(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<ConfessRequest>, JsonRejection>,
) -> Result<Json<ConfessResponse>, RpcError> {
    let request = json_body(payload)?;
    let (Some(text), Some(token), Some(fingerprint)) = (
        non_empty(request.confession_text),
        non_empty(request.turnstile_token),
        non_empty(request.fp_hash),
    ) else {
        return Err(ServiceError::Validation("Missing required fields".to_string()).into());
    };

    let ip = client_ip(&headers, peer_addr(peer));
    let captcha_verified = state.captcha.verify(&token, Some(&ip)).await?;
    let submission = Submission {
        text,
        fingerprint,
        client_ip: ip,
        captcha_verified,
    };
    let code = blocking(&state.campaign, move |c| c.submit_confession(&submission)).await?;
    Ok(Json(ConfessResponse { code }))
}

// ── Admin ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequest {
    pub action: Option<String>,
    pub admin_secret: Option<String>,
    pub name: Option<String>,
    pub lottery_id: Option<LooseInt>,
    pub count: Option<LooseInt>,
    /// Inclusive lower bound on ticket creation, unix seconds.
    pub from_date: Option<LooseInt>,
    /// Inclusive upper bound on ticket creation, unix seconds.
    pub to_date: Option<LooseInt>,
}

#[derive(Serialize)]
pub struct LotteryResponse {
    pub ok: bool,
    pub lottery: Lottery,
}

#[derive(Serialize)]
pub struct LotteryRef {
    pub id: LotteryId,
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResponse {
    pub ok: bool,
    pub lottery: LotteryRef,
    pub winners_selected: usize,
    pub winners: Vec<LotteryWinner>,
    /// Hex-encoded shuffle seed; replays the draw.
    pub seed: String,
    pub pool_size: usize,
}

#[derive(Serialize)]
pub struct WinnersResponse {
    pub ok: bool,
    pub winners: Vec<LotteryWinner>,
}

/// Winner count: absent, unparsable or zero means the default; anything
/// else is passed through for the engine to range-check.
fn draw_count(raw: Option<&LooseInt>) -> u32 {
    match raw.and_then(LooseInt::value) {
        None | Some(0) => DEFAULT_DRAW_COUNT,
        Some(n) if n < 0 => 0,
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
    }
}

fn timestamp(raw: Option<&LooseInt>) -> Option<Timestamp> {
    raw.and_then(LooseInt::value)
        .and_then(|n| u64::try_from(n).ok())
        .map(Timestamp::new)
}

fn required_lottery(raw: Option<&LooseInt>) -> Result<LotteryId, RpcError> {
    raw.and_then(LooseInt::positive)
        .map(LotteryId::new)
        .ok_or_else(|| RpcError::BadRequest("Lottery ID is required".to_string()))
}

pub async fn admin(
    State(state): State<AppState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> Result<Response, RpcError> {
    let request = json_body(payload)?;
    match (&state.admin_secret, &request.admin_secret) {
        (Some(expected), Some(given)) if secret_matches(expected, given) => {}
        _ => {
            tracing::warn!(action = ?request.action, "admin request refused");
            return Err(RpcError::Unauthorized);
        }
    }

    match request.action.as_deref() {
        Some("create_lottery") => {
            let name = request.name.unwrap_or_default();
            let lottery = blocking(&state.campaign, move |c| c.create_lottery(&name)).await?;
            Ok(Json(LotteryResponse { ok: true, lottery }).into_response())
        }
        Some("pick_winners") => {
            let draw = DrawRequest {
                lottery_id: required_lottery(request.lottery_id.as_ref())?,
                count: draw_count(request.count.as_ref()),
                range: TicketRange {
                    from: timestamp(request.from_date.as_ref()),
                    to: timestamp(request.to_date.as_ref()),
                },
            };
            let result = blocking(&state.campaign, move |c| c.draw_winners(&draw)).await?;
            Ok(Json(DrawResponse {
                ok: true,
                lottery: LotteryRef {
                    id: result.lottery.id,
                    name: result.lottery.name,
                },
                winners_selected: result.winners.len(),
                winners: result.winners,
                seed: hex::encode(result.seed),
                pool_size: result.pool_size,
            })
            .into_response())
        }
        Some("list_winners") => {
            let lottery_id = required_lottery(request.lottery_id.as_ref())?;
            let winners = blocking(&state.campaign, move |c| c.list_winners(lottery_id)).await?;
            Ok(Json(WinnersResponse { ok: true, winners }).into_response())
        }
        _ => Err(RpcError::BadRequest("Invalid action".to_string())),
    }
}

// ── Unlock ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRequest {
    pub code: Option<String>,
    pub lottery_id: Option<LooseInt>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub ok: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lottery_name: Option<String>,
}

fn refuse(message: &str) -> RpcError {
    RpcError::Refusal {
        status: StatusCode::BAD_REQUEST,
        message: message.to_string(),
    }
}

pub async fn unlock(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<UnlockRequest>, JsonRejection>,
) -> Result<Json<UnlockResponse>, RpcError> {
    let request = json_body(payload)?;
    let code = request.code.unwrap_or_default();
    if !TicketCode::is_valid(&code) {
        return Err(refuse("Invalid ticket code format"));
    }
    let lottery_id = request
        .lottery_id
        .as_ref()
        .and_then(LooseInt::positive)
        .map(LotteryId::new)
        .or(state.current_lottery_id)
        .ok_or_else(|| refuse("Lottery ID not specified"))?;

    let ip = client_ip(&headers, peer_addr(peer));
    let outcome = blocking(&state.campaign, move |c| c.claim(&code, lottery_id, &ip))
        .await
        .map_err(RpcError::into_refusal)?;

    let message = outcome.message();
    let (ok, lottery_name) = match outcome {
        ClaimOutcome::Granted { lottery_name } => (true, Some(lottery_name)),
        ClaimOutcome::NotWinner | ClaimOutcome::AlreadyClaimed => (false, None),
    };
    Ok(Json(UnlockResponse {
        ok,
        message,
        lottery_name,
    }))
}

// ── Contact ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub code: Option<String>,
    pub email: Option<String>,
    pub instagram: Option<String>,
}

pub async fn contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, RpcError> {
    let request = json_body(payload)?;
    blocking(&state.campaign, move |c| {
        c.record_contact(
            request.code.as_deref().unwrap_or(""),
            request.email.as_deref(),
            request.instagram.as_deref(),
        )
    })
    .await?;
    Ok(Json(OkResponse { ok: true }))
}

// ── Confessions ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct BrowseResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub page: BrowsePage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

pub async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> Result<Json<BrowseResponse>, RpcError> {
    let code = query.code().to_string();
    let offset = query.effective_offset();
    let limit = query.effective_limit();
    let page = blocking(&state.campaign, move |c| c.browse(&code, offset, limit))
        .await
        .map_err(RpcError::into_browse_refusal)?;
    Ok(Json(BrowseResponse {
        ok: true,
        next_offset: next_offset(offset, page.confessions.len(), limit),
        page,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfessionActionRequest {
    pub action: Option<String>,
    pub code: Option<String>,
    #[serde(alias = "confessionId")]
    pub confession_id: Option<LooseInt>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub async fn confession_action(
    State(state): State<AppState>,
    payload: Result<Json<ConfessionActionRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, RpcError> {
    // An unreadable body is treated as an empty one.
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let code = request.code.unwrap_or_default();

    match request.action.as_deref() {
        Some("validate_ticket") => {
            blocking(&state.campaign, move |c| c.validate_ticket(&code))
                .await
                .map_err(RpcError::into_refusal)?;
            Ok(Json(VoteResponse {
                ok: true,
                message: None,
            }))
        }
        Some("vote") => {
            let confession_id = request
                .confession_id
                .as_ref()
                .and_then(LooseInt::positive)
                .map(ConfessionId::new);
            let outcome = blocking(&state.campaign, move |c| match confession_id {
                Some(id) => c.vote(&code, id),
                None => c
                    .validate_ticket(&code)
                    .map(|_| VoteOutcome::UnknownConfession),
            })
            .await
            .map_err(RpcError::into_refusal)?;

            match outcome {
                VoteOutcome::Recorded => Ok(Json(VoteResponse {
                    ok: true,
                    message: None,
                })),
                VoteOutcome::AlreadyVoted => Ok(Json(VoteResponse {
                    ok: false,
                    message: outcome.message(),
                })),
                VoteOutcome::UnknownConfession => {
                    Err(refuse(outcome.message().unwrap_or("Confession not found.")))
                }
            }
        }
        _ => Err(RpcError::BadRequest(
            r#"Unknown action. Use action: "validate_ticket" or "vote"."#.to_string(),
        )),
    }
}

// ── Health & metrics ─────────────────────────────────────────────────────

pub async fn health() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let body = state.campaign.metrics().encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_ints() {
        let n: LooseInt = serde_json::from_str("42").unwrap();
        assert_eq!(n.value(), Some(42));
        let s: LooseInt = serde_json::from_str("\" 7 \"").unwrap();
        assert_eq!(s.positive(), Some(7));
        let bad: LooseInt = serde_json::from_str("\"seven\"").unwrap();
        assert_eq!(bad.value(), None);
        let neg: LooseInt = serde_json::from_str("-1").unwrap();
        assert_eq!(neg.positive(), None);
    }

    #[test]
    fn draw_count_defaults_and_passes_through() {
        assert_eq!(draw_count(None), DEFAULT_DRAW_COUNT);
        assert_eq!(draw_count(Some(&LooseInt::Number(0))), DEFAULT_DRAW_COUNT);
        assert_eq!(draw_count(Some(&LooseInt::Text("abc".into()))), DEFAULT_DRAW_COUNT);
        assert_eq!(draw_count(Some(&LooseInt::Number(-4))), 0);
        assert_eq!(draw_count(Some(&LooseInt::Text("25".into()))), 25);
        assert_eq!(draw_count(Some(&LooseInt::Number(5000))), 5000);
    }
}
