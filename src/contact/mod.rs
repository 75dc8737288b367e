//! Contact endpoint: validates a visitor's message and relays it by email.
//!
//! `POST /api/contact` takes `{ name, email, message, botField? }`:
//! - a filled-in `botField` is a bot; it gets `{ ok: true }` and nothing is sent
//! - a missing or empty field is a 400
//! - relay failures are a 500 with a generic message; details only go to the log

pub mod form;

use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug)]
pub enum ContactError {
    MethodNotAllowed,
    MissingFields,
    /// The mail relay rejected or never received the message
    Relay(String),
}

impl std::fmt::Display for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::MissingFields => write!(f, "Missing fields"),
            Self::Relay(msg) => write!(f, "Email relay failed: {msg}"),
        }
    }
}

impl std::error::Error for ContactError {}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            Self::MissingFields => (StatusCode::BAD_REQUEST, "Missing fields"),
            Self::Relay(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Email failed"),
        };

        (status, Json(json!({ "ok": false, "error": message }))).into_response()
    }
}

/// Service settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub addr: SocketAddr,
    pub api_key: String,
    pub resend_url: String,
    pub envelope: Envelope,
}

/// Fixed sender and recipients of every notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub from: String,
    pub to: Vec<String>,
}

impl ContactConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = env::var("CONTACT_ADDR")
            .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
            .parse()
            .context("invalid CONTACT_ADDR")?;
        let api_key = env::var("RESEND_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("RESEND_API_KEY is not set; every relay attempt will fail");
        }

        Ok(Self {
            addr,
            api_key,
            resend_url: env::var("RESEND_URL").unwrap_or_else(|_| DEFAULT_RESEND_URL.to_string()),
            envelope: Envelope {
                from: env::var("FROM_EMAIL").unwrap_or_else(|_| "onboarding@resend.dev".to_string()),
                to: split_recipients(&env::var("TO_EMAIL").unwrap_or_default()),
            },
        })
    }
}

/// `"a@x.org, b@y.org"` -> `["a@x.org", "b@y.org"]`
pub fn split_recipients(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// One outgoing notification, shaped like the Resend request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

/// Something that can deliver an [`Email`].
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, email: Email) -> impl Future<Output = Result<(), ContactError>> + Send;
}

/// Delivers through the Resend HTTP API.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    url: String,
}

impl ResendMailer {
    pub fn new(api_key: String, url: String) -> Self {
        Self { client: reqwest::Client::new(), api_key, url }
    }
}

impl Mailer for ResendMailer {
    async fn send(&self, email: Email) -> Result<(), ContactError> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| ContactError::Relay(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ContactError::Relay(format!("{status}: {body}")))
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Submission {
    pub fn into_email(self, envelope: &Envelope) -> Email {
        let html = format!(
            concat!(
                "<div style=\"font-family:system-ui,Segoe UI,Roboto,Helvetica,Arial,sans-serif;\">",
                "<h2>New Contact</h2>",
                "<p><b>Name:</b> {}</p>",
                "<p><b>Email:</b> {}</p>",
                "<p><b>Message:</b></p>",
                "<pre style=\"white-space:pre-wrap\">{}</pre>",
                "</div>"
            ),
            escape_html(&self.name),
            escape_html(&self.email),
            escape_html(&self.message),
        );
        Email {
            from: envelope.from.clone(),
            to: envelope.to.clone(),
            subject: format!("New contact from {}", self.name),
            reply_to: self.email,
            html,
        }
    }
}

/// What a request body amounts to.
#[derive(Debug, PartialEq)]
pub enum Intake {
    /// Honeypot tripped
    Bot,
    Valid(Submission),
}

/// Classify a raw request body. Anything that is not a JSON object with
/// the three fields as non-empty strings is `MissingFields`.
pub fn classify(body: &[u8]) -> Result<Intake, ContactError> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    if value.get("botField").is_some_and(is_truthy) {
        return Ok(Intake::Bot);
    }

    let field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    match (field("name"), field("email"), field("message")) {
        (Some(name), Some(email), Some(message)) => Ok(Intake::Valid(Submission { name, email, message })),
        _ => Err(ContactError::MissingFields),
    }
}

/// Loose truthiness: non-empty strings, `true`, non-zero numbers, and any
/// array or object.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub struct ContactState<M> {
    mailer: Arc<M>,
    envelope: Arc<Envelope>,
}

impl<M> Clone for ContactState<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            envelope: Arc::clone(&self.envelope),
        }
    }
}

pub fn router<M: Mailer>(mailer: Arc<M>, envelope: Envelope) -> Router {
    let state = ContactState { mailer, envelope: Arc::new(envelope) };
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/contact",
            post(submit::<M>).fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn method_not_allowed() -> ContactError {
    ContactError::MethodNotAllowed
}

async fn submit<M: Mailer>(
    State(state): State<ContactState<M>>,
    body: Bytes,
) -> Result<Json<Value>, ContactError> {
    let submission = match classify(&body)? {
        Intake::Bot => {
            debug!("honeypot field set, dropping submission");
            return Ok(Json(json!({ "ok": true })));
        }
        Intake::Valid(submission) => submission,
    };

    let email = submission.into_email(&state.envelope);
    if let Err(e) = state.mailer.send(email).await {
        error!(error = %e, "failed to relay contact message");
        return Err(e);
    }

    info!("contact message relayed");
    Ok(Json(json!({ "ok": true })))
}

/// Run the contact service until the process is stopped.
pub async fn serve(config: ContactConfig) -> anyhow::Result<()> {
    let mailer = Arc::new(ResendMailer::new(config.api_key.clone(), config.resend_url.clone()));
    let app = router(mailer, config.envelope.clone());

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    info!("contact service listening on http://{}", config.addr);
    axum::serve(listener, app).await.context("contact service stopped")?;
    Ok(())
}
