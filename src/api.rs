//! HTTP webhook for the telephony platform.
//!
//! Every call leg that should play a reminder points its voice URL at
//! `/reminder`. The platform sends `name`, `dosage` and `time` as query
//! parameters, a form body or a JSON body, and always gets TwiML back:
//! malformed or repeated parameters never turn into an error response.

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::twiml::{self, Escaping, ReminderRequest, VoiceDocument};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiState {
    pub escaping: Escaping,
}

impl ApiState {
    pub fn new(escape_input: bool) -> Self {
        Self {
            escaping: if escape_input {
                Escaping::Xml
            } else {
                Escaping::Verbatim
            },
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    language: &'static str,
    voice: &'static str,
    escape_input: bool,
}

/// TwiML response body.
pub struct TwimlResponse(pub VoiceDocument);

impl IntoResponse for TwimlResponse {
    fn into_response(self) -> axum::response::Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.0.into_string()).into_response()
    }
}

/// Build the axum router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/reminder", get(handle_reminder_get).post(handle_reminder_post))
        .route("/status", get(handle_status))
        .with_state(state)
}

/// Serve the webhook until the listener fails.
pub async fn serve(state: ApiState, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Reminder webhook listening on {addr}");
    axum::serve(listener, router(state)).await
}

// --- Handlers ---

async fn handle_reminder_get(
    State(state): State<ApiState>,
    RawQuery(query): RawQuery,
) -> TwimlResponse {
    let req = parse_query(query.as_deref());
    respond(state, &req, "GET")
}

/// Body fields take precedence; the query string fills the rest.
async fn handle_reminder_post(
    State(state): State<ApiState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> TwimlResponse {
    let req = parse_body(&headers, &body).or(parse_query(query.as_deref()));
    respond(state, &req, "POST")
}

fn parse_query(query: Option<&str>) -> ReminderRequest {
    parse_form(query.unwrap_or_default().as_bytes())
}

fn parse_form(bytes: &[u8]) -> ReminderRequest {
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes) {
        Ok(pairs) => ReminderRequest::from_pairs(pairs),
        Err(e) => {
            warn!("Ignoring undecodable parameters: {e}");
            ReminderRequest::default()
        }
    }
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> ReminderRequest {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return parse_form(body);
    }

    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => ReminderRequest::from_json(&value),
        Err(e) => {
            warn!("Ignoring malformed JSON body: {e}");
            ReminderRequest::default()
        }
    }
}

fn respond(state: ApiState, req: &ReminderRequest, method: &str) -> TwimlResponse {
    info!(
        "{method} /reminder: name={:?} dosage={:?} time={:?}",
        req.name(),
        req.dosage(),
        req.time(),
    );
    let doc = twiml::render_with(req, state.escaping);
    debug!("Rendered {} bytes ({:?})", doc.as_str().len(), state.escaping);
    TwimlResponse(doc)
}

async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        language: twiml::LANGUAGE,
        voice: twiml::VOICE,
        escape_input: state.escaping == Escaping::Xml,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn get_reminder_renders_query_values() {
        let request = Request::get("/reminder?name=Paracetamol&dosage=500mg&time=8%20PM")
            .body(Body::empty())
            .unwrap();
        let (status, content_type, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/xml");
        let expected = twiml::render(&ReminderRequest::new("Paracetamol", "500mg", "8 PM"));
        assert_eq!(body, expected.as_str());
    }

    #[tokio::test]
    async fn get_reminder_without_params_renders_empty_slots() {
        let request = Request::get("/reminder").body(Body::empty()).unwrap();
        let (status, _, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, twiml::render(&ReminderRequest::default()).as_str());
    }

    #[tokio::test]
    async fn post_reminder_reads_form_body() {
        let request = Request::post("/reminder")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=Metformin&dosage=850mg&time=7%3A30+AM&CallSid=CA1"))
            .unwrap();
        let (status, content_type, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/xml");
        let expected = twiml::render(&ReminderRequest::new("Metformin", "850mg", "7:30 AM"));
        assert_eq!(body, expected.as_str());
    }

    #[tokio::test]
    async fn repeated_query_key_uses_first_value() {
        let request = Request::get("/reminder?name=a&name=b&dosage=1")
            .body(Body::empty())
            .unwrap();
        let (status, content_type, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/xml");
        let expected = twiml::render(&ReminderRequest {
            name: Some("a".into()),
            dosage: Some("1".into()),
            time: None,
        });
        assert_eq!(body, expected.as_str());
    }

    #[tokio::test]
    async fn post_without_content_type_still_renders() {
        let request = Request::post("/reminder?time=9%20AM")
            .body(Body::from("name=Aspirin&name=Other"))
            .unwrap();
        let (status, _, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        let expected = twiml::render(&ReminderRequest {
            name: Some("Aspirin".into()),
            time: Some("9 AM".into()),
            ..Default::default()
        });
        assert_eq!(body, expected.as_str());
    }

    #[tokio::test]
    async fn post_body_overrides_query_values() {
        let request = Request::post("/reminder?name=FromQuery&dosage=5mg")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=FromBody"))
            .unwrap();
        let (_, _, body) = send(router(ApiState::default()), request).await;

        assert!(body.contains("மருந்து FromBody 5mg "));
    }

    #[tokio::test]
    async fn post_reminder_reads_json_body() {
        let request = Request::post("/reminder")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": "Paracetamol", "dosage": "500mg", "time": "8 PM"}"#))
            .unwrap();
        let (status, content_type, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/xml");
        let expected = twiml::render(&ReminderRequest::new("Paracetamol", "500mg", "8 PM"));
        assert_eq!(body, expected.as_str());
    }

    #[tokio::test]
    async fn malformed_json_body_renders_empty_slots() {
        let request = Request::post("/reminder")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let (status, _, body) = send(router(ApiState::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, twiml::render(&ReminderRequest::default()).as_str());
    }

    #[tokio::test]
    async fn markup_passes_through_unless_escaping_enabled() {
        let uri = "/reminder?name=%3Cb%3EAspirin";

        let (_, _, verbatim) = send(
            router(ApiState::new(false)),
            Request::get(uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert!(verbatim.contains("மருந்து <b>Aspirin "));

        let (_, _, escaped) = send(
            router(ApiState::new(true)),
            Request::get(uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert!(escaped.contains("மருந்து &lt;b&gt;Aspirin "));
    }

    #[tokio::test]
    async fn status_reports_voice_constants() {
        let request = Request::get("/status").body(Body::empty()).unwrap();
        let (status, _, body) = send(router(ApiState::new(true)), request).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["language"], "ta-IN");
        assert_eq!(json["voice"], "Polly.Kajal");
        assert_eq!(json["escape_input"], true);
    }
}
