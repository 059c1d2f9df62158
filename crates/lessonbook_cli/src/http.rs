//! Synchronous HTTP front door over `tiny_http`.
//!
//! # Invariants
//! - One request is handled at a time; each opens its own connection.
//! - Bodies above `server.max_body_bytes` are rejected with 413 unread.
//! - Every response carries permissive CORS headers.

use lessonbook_api::{
    ApiResponse, DayRequest, LessonbookApi, ManualLessonRequest, ProcessRequest, UploadRequest,
};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::io::Read;
use std::time::Instant;
use tiny_http::{Header, Method, Request, Response, Server};

const DELETE_PREFIX: &str = "/delete-lesson/";

/// Routed result before it is written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    /// `None` for empty-bodied replies such as preflight.
    pub body: Option<Value>,
}

impl HttpReply {
    fn ok(response: ApiResponse) -> Self {
        Self {
            status: 200,
            body: Some(serde_json::to_value(response).unwrap_or(Value::Null)),
        }
    }

    fn failure(status: u16, message: &str) -> Self {
        Self {
            status,
            body: Some(json!({"status": "error", "message": message})),
        }
    }
}

/// Dispatches one request. `path` may carry a query string.
pub fn route(api: &LessonbookApi, method: &Method, path: &str, body: &[u8]) -> HttpReply {
    let path = path.split('?').next().unwrap_or(path);

    match (method, path) {
        (Method::Options, _) => HttpReply {
            status: 204,
            body: None,
        },
        (Method::Get, "/health") => HttpReply::ok(api.health()),
        (Method::Post, "/process-schedule") => with_json(body, |request: ProcessRequest| {
            api.process_schedule(&request.text)
        }),
        (Method::Post, "/get-daily-schedule") => {
            with_json(body, |request: DayRequest| api.daily_schedule(request.day_idx))
        }
        (Method::Post, "/add-lesson-manual") => {
            with_json(body, |request: ManualLessonRequest| {
                api.add_lesson_manual(&request)
            })
        }
        (Method::Post, "/upload") => with_json(body, |request: UploadRequest| api.upload(request)),
        (Method::Delete, _) if path.starts_with(DELETE_PREFIX) => {
            HttpReply::ok(api.delete_lesson(&path[DELETE_PREFIX.len()..]))
        }
        _ => HttpReply::failure(404, "Not found."),
    }
}

fn with_json<T: DeserializeOwned>(body: &[u8], handle: impl FnOnce(T) -> ApiResponse) -> HttpReply {
    match serde_json::from_slice::<T>(body) {
        Ok(request) => HttpReply::ok(handle(request)),
        Err(err) => HttpReply::failure(400, &format!("Malformed JSON body: {err}")),
    }
}

/// Serves requests until the listener fails.
pub fn serve(api: &LessonbookApi, addr: &str, max_body_bytes: usize) -> Result<(), String> {
    let server = Server::http(addr).map_err(|err| format!("cannot listen on {addr}: {err}"))?;
    info!("event=http_listen module=cli status=ok addr={addr}");
    eprintln!("lessonbook listening on http://{addr}");

    for request in server.incoming_requests() {
        handle(api, request, max_body_bytes);
    }
    Ok(())
}

fn handle(api: &LessonbookApi, mut request: Request, max_body_bytes: usize) {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.url().to_string();

    let reply = match read_body(&mut request, max_body_bytes) {
        Ok(body) => route(api, &method, &path, &body),
        Err(reply) => reply,
    };
    let status = reply.status;

    let body = reply
        .body
        .map(|value| value.to_string())
        .unwrap_or_default();
    let mut response = Response::from_string(body).with_status_code(status);
    for header in response_headers() {
        response.add_header(header);
    }
    if let Err(err) = request.respond(response) {
        warn!("event=http_request module=cli status=error error={err}");
        return;
    }

    info!(
        "event=http_request module=cli status=ok method={} route={} http_status={} duration_ms={}",
        method,
        route_label(&path),
        status,
        started_at.elapsed().as_millis()
    );
}

fn read_body(request: &mut Request, max_body_bytes: usize) -> Result<Vec<u8>, HttpReply> {
    let too_large = || HttpReply::failure(413, "Request body too large.");
    if request
        .body_length()
        .is_some_and(|length| length > max_body_bytes)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    let limit = u64::try_from(max_body_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    request
        .as_reader()
        .take(limit)
        .read_to_end(&mut body)
        .map_err(|_| HttpReply::failure(400, "Cannot read request body."))?;
    if body.len() > max_body_bytes {
        return Err(too_large());
    }
    Ok(body)
}

fn response_headers() -> Vec<Header> {
    [
        ("Content-Type", "application/json; charset=utf-8"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS"),
        ("Access-Control-Allow-Headers", "*"),
    ]
    .into_iter()
    .filter_map(|(name, value)| Header::from_bytes(name, value).ok())
    .collect()
}

/// Path without ids or query, safe to log.
fn route_label(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or(path);
    if path.starts_with(DELETE_PREFIX) {
        DELETE_PREFIX
    } else {
        path
    }
}
