//! HTTP response building module
//!
//! Builders for the status codes the API answers with, decoupled from the
//! employee handlers that choose between them.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build JSON response; serialization failure becomes a 500
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(j) => j,
        Err(e) => {
            log_serialize_error(&e);
            return Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .body(Full::new(Bytes::from_static(
                    br#"{"error":"Internal server error"}"#,
                )))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Error"))));
        }
    };

    let content_length = json.len();
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response with an empty body
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 400 Bad Request response with a problem description
pub fn build_400_response(detail: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::BAD_REQUEST,
        &serde_json::json!({
            "status": 400,
            "title": "Bad Request",
            "detail": detail,
        }),
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "text/plain")
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::PAYLOAD_TOO_LARGE)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", ALLOWED_METHODS);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header("Access-Control-Allow-Headers", "*")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build liveness probe response
pub fn build_health_response() -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
}

/// Headers every response carries: `Server`, plus the open CORS origin when enabled
pub fn apply_common_headers(
    response: &mut Response<Full<Bytes>>,
    server_name: &str,
    enable_cors: bool,
) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(server_name) {
        headers.insert(SERVER, value);
    }
    if enable_cors {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}

/// Drop the body of a GET response to answer HEAD, keeping its headers
pub fn strip_body(response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, Full::new(Bytes::new()))
}

fn log_serialize_error(error: &serde_json::Error) {
    crate::logger::log_error(&format!("Failed to serialize response: {error}"));
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
