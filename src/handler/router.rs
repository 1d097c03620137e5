//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, dispatching and access logging.

use crate::config::AppState;
use crate::handler::employees::{self, Outcome};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const LIVENESS_PATH: &str = "/healthz";

/// Routes the server answers
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Health,
    ListEmployees,
    GetEmployee(i32),
    /// `/api/employees/{id}` with an id that is not a 32-bit integer
    InvalidId(String),
    Unknown,
}

/// Main entry point for HTTP request handling
///
/// The body is never read, so any body type is accepted.
#[allow(clippy::unused_async)]
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let path = req.uri().path();
    let http_config = &state.config.http;
    let route = parse_route(path);

    let mut response = if let Some(resp) = check_http_method(method, &route, http_config.enable_cors) {
        resp
    } else if let Some(resp) = check_body_size(&req, http_config.max_body_size) {
        resp
    } else {
        let resp = route_request(route, &state);
        if *method == Method::HEAD {
            http::strip_body(resp)
        } else {
            resp
        }
    };

    http::apply_common_headers(&mut response, &http_config.server_name, http_config.enable_cors);

    if state.config.logging.access_log {
        log_access(&req, &response, peer_addr, started, &state);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
///
/// Preflight is only answered for paths that exist.
fn check_http_method(
    method: &Method,
    route: &Route,
    enable_cors: bool,
) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS if *route == Route::Unknown => Some(http::build_404_response()),
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let Ok(size_str) = content_length.to_str() else {
        logger::log_warning("Content-Length header contains non-ASCII characters");
        return None;
    };
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}

/// Match a request path against the API routes
///
/// `api` and `employees` match case-insensitively and one trailing slash is allowed.
fn parse_route(path: &str) -> Route {
    if path == LIVENESS_PATH {
        return Route::Health;
    }

    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let mut segments = trimmed.strip_prefix('/').unwrap_or(trimmed).split('/');

    let prefix_matches = matches!(
        (segments.next(), segments.next()),
        (Some(api), Some(employees))
            if api.eq_ignore_ascii_case("api") && employees.eq_ignore_ascii_case("employees")
    );
    if !prefix_matches {
        return Route::Unknown;
    }

    match (segments.next(), segments.next()) {
        (None, _) => Route::ListEmployees,
        (Some(id), None) if !id.is_empty() => id
            .parse::<i32>()
            .map_or_else(|_| Route::InvalidId(id.to_string()), Route::GetEmployee),
        _ => Route::Unknown,
    }
}

fn route_request(route: Route, state: &AppState) -> Response<Full<Bytes>> {
    let directory = state.directory.as_ref();
    let outcome: Outcome = match route {
        Route::Health => return http::build_health_response(),
        Route::Unknown => return http::build_404_response(),
        Route::InvalidId(raw) => {
            logger::log_debug(format_args!("Rejected employee id '{raw}'"));
            return http::build_400_response(&format!("The value '{raw}' is not a valid id."));
        }
        Route::ListEmployees => {
            employees::list_employees(directory, state.config.directory.empty_list)
        }
        Route::GetEmployee(id) => employees::get_employee(directory, id),
    };

    logger::log_debug(format_args!("{} -> {}", outcome_name(&outcome), outcome.status()));
    outcome.into_response()
}

const fn outcome_name(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Employees(_) | Outcome::NoRecords => "list employees",
        Outcome::Employee(_) | Outcome::NotFound { .. } => "get employee",
    }
}

fn log_access<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EmptyListPolicy};
    use crate::directory::InMemoryDirectory;
    use http_body_util::{BodyExt, Empty};
    use hyper::StatusCode;

    fn test_state(directory: InMemoryDirectory, policy: EmptyListPolicy) -> Arc<AppState> {
        let mut config = Config::from_toml_str("").unwrap();
        config.logging.access_log = false;
        config.directory.empty_list = policy;
        Arc::new(AppState::with_directory(&config, Arc::new(directory)))
    }

    fn seeded_state() -> Arc<AppState> {
        test_state(InMemoryDirectory::seeded(), EmptyListPolicy::Ok)
    }

    async fn send(
        state: Arc<AppState>,
        method: Method,
        uri: &str,
    ) -> (StatusCode, Response<Full<Bytes>>, Vec<u8>) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .unwrap();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let response = handle_request(req, state, peer).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes().to_vec();
        (status, Response::from_parts(parts, Full::new(Bytes::new())), bytes)
    }

    #[test]
    fn test_parse_route() {
        assert_eq!(parse_route("/api/employees"), Route::ListEmployees);
        assert_eq!(parse_route("/api/employees/"), Route::ListEmployees);
        assert_eq!(parse_route("/API/Employees"), Route::ListEmployees);
        assert_eq!(parse_route("/api/employees/1"), Route::GetEmployee(1));
        assert_eq!(parse_route("/api/Employees/2/"), Route::GetEmployee(2));
        assert_eq!(parse_route("/api/employees/-3"), Route::GetEmployee(-3));
        assert_eq!(
            parse_route("/api/employees/abc"),
            Route::InvalidId("abc".to_string())
        );
        assert_eq!(
            parse_route("/api/employees/99999999999"),
            Route::InvalidId("99999999999".to_string())
        );
        assert_eq!(parse_route("/healthz"), Route::Health);
        assert_eq!(parse_route("/"), Route::Unknown);
        assert_eq!(parse_route("/api"), Route::Unknown);
        assert_eq!(parse_route("/api/employee"), Route::Unknown);
        assert_eq!(parse_route("/api/employees//"), Route::Unknown);
        assert_eq!(parse_route("/api/employees/1/extra"), Route::Unknown);
    }

    #[tokio::test]
    async fn test_list_employees_in_seed_order() {
        let (status, _, body) = send(seeded_state(), Method::GET, "/api/employees").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"id": 1, "name": "John", "department": "IT", "email": "john@hyland.com"},
                {"id": 2, "name": "Jane", "department": "HR", "email": "jane@hyland.com"}
            ])
        );
    }

    #[tokio::test]
    async fn test_get_employee_by_id() {
        let (status, _, body) = send(seeded_state(), Method::GET, "/api/employees/1").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "name": "John", "department": "IT", "email": "john@hyland.com"})
        );
    }

    #[tokio::test]
    async fn test_get_unknown_employee_is_404_without_body() {
        let (status, _, body) = send(seeded_state(), Method::GET, "/api/employees/123456").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory_with_not_found_policy() {
        let state = test_state(InMemoryDirectory::default(), EmptyListPolicy::NotFound);
        let (status, _, body) = send(state, Method::GET, "/api/employees").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_empty_directory_with_ok_policy() {
        let state = test_state(InMemoryDirectory::default(), EmptyListPolicy::Ok);
        let (status, _, body) = send(state, Method::GET, "/api/employees").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_empty_seed_from_config() {
        let mut config = Config::from_toml_str(
            r#"
            [directory]
            empty_list = "not_found"
            seed = "empty"
            "#,
        )
        .unwrap();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(&config));

        let (status, _, body) = send(Arc::clone(&state), Method::GET, "/api/employees").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());

        let (status, _, _) = send(state, Method::GET, "/api/employees/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let (status, _, body) = send(seeded_state(), Method::GET, "/api/employees/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let (status, response, body) = send(seeded_state(), Method::HEAD, "/api/employees/2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert!(response.headers().contains_key("content-length"));
    }

    #[tokio::test]
    async fn test_cors_header_on_every_response() {
        let (_, ok, _) = send(seeded_state(), Method::GET, "/api/employees").await;
        assert_eq!(ok.headers()["access-control-allow-origin"], "*");

        let (_, missing, _) = send(seeded_state(), Method::GET, "/api/employees/7").await;
        assert_eq!(missing.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_preflight() {
        let (status, response, _) = send(seeded_state(), Method::OPTIONS, "/api/employees").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_preflight_on_unknown_path_is_404() {
        let (status, response, _) = send(seeded_state(), Method::OPTIONS, "/swagger").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!response.headers().contains_key("access-control-allow-methods"));

        let (status, _, _) = send(seeded_state(), Method::OPTIONS, "/api/employees/1").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = send(seeded_state(), Method::OPTIONS, "/healthz").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_write_methods_not_allowed() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let (status, response, _) = send(seeded_state(), method, "/api/employees/1").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers()["allow"], "GET, HEAD, OPTIONS");
        }
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let req = Request::builder()
            .uri("/api/employees")
            .header("content-length", "2000000")
            .body(Empty::<Bytes>::new())
            .unwrap();
        let response = handle_request(req, seeded_state(), "127.0.0.1:1".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_health_and_unknown_paths() {
        let (status, _, body) = send(seeded_state(), Method::GET, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, br#"{"status":"ok"}"#);

        let (status, _, _) = send(seeded_state(), Method::GET, "/swagger").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_repeated_requests_identical() {
        let (_, _, first) = send(seeded_state(), Method::GET, "/api/employees").await;
        let state = seeded_state();
        let (_, _, a) = send(Arc::clone(&state), Method::GET, "/api/employees").await;
        let (_, _, b) = send(state, Method::GET, "/api/employees").await;
        assert_eq!(a, b);
        assert_eq!(first, a);
    }
}
