// Server loop module
// Accepts connections until a shutdown is requested, then drains them

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::ShutdownSignal;
use crate::config::AppState;
use crate::logger;

/// Accept loop for the employee API listener
///
/// Once `shutdown` fires the listener is closed and the loop waits, up to
/// `performance.shutdown_timeout`, for accepted connections to finish. Must be
/// driven inside the `LocalSet` the connection tasks were spawned on.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<ShutdownSignal>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.wait() => {
                break;
            }
        }
    }

    drop(listener);
    logger::log_shutdown(active_connections.load(Ordering::SeqCst));

    let drain_timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    if tokio::time::timeout(drain_timeout, wait_for_idle(&active_connections))
        .await
        .is_err()
    {
        logger::log_warning(&format!(
            "Shutdown timeout after {} seconds, closing {} connection(s)",
            drain_timeout.as_secs(),
            active_connections.load(Ordering::SeqCst)
        ));
    } else {
        logger::log_info("All connections finished");
    }
    Ok(())
}

/// Resolves when no connection task is left running
async fn wait_for_idle(active_connections: &AtomicUsize) {
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    while active_connections.load(Ordering::SeqCst) > 0 {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn fetch(addr: std::net::SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    struct TestServer {
        addr: std::net::SocketAddr,
        active: Arc<AtomicUsize>,
        shutdown: Arc<ShutdownSignal>,
        handle: tokio::task::JoinHandle<Result<(), Box<dyn std::error::Error>>>,
    }

    /// Start the accept loop on the current `LocalSet`
    fn spawn_server(config: &Config) -> TestServer {
        let state = Arc::new(AppState::new(config));
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(ShutdownSignal::new());
        let handle = tokio::task::spawn_local(start_server_loop(
            listener,
            state,
            Arc::clone(&active),
            Arc::clone(&shutdown),
        ));
        TestServer {
            addr,
            active,
            shutdown,
            handle,
        }
    }

    async fn wait_until_accepted(active: &AtomicUsize) {
        while active.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn quiet_config() -> Config {
        let mut config = Config::from_toml_str("").unwrap();
        config.logging.access_log = false;
        config
    }

    #[tokio::test]
    async fn test_serves_employees_until_shutdown() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = spawn_server(&quiet_config());
                let addr = server.addr;

                let response = fetch(addr, "/api/employees").await;
                assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
                assert!(response.contains(r#""name":"John""#));
                assert!(response.contains(r#""name":"Jane""#));

                let response = fetch(addr, "/api/Employees/2").await;
                assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
                assert!(response.contains(r#""email":"jane@hyland.com""#));

                let response = fetch(addr, "/api/employees/123456").await;
                assert!(response.starts_with("HTTP/1.1 404 Not Found"), "got: {response}");

                server.shutdown.trigger();
                server.handle.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_request_in_flight_at_shutdown_gets_response() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = spawn_server(&quiet_config());

                let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
                stream
                    .write_all(b"GET /api/employees/1 HTTP/1.1\r\nHost: localhost\r\n")
                    .await
                    .unwrap();
                wait_until_accepted(&server.active).await;

                server.shutdown.trigger();
                tokio::time::sleep(Duration::from_millis(100)).await;

                stream.write_all(b"Connection: close\r\n\r\n").await.unwrap();
                let mut response = String::new();
                stream.read_to_string(&mut response).await.unwrap();
                assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");
                assert!(response.contains(r#""name":"John""#));

                server.handle.await.unwrap().unwrap();
                assert_eq!(server.active.load(Ordering::SeqCst), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_waiting_after_timeout() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mut config = quiet_config();
                config.performance.shutdown_timeout = 0;
                let server = spawn_server(&config);

                // Idle connection that never sends a request
                let _idle = tokio::net::TcpStream::connect(server.addr).await.unwrap();
                wait_until_accepted(&server.active).await;

                server.shutdown.trigger();
                tokio::time::timeout(Duration::from_secs(5), server.handle)
                    .await
                    .unwrap()
                    .unwrap()
                    .unwrap();
                assert_eq!(server.active.load(Ordering::SeqCst), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_zero_keep_alive_closes_after_one_response() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mut config = quiet_config();
                config.performance.keep_alive_timeout = 0;
                let server = spawn_server(&config);

                // No `Connection: close`, so only the server can end the stream
                let mut stream = tokio::net::TcpStream::connect(server.addr).await.unwrap();
                stream
                    .write_all(b"GET /api/employees/2 HTTP/1.1\r\nHost: localhost\r\n\r\n")
                    .await
                    .unwrap();
                let mut response = String::new();
                tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut response))
                    .await
                    .unwrap()
                    .unwrap();
                assert!(response.starts_with("HTTP/1.1 200 OK"), "got: {response}");

                server.shutdown.trigger();
                server.handle.await.unwrap().unwrap();
            })
            .await;
    }
}
