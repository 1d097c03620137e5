// Listener module
// Creates the TCP listener through socket2 so socket options are set before bind

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Pending-connection queue length passed to `listen`
const BACKLOG: i32 = 128;

/// Create a `TcpListener` with `SO_REUSEADDR` (and `SO_REUSEPORT` on Unix) enabled.
///
/// Lets a restarted process bind immediately while old sockets sit in `TIME_WAIT`.
///
/// # Arguments
///
/// * `addr` - The socket address to bind to
pub fn create_reusable_listener(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;

    // Tokio requires a non-blocking socket
    socket.set_nonblocking(true)?;

    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
