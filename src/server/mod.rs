// Server module entry point
// Listener creation, connection serving and graceful shutdown

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

// Re-export commonly used types
pub use listener::create_reusable_listener;
pub use server_loop::start_server_loop;
pub use signal::{start_signal_handler, ShutdownSignal};
