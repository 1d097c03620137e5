//! Request handler module
//!
//! Routes incoming requests to the employee handlers and renders their
//! outcomes as HTTP responses.

pub mod employees;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
