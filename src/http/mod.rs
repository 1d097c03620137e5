//! HTTP protocol layer module
//!
//! Response builders shared by the router and the employee handlers.

pub mod response;

// Re-export commonly used types
pub use response::{
    apply_common_headers, build_400_response, build_404_response, build_405_response,
    build_413_response, build_health_response, build_options_response, json_response, strip_body,
};
