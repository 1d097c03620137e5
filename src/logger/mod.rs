//! Logger module
//!
//! Provides logging utilities for the employee directory server:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error, warning and debug logging with level filtering
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::fmt;
use std::net::SocketAddr;
use writer::Level;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level: Level = config.logging.level.parse()?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )?;
    Ok(())
}

fn write(level: Level, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if matches!(level, Level::Error | Level::Warn) => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

/// Debug lines are dropped before formatting unless the writer enables them
fn write_debug(args: fmt::Arguments<'_>) {
    if let Some(w) = writer::get() {
        w.write_args(Level::Debug, args);
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, employee_count: usize) {
    write(Level::Info, "======================================");
    write(Level::Info, "Employee directory started successfully");
    write(Level::Info, &format!("Listening on: http://{addr}"));
    write(Level::Info, &format!("  - GET http://{addr}/api/employees"));
    write(Level::Info, &format!("  - GET http://{addr}/api/employees/{{id}}"));
    write(Level::Info, &format!("Employees loaded: {employee_count}"));
    write(
        Level::Info,
        &format!("Empty list policy: {:?}", config.directory.empty_list),
    );
    write(Level::Info, &format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write(Level::Info, &format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write(Level::Info, &format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write(Level::Info, &format!("Error log: {path}"));
    }
    write(Level::Info, "======================================\n");
}

pub fn log_info(message: &str) {
    write(Level::Info, &format!("[INFO] {message}"));
}

pub fn log_debug(args: fmt::Arguments<'_>) {
    write_debug(format_args!("[DEBUG] {args}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_debug(format_args!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown(active_connections: usize) {
    write(
        Level::Info,
        &format!("[SHUTDOWN] Listener closed, {active_connections} connection(s) still finishing"),
    );
}
