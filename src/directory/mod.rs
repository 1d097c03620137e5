//! Employee directory module
//!
//! Holds the employee record type and the lookup capability the request
//! handlers depend on. The only implementation is an in-memory collection
//! seeded once at startup.

mod memory;
mod types;

pub use memory::InMemoryDirectory;
pub use types::Employee;

/// Read-only lookup over a collection of employees.
///
/// Handlers only see this trait, so any source that can list and look up
/// employees can back the API.
pub trait EmployeeDirectory: Send + Sync {
    /// All employees in insertion order. Empty when the collection is empty.
    fn list_employees(&self) -> Vec<Employee>;

    /// The first employee whose id equals `id`, or `None`.
    fn get_employee(&self, id: i32) -> Option<Employee>;
}
