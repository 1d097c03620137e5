// In-memory employee directory
// The collection is fixed at construction and never mutated afterwards

use super::{Employee, EmployeeDirectory};

/// Employee directory backed by an owned, immutable `Vec`
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    employees: Vec<Employee>,
}

impl InMemoryDirectory {
    pub const fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    /// Directory populated with the built-in seed records
    pub fn seeded() -> Self {
        Self::new(vec![
            Employee::new(1, "John", "IT", "john@hyland.com"),
            Employee::new(2, "Jane", "HR", "jane@hyland.com"),
        ])
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn list_employees(&self) -> Vec<Employee> {
        self.employees.clone()
    }

    fn get_employee(&self, id: i32) -> Option<Employee> {
        self.employees.iter().find(|e| e.id == id).cloned()
    }
}
