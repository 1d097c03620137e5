// Employee record type

use serde::{Deserialize, Serialize};

/// A single employee record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i32,
    pub name: String,
    pub department: String,
    pub email: String,
}

impl Employee {
    pub fn new(id: i32, name: &str, department: &str, email: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            department: department.to_string(),
            email: email.to_string(),
        }
    }
}
