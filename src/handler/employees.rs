//! Employee request handlers
//!
//! Turn list / get-by-id requests into directory lookups and map the result
//! to an [`Outcome`]. Not-found is an ordinary outcome, not an error.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::config::EmptyListPolicy;
use crate::directory::{Employee, EmployeeDirectory};
use crate::http;
use crate::logger;

/// Result of resolving one employee request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every employee, in insertion order (possibly empty under `EmptyListPolicy::Ok`)
    Employees(Vec<Employee>),
    /// The single employee matching the requested id
    Employee(Employee),
    /// The directory has no records and the policy treats that as not found
    NoRecords,
    /// No employee carries the requested id
    NotFound { id: i32 },
}

impl Outcome {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Employees(_) | Self::Employee(_) => StatusCode::OK,
            Self::NoRecords | Self::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::Employees(employees) => http::json_response(StatusCode::OK, &employees),
            Self::Employee(employee) => http::json_response(StatusCode::OK, &employee),
            Self::NoRecords => {
                logger::log_debug(format_args!("No employee records found"));
                http::build_404_response()
            }
            Self::NotFound { id } => {
                logger::log_debug(format_args!("No employee record found for id {id}"));
                http::build_404_response()
            }
        }
    }
}

pub fn list_employees(directory: &dyn EmployeeDirectory, policy: EmptyListPolicy) -> Outcome {
    let employees = directory.list_employees();
    if employees.is_empty() && policy == EmptyListPolicy::NotFound {
        return Outcome::NoRecords;
    }
    Outcome::Employees(employees)
}

pub fn get_employee(directory: &dyn EmployeeDirectory, id: i32) -> Outcome {
    directory
        .get_employee(id)
        .map_or(Outcome::NotFound { id }, Outcome::Employee)
}
