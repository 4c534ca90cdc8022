use serde::{Deserialize, Serialize};

use shopd_core::{CustomerId, EmployeeId};

/// A customer account. Credentials are stored as-is; hardening the login is
/// explicitly out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub username: String,
    pub password: String,
    pub name: String,
    pub street: String,
    pub postcode: u32,
    pub city: String,
}

/// An employee account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub username: String,
    pub password: String,
    pub name: String,
}
