//! Actor identity for stock movements.

use serde::{Deserialize, Serialize};

use crate::id::{CustomerId, EmployeeId};

/// Who caused a stock movement: an employee (restock, write-off) or a
/// customer (sale). The role tag is part of the movement-log line format.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    Employee(EmployeeId),
    Customer(CustomerId),
}

impl Actor {
    /// Role tag as it appears in the movement log.
    pub fn role_tag(self) -> &'static str {
        match self {
            Actor::Employee(_) => "Mitarbeiter",
            Actor::Customer(_) => "Kunde",
        }
    }

    pub fn raw_id(self) -> u32 {
        match self {
            Actor::Employee(id) => id.raw(),
            Actor::Customer(id) => id.raw(),
        }
    }
}

impl core::fmt::Display for Actor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.role_tag(), self.raw_id())
    }
}
