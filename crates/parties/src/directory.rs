//! Customer/employee registers and login lookup.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use shopd_core::{CustomerId, EmployeeId, ShopError, ShopResult};

use crate::person::{Customer, Employee};

/// Outcome of a successful credential check.
#[derive(Debug, Clone)]
pub enum Login {
    Employee(Arc<Employee>),
    Customer(Arc<Customer>),
}

/// Both party registers behind one facade, so the username-uniqueness rule
/// can span employees and customers.
#[derive(Debug, Default)]
pub struct PartyDirectory {
    customers: RwLock<BTreeMap<CustomerId, Arc<Customer>>>,
    employees: RwLock<BTreeMap<EmployeeId, Arc<Employee>>>,
}

impl PartyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&self, customer: Customer) -> ShopResult<Arc<Customer>> {
        self.ensure_username_free(&customer.username)?;
        let mut customers = self.customers.write().unwrap();
        if customers.contains_key(&customer.id) {
            return Err(ShopError::CustomerExists(customer.id));
        }
        let customer = Arc::new(customer);
        customers.insert(customer.id, Arc::clone(&customer));
        Ok(customer)
    }

    pub fn add_employee(&self, employee: Employee) -> ShopResult<Arc<Employee>> {
        self.ensure_username_free(&employee.username)?;
        let mut employees = self.employees.write().unwrap();
        if employees.contains_key(&employee.id) {
            return Err(ShopError::EmployeeExists(employee.id));
        }
        let employee = Arc::new(employee);
        employees.insert(employee.id, Arc::clone(&employee));
        Ok(employee)
    }

    pub fn remove_customer(&self, id: CustomerId) -> ShopResult<Arc<Customer>> {
        self.customers
            .write()
            .unwrap()
            .remove(&id)
            .ok_or(ShopError::CustomerNotFound(id))
    }

    pub fn remove_employee(&self, id: EmployeeId) -> ShopResult<Arc<Employee>> {
        self.employees
            .write()
            .unwrap()
            .remove(&id)
            .ok_or(ShopError::EmployeeNotFound(id))
    }

    pub fn customer(&self, id: CustomerId) -> ShopResult<Arc<Customer>> {
        self.customers
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ShopError::CustomerNotFound(id))
    }

    pub fn employee(&self, id: EmployeeId) -> ShopResult<Arc<Employee>> {
        self.employees
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ShopError::EmployeeNotFound(id))
    }

    pub fn customers(&self) -> Vec<Arc<Customer>> {
        self.customers.read().unwrap().values().cloned().collect()
    }

    pub fn employees(&self) -> Vec<Arc<Employee>> {
        self.employees.read().unwrap().values().cloned().collect()
    }

    /// Credential check over both registers; employees are tried first, like
    /// the original login flow. `None` means access denied.
    pub fn login(&self, username: &str, password: &str) -> Option<Login> {
        if let Some(employee) = self
            .employees
            .read()
            .unwrap()
            .values()
            .find(|e| e.username == username && e.password == password)
        {
            return Some(Login::Employee(Arc::clone(employee)));
        }
        self.customers
            .read()
            .unwrap()
            .values()
            .find(|c| c.username == username && c.password == password)
            .map(|c| Login::Customer(Arc::clone(c)))
    }

    fn ensure_username_free(&self, username: &str) -> ShopResult<()> {
        let taken = self
            .employees
            .read()
            .unwrap()
            .values()
            .any(|e| e.username == username)
            || self
                .customers
                .read()
                .unwrap()
                .values()
                .any(|c| c.username == username);
        if taken {
            return Err(ShopError::UsernameTaken(username.to_string()));
        }
        Ok(())
    }
}
