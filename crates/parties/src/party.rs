use serde::{Deserialize, Serialize};

use motorlot_core::{AggregateId, DomainError, DomainResult, Entity};

/// Customer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub AggregateId);

impl CustomerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Employee identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub AggregateId);

impl EmployeeId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Employee role, closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    SalesRep,
    SalesManager,
    Mechanic,
    Accountant,
    Admin,
}

impl EmployeeRole {
    /// Whether this role is authorized to close a sale.
    pub fn can_sell(self) -> bool {
        matches!(
            self,
            EmployeeRole::SalesRep | EmployeeRole::SalesManager | EmployeeRole::Admin
        )
    }
}

/// A buying customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    id: CustomerId,
    name: String,
    email: Option<String>,
    deleted: bool,
}

impl Customer {
    pub fn new(id: CustomerId, name: impl Into<String>, email: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            email,
            deleted: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A dealership employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    role: EmployeeRole,
    deleted: bool,
}

impl Employee {
    pub fn new(id: EmployeeId, name: impl Into<String>, role: EmployeeRole) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("employee name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            role,
            deleted: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> EmployeeRole {
        self.role
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_customer_id() -> CustomerId {
        CustomerId::new(AggregateId::new())
    }

    fn test_employee_id() -> EmployeeId {
        EmployeeId::new(AggregateId::new())
    }

    #[test]
    fn selling_roles() {
        assert!(EmployeeRole::SalesRep.can_sell());
        assert!(EmployeeRole::SalesManager.can_sell());
        assert!(EmployeeRole::Admin.can_sell());
        assert!(!EmployeeRole::Mechanic.can_sell());
        assert!(!EmployeeRole::Accountant.can_sell());
    }

    #[test]
    fn customer_name_cannot_be_empty() {
        assert!(Customer::new(test_customer_id(), "  ", None).is_err());
        assert!(Customer::new(test_customer_id(), "Ada Meyer", None).is_ok());
    }

    #[test]
    fn soft_delete_is_a_flag_not_destruction() {
        let mut employee =
            Employee::new(test_employee_id(), "Sam Ortiz", EmployeeRole::SalesRep).unwrap();
        assert!(!employee.is_deleted());
        employee.mark_deleted();
        assert!(employee.is_deleted());
        assert_eq!(employee.name(), "Sam Ortiz");
    }
}
