//! Lending institutions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BankId(pub String);

impl BankId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("bank_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for BankId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bank {
    id: BankId,
    name: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Bank {
    pub fn new(id: BankId, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if id.0.trim().is_empty() {
            return Err(ValidationError::EmptyField("bank id"));
        }
        if name.is_empty() {
            return Err(ValidationError::EmptyField("bank name"));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            name,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// New bank with a generated id.
    pub fn with_name(name: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(BankId::generate(), name)
    }

    pub fn id(&self) -> &BankId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn activate(self) -> Self {
        self.with_active(true)
    }

    pub fn deactivate(self) -> Self {
        self.with_active(false)
    }

    fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self.updated_at = Utc::now().max(self.updated_at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_required() {
        assert!(Bank::new(BankId::new("b1"), "   ").is_err());
        assert!(Bank::new(BankId::new(""), "Ziraat").is_err());
        let bank = Bank::new(BankId::new("b1"), " Ziraat Bankası ").unwrap();
        assert_eq!(bank.name(), "Ziraat Bankası");
        assert!(bank.is_active());
    }

    #[test]
    fn test_deactivate_returns_new_state() {
        let bank = Bank::with_name("Garanti BBVA").unwrap();
        let created = bank.created_at();
        let before = bank.updated_at();
        let inactive = bank.deactivate();
        assert!(!inactive.is_active());
        assert!(inactive.updated_at() >= before);
        assert_eq!(inactive.created_at(), created);
        assert!(inactive.activate().is_active());
    }

    #[test]
    fn test_generated_ids_unique() {
        let a = Bank::with_name("A").unwrap();
        let b = Bank::with_name("B").unwrap();
        assert_ne!(a.id(), b.id());
    }
}
