use serde::{Deserialize, Serialize};

use ledgerly_accounts::AccountId;
use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

/// Income category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncomeCategoryId(pub AggregateId);

impl IncomeCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for IncomeCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Income category: names the revenue account credited when an income of
/// this category is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeCategory {
    id: IncomeCategoryId,
    name: String,
    description: String,
    revenue_account: AccountId,
    is_active: bool,
    scope: Scope,
    created_by: UserId,
}

impl IncomeCategory {
    pub fn new(
        id: IncomeCategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        revenue_account: AccountId,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name must not be empty"));
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            revenue_account,
            is_active: true,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> IncomeCategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn revenue_account(&self) -> AccountId {
        self.revenue_account
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for IncomeCategory {
    type Id = IncomeCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::{BranchId, TenantId};

    #[test]
    fn empty_name_is_rejected() {
        let err = IncomeCategory::new(
            IncomeCategoryId::new(AggregateId::new()),
            "  ",
            "",
            AccountId::new(AggregateId::new()),
            Scope::new(TenantId::new(), BranchId::new()),
            UserId::new(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }
}
