use serde::{Deserialize, Serialize};

use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCategoryId(pub AggregateId);

impl AccountCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Classification bucket for accounts; fixes the kind of its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCategory {
    id: AccountCategoryId,
    name: String,
    kind: AccountKind,
    description: String,
    scope: Scope,
    created_by: UserId,
}

impl AccountCategory {
    pub fn new(
        id: AccountCategoryId,
        name: impl Into<String>,
        kind: AccountKind,
        description: impl Into<String>,
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
            kind,
            description: description.into(),
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> AccountCategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }
}

impl Entity for AccountCategory {
    type Id = AccountCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::{BranchId, TenantId};

    fn test_scope() -> Scope {
        Scope::new(TenantId::new(), BranchId::new())
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = AccountCategory::new(
            AccountCategoryId::new(AggregateId::new()),
            "  ",
            AccountKind::Asset,
            "",
            test_scope(),
            UserId::new(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name") => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }
}
