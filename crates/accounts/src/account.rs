use serde::{Deserialize, Serialize};

use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

use crate::category::{AccountCategoryId, AccountKind};

/// Account identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub AggregateId);

impl AccountId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Immutable account snapshot embedded in journal lines.
///
/// Lines keep the code/name/kind they were posted with; the kind is the sign
/// rule input and never changes after account creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountRef {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
}

/// A ledger account with its running balance.
///
/// The balance is authoritative committed state; it changes only when the
/// store applies a posted journal entry (or its compensating reversal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    code: String,
    name: String,
    category_id: AccountCategoryId,
    kind: AccountKind,
    /// Signed balance in minor units (e.g. cents).
    balance: i64,
    scope: Scope,
    created_by: UserId,
}

impl Account {
    pub fn new(
        id: AccountId,
        code: impl Into<String>,
        name: impl Into<String>,
        category_id: AccountCategoryId,
        kind: AccountKind,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("account code must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("account name must not be empty"));
        }
        Ok(Self {
            id,
            code,
            name,
            category_id,
            kind,
            balance: 0,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category_id(&self) -> AccountCategoryId {
        self.category_id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Snapshot for embedding into journal lines.
    pub fn to_ref(&self) -> AccountRef {
        AccountRef {
            account_id: self.id,
            code: self.code.clone(),
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    /// Apply a signed balance change produced by the sign rule.
    pub fn apply_delta(&mut self, delta: i64) -> DomainResult<()> {
        self.balance = self
            .balance
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("account balance overflow"))?;
        Ok(())
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
