use serde::{Deserialize, Serialize};

use ledgerly_accounts::AccountId;
use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

/// Expense category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseCategoryId(pub AggregateId);

impl ExpenseCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ExpenseCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Expense category: names the expense account to debit and carries the
/// approval policy applied when an expense of this category is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    id: ExpenseCategoryId,
    name: String,
    description: String,
    expense_account: AccountId,
    requires_approval: bool,
    /// Minor-unit threshold; `None` means every submission is reviewed
    /// when `requires_approval` is set.
    approval_threshold: Option<i64>,
    is_active: bool,
    scope: Scope,
    created_by: UserId,
}

impl ExpenseCategory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ExpenseCategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        expense_account: AccountId,
        requires_approval: bool,
        approval_threshold: Option<i64>,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name must not be empty"));
        }
        if let Some(threshold) = approval_threshold {
            if threshold <= 0 {
                return Err(DomainError::validation(
                    "approval threshold must be positive",
                ));
            }
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            expense_account,
            requires_approval,
            approval_threshold,
            is_active: true,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> ExpenseCategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expense_account(&self) -> AccountId {
        self.expense_account
    }

    pub fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    pub fn approval_threshold(&self) -> Option<i64> {
        self.approval_threshold
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

    /// Whether an expense of the given amount must pass review before
    /// approval.
    pub fn needs_approval(&self, amount: i64) -> bool {
        if !self.requires_approval {
            return false;
        }
        match self.approval_threshold {
            Some(threshold) => amount >= threshold,
            None => true,
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for ExpenseCategory {
    type Id = ExpenseCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::{BranchId, TenantId};

    fn test_category(requires_approval: bool, threshold: Option<i64>) -> ExpenseCategory {
        ExpenseCategory::new(
            ExpenseCategoryId::new(AggregateId::new()),
            "Travel",
            "flights and hotels",
            AccountId::new(AggregateId::new()),
            requires_approval,
            threshold,
            Scope::new(TenantId::new(), BranchId::new()),
            UserId::new(),
        )
        .unwrap()
    }

    #[test]
    fn approval_policy_honours_threshold() {
        let category = test_category(true, Some(50_000));
        assert!(!category.needs_approval(49_999));
        assert!(category.needs_approval(50_000));
        assert!(category.needs_approval(120_000));
    }

    #[test]
    fn no_threshold_reviews_everything() {
        let category = test_category(true, None);
        assert!(category.needs_approval(1));
    }

    #[test]
    fn approval_not_required_means_never_reviewed() {
        let category = test_category(false, Some(10));
        assert!(!category.needs_approval(1_000_000));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        let err = ExpenseCategory::new(
            ExpenseCategoryId::new(AggregateId::new()),
            "Travel",
            "",
            AccountId::new(AggregateId::new()),
            true,
            Some(0),
            Scope::new(TenantId::new(), BranchId::new()),
            UserId::new(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("threshold") => {}
            _ => panic!("Expected Validation error for zero threshold"),
        }
    }
}
