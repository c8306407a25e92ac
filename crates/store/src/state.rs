//! Authoritative in-memory state, one table per record type.
//!
//! Every table is keyed by `(Scope, id)` so no read or write can cross a
//! tenant/branch boundary by construction. The side tables map the
//! business-unique keys (account code, journal reference, asset number,
//! budget period) back to ids for uniqueness checks and lookups.

use std::collections::HashMap;

use ledgerly_accounts::{
    Account, AccountCategory, AccountCategoryId, AccountId, ChartConfig, SwitchId, SwitchRecord,
};
use ledgerly_assets::{Asset, AssetCategory, AssetCategoryId, AssetDisposal, AssetDisposalId, AssetId};
use ledgerly_budget::{Budget, BudgetId, BudgetPeriod};
use ledgerly_core::{DomainError, DomainResult, Scope};
use ledgerly_expense::{Expense, ExpenseCategory, ExpenseCategoryId, ExpenseId};
use ledgerly_income::{Income, IncomeCategory, IncomeCategoryId, IncomeId};
use ledgerly_journal::{JournalEntry, JournalEntryId};

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    pub(crate) charts: HashMap<Scope, ChartConfig>,

    pub(crate) account_categories: HashMap<(Scope, AccountCategoryId), AccountCategory>,
    pub(crate) accounts: HashMap<(Scope, AccountId), Account>,
    pub(crate) account_codes: HashMap<(Scope, String), AccountId>,

    pub(crate) entries: HashMap<(Scope, JournalEntryId), JournalEntry>,
    pub(crate) entry_refs: HashMap<(Scope, String), JournalEntryId>,

    pub(crate) expense_categories: HashMap<(Scope, ExpenseCategoryId), ExpenseCategory>,
    pub(crate) expenses: HashMap<(Scope, ExpenseId), Expense>,

    pub(crate) income_categories: HashMap<(Scope, IncomeCategoryId), IncomeCategory>,
    pub(crate) incomes: HashMap<(Scope, IncomeId), Income>,

    pub(crate) asset_categories: HashMap<(Scope, AssetCategoryId), AssetCategory>,
    pub(crate) assets: HashMap<(Scope, AssetId), Asset>,
    pub(crate) asset_numbers: HashMap<(Scope, String), AssetId>,
    pub(crate) disposals: HashMap<(Scope, AssetDisposalId), AssetDisposal>,

    pub(crate) switches: HashMap<(Scope, SwitchId), SwitchRecord>,

    pub(crate) budgets: HashMap<(Scope, BudgetId), Budget>,
    pub(crate) budget_periods: HashMap<(Scope, i32, BudgetPeriod), BudgetId>,
}

impl LedgerState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Chart for a scope; scopes without an explicit chart use the defaults.
    pub(crate) fn chart(&self, scope: Scope) -> ChartConfig {
        self.charts.get(&scope).cloned().unwrap_or_default()
    }

    pub(crate) fn account_category(
        &self,
        scope: Scope,
        id: AccountCategoryId,
    ) -> DomainResult<&AccountCategory> {
        self.account_categories
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn account(&self, scope: Scope, id: AccountId) -> DomainResult<&Account> {
        self.accounts
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn account_by_code(&self, scope: Scope, code: &str) -> DomainResult<&Account> {
        let id = self
            .account_codes
            .get(&(scope, code.to_string()))
            .copied()
            .ok_or_else(DomainError::not_found)?;
        self.account(scope, id)
    }

    pub(crate) fn entry(&self, scope: Scope, id: JournalEntryId) -> DomainResult<&JournalEntry> {
        self.entries
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn entry_by_reference(
        &self,
        scope: Scope,
        reference: &str,
    ) -> DomainResult<&JournalEntry> {
        let id = self
            .entry_refs
            .get(&(scope, reference.to_string()))
            .copied()
            .ok_or_else(DomainError::not_found)?;
        self.entry(scope, id)
    }

    pub(crate) fn expense_category(
        &self,
        scope: Scope,
        id: ExpenseCategoryId,
    ) -> DomainResult<&ExpenseCategory> {
        self.expense_categories
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn expense(&self, scope: Scope, id: ExpenseId) -> DomainResult<&Expense> {
        self.expenses
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn income_category(
        &self,
        scope: Scope,
        id: IncomeCategoryId,
    ) -> DomainResult<&IncomeCategory> {
        self.income_categories
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn income(&self, scope: Scope, id: IncomeId) -> DomainResult<&Income> {
        self.incomes
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn asset_category(
        &self,
        scope: Scope,
        id: AssetCategoryId,
    ) -> DomainResult<&AssetCategory> {
        self.asset_categories
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn asset(&self, scope: Scope, id: AssetId) -> DomainResult<&Asset> {
        self.assets
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn asset_by_number(&self, scope: Scope, number: &str) -> DomainResult<&Asset> {
        let id = self
            .asset_numbers
            .get(&(scope, number.to_string()))
            .copied()
            .ok_or_else(DomainError::not_found)?;
        self.asset(scope, id)
    }

    pub(crate) fn disposal(
        &self,
        scope: Scope,
        id: AssetDisposalId,
    ) -> DomainResult<&AssetDisposal> {
        self.disposals
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn switch(&self, scope: Scope, id: SwitchId) -> DomainResult<&SwitchRecord> {
        self.switches
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }

    pub(crate) fn budget(&self, scope: Scope, id: BudgetId) -> DomainResult<&Budget> {
        self.budgets
            .get(&(scope, id))
            .ok_or_else(DomainError::not_found)
    }
}
