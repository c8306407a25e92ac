//! Budget lifecycle operations.

use chrono::Utc;
use serde_json::Value as JsonValue;

use ledgerly_accounts::AccountId;
use ledgerly_budget::{
    ActivateBudget, ApproveBudget, Budget, BudgetCommand, BudgetId, BudgetPeriod, CloseBudget,
    CreateBudget, RemoveBudgetItem, SetBudgetItem,
};
use ledgerly_core::{AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope, execute};

use super::{BUDGET_AGGREGATE, LedgerService, StoreResult, collect_scope, envelopes_for};

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Create a budget for a fiscal year. A scope carries at most one budget
    /// per fiscal year and period granularity.
    pub fn create_budget(
        &self,
        scope: Scope,
        name: impl Into<String>,
        fiscal_year: i32,
        period: BudgetPeriod,
        created_by: UserId,
    ) -> StoreResult<Budget> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        if state
            .budget_periods
            .contains_key(&(scope, fiscal_year, period))
        {
            return Err(DomainError::integrity(
                "a budget for this fiscal year and period already exists",
            )
            .into());
        }

        let budget_id = BudgetId::new(AggregateId::new());
        let mut budget = Budget::empty(budget_id);
        let create = CreateBudget {
            scope,
            budget_id,
            name: name.into(),
            fiscal_year,
            period,
            created_by,
            occurred_at: now,
        };
        let events = execute(&mut budget, &BudgetCommand::CreateBudget(create))?;
        let envelopes = envelopes_for(scope, budget_id.0, BUDGET_AGGREGATE, 0, &events)?;

        state
            .budget_periods
            .insert((scope, fiscal_year, period), budget_id);
        state.budgets.insert((scope, budget_id), budget.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "budget '{}' created for fiscal year {fiscal_year}",
            budget.name()
        );
        Ok(budget)
    }

    /// Set (or overwrite) the budgeted amount for an account in one period.
    /// Draft budgets only; the account must exist in the scope.
    pub fn set_budget_item(
        &self,
        scope: Scope,
        budget_id: BudgetId,
        account_id: AccountId,
        period_num: u32,
        amount: i64,
    ) -> StoreResult<Budget> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        state.account(scope, account_id)?;

        let mut budget = state.budget(scope, budget_id)?.clone();
        let base_version = budget.version();

        let set = SetBudgetItem {
            scope,
            budget_id,
            account_id,
            period_num,
            amount,
            occurred_at: now,
        };
        let events = execute(&mut budget, &BudgetCommand::SetBudgetItem(set))?;
        let envelopes = envelopes_for(scope, budget_id.0, BUDGET_AGGREGATE, base_version, &events)?;

        state.budgets.insert((scope, budget_id), budget.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::debug!("budget item set for account {account_id} period {period_num}");
        Ok(budget)
    }

    pub fn remove_budget_item(
        &self,
        scope: Scope,
        budget_id: BudgetId,
        account_id: AccountId,
        period_num: u32,
    ) -> StoreResult<Budget> {
        let remove = RemoveBudgetItem {
            scope,
            budget_id,
            account_id,
            period_num,
            occurred_at: Utc::now(),
        };
        let budget =
            self.run_budget_command(scope, budget_id, BudgetCommand::RemoveBudgetItem(remove))?;
        tracing::debug!("budget item removed for account {account_id} period {period_num}");
        Ok(budget)
    }

    pub fn approve_budget(
        &self,
        scope: Scope,
        budget_id: BudgetId,
        approved_by: UserId,
    ) -> StoreResult<Budget> {
        let approve = ApproveBudget {
            scope,
            budget_id,
            approved_by,
            occurred_at: Utc::now(),
        };
        let budget =
            self.run_budget_command(scope, budget_id, BudgetCommand::ApproveBudget(approve))?;
        tracing::info!("budget '{}' approved", budget.name());
        Ok(budget)
    }

    pub fn activate_budget(&self, scope: Scope, budget_id: BudgetId) -> StoreResult<Budget> {
        let activate = ActivateBudget {
            scope,
            budget_id,
            occurred_at: Utc::now(),
        };
        let budget =
            self.run_budget_command(scope, budget_id, BudgetCommand::ActivateBudget(activate))?;
        tracing::info!("budget '{}' activated", budget.name());
        Ok(budget)
    }

    pub fn close_budget(&self, scope: Scope, budget_id: BudgetId) -> StoreResult<Budget> {
        let close = CloseBudget {
            scope,
            budget_id,
            occurred_at: Utc::now(),
        };
        let budget = self.run_budget_command(scope, budget_id, BudgetCommand::CloseBudget(close))?;
        tracing::info!("budget '{}' closed", budget.name());
        Ok(budget)
    }

    pub fn budget(&self, scope: Scope, budget_id: BudgetId) -> StoreResult<Budget> {
        let state = self.read_state()?;
        Ok(state.budget(scope, budget_id)?.clone())
    }

    pub fn list_budgets(&self, scope: Scope) -> StoreResult<Vec<Budget>> {
        let state = self.read_state()?;
        let mut budgets = collect_scope(&state.budgets, scope);
        budgets.sort_by(|a, b| {
            (a.fiscal_year(), a.name()).cmp(&(b.fiscal_year(), b.name()))
        });
        Ok(budgets)
    }

    /// Run a command that touches only the budget itself.
    fn run_budget_command(
        &self,
        scope: Scope,
        budget_id: BudgetId,
        command: BudgetCommand,
    ) -> StoreResult<Budget> {
        let mut state = self.write_state()?;
        let mut budget = state.budget(scope, budget_id)?.clone();
        let base_version = budget.version();

        let events = execute(&mut budget, &command)?;
        let envelopes = envelopes_for(scope, budget_id.0, BUDGET_AGGREGATE, base_version, &events)?;

        state.budgets.insert((scope, budget_id), budget.clone());
        drop(state);

        self.publish_all(envelopes);
        Ok(budget)
    }
}
