//! Expense lifecycle operations, including payment posting.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use ledgerly_accounts::{AccountId, AccountKind};
use ledgerly_core::{AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope, execute};
use ledgerly_expense::{
    ApproveExpense, CancelExpense, CreateExpense, Expense, ExpenseCategory, ExpenseCategoryId,
    ExpenseCommand, ExpenseId, ExpenseStatus, MarkExpensePaid, RejectExpense, SubmitExpense,
};
use ledgerly_journal::{FinancialEvent, JournalEntry};

use super::{
    EXPENSE_AGGREGATE, LedgerService, StoreResult, build_posted_entry, collect_scope,
    commit_accounts, commit_entry, ensure_account_kind, envelopes_for,
};

/// Outcome of paying an expense: the paid record and its journal entry.
#[derive(Debug, Clone)]
pub struct PaidExpense {
    pub expense: Expense,
    pub entry: JournalEntry,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- expense categories ----

    /// Create an expense category. The booking account must be an expense
    /// account; the approval policy applies to every expense filed under it.
    #[allow(clippy::too_many_arguments)]
    pub fn create_expense_category(
        &self,
        scope: Scope,
        name: impl Into<String>,
        description: impl Into<String>,
        expense_account: AccountId,
        requires_approval: bool,
        approval_threshold: Option<i64>,
        created_by: UserId,
    ) -> StoreResult<ExpenseCategory> {
        let mut state = self.write_state()?;
        ensure_account_kind(
            state.account(scope, expense_account)?.kind(),
            AccountKind::Expense,
            "expense category must book to an expense account",
        )?;

        let category = ExpenseCategory::new(
            ExpenseCategoryId::new(AggregateId::new()),
            name,
            description,
            expense_account,
            requires_approval,
            approval_threshold,
            scope,
            created_by,
        )?;

        state
            .expense_categories
            .insert((scope, category.id_typed()), category.clone());
        drop(state);

        tracing::info!(
            "expense category '{}' created for scope {scope}",
            category.name()
        );
        Ok(category)
    }

    pub fn expense_category(
        &self,
        scope: Scope,
        category_id: ExpenseCategoryId,
    ) -> StoreResult<ExpenseCategory> {
        let state = self.read_state()?;
        Ok(state.expense_category(scope, category_id)?.clone())
    }

    pub fn list_expense_categories(&self, scope: Scope) -> StoreResult<Vec<ExpenseCategory>> {
        let state = self.read_state()?;
        let mut categories = collect_scope(&state.expense_categories, scope);
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    // ---- expenses ----

    #[allow(clippy::too_many_arguments)]
    pub fn create_expense(
        &self,
        scope: Scope,
        category_id: ExpenseCategoryId,
        reference: impl Into<String>,
        description: impl Into<String>,
        amount: i64,
        expense_date: NaiveDate,
        created_by: UserId,
    ) -> StoreResult<Expense> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let category = state.expense_category(scope, category_id)?;
        if !category.is_active() {
            return Err(DomainError::invalid_state("expense category is not active").into());
        }

        let expense_id = ExpenseId::new(AggregateId::new());
        let mut expense = Expense::empty(expense_id);
        let create = CreateExpense {
            scope,
            expense_id,
            category_id,
            reference: reference.into(),
            description: description.into(),
            amount,
            expense_date,
            created_by,
            occurred_at: now,
        };
        let events = execute(&mut expense, &ExpenseCommand::CreateExpense(create))?;
        let envelopes = envelopes_for(scope, expense_id.0, EXPENSE_AGGREGATE, 0, &events)?;

        state.expenses.insert((scope, expense_id), expense.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "expense '{}' created for scope {scope}",
            expense.reference()
        );
        Ok(expense)
    }

    /// Submit a draft expense. The category policy decides whether it waits
    /// for approval or approves itself on the spot.
    pub fn submit_expense(&self, scope: Scope, expense_id: ExpenseId) -> StoreResult<Expense> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut expense = state.expense(scope, expense_id)?.clone();
        let base_version = expense.version();

        let category_id = expense.category_id().ok_or_else(DomainError::not_found)?;
        let needs_approval = state
            .expense_category(scope, category_id)?
            .needs_approval(expense.amount());

        let submit = SubmitExpense {
            scope,
            expense_id,
            needs_approval,
            occurred_at: now,
        };
        let events = execute(&mut expense, &ExpenseCommand::SubmitExpense(submit))?;
        let envelopes = envelopes_for(scope, expense_id.0, EXPENSE_AGGREGATE, base_version, &events)?;

        state.expenses.insert((scope, expense_id), expense.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "expense '{}' submitted (status {:?})",
            expense.reference(),
            expense.status()
        );
        Ok(expense)
    }

    pub fn approve_expense(
        &self,
        scope: Scope,
        expense_id: ExpenseId,
        approved_by: UserId,
    ) -> StoreResult<Expense> {
        let approve = ApproveExpense {
            scope,
            expense_id,
            approved_by,
            occurred_at: Utc::now(),
        };
        let expense =
            self.run_expense_command(scope, expense_id, ExpenseCommand::ApproveExpense(approve))?;
        tracing::info!("expense '{}' approved", expense.reference());
        Ok(expense)
    }

    pub fn reject_expense(
        &self,
        scope: Scope,
        expense_id: ExpenseId,
        rejected_by: UserId,
        reason: impl Into<String>,
    ) -> StoreResult<Expense> {
        let reject = RejectExpense {
            scope,
            expense_id,
            rejected_by,
            reason: reason.into(),
            occurred_at: Utc::now(),
        };
        let expense =
            self.run_expense_command(scope, expense_id, ExpenseCommand::RejectExpense(reject))?;
        tracing::info!("expense '{}' rejected", expense.reference());
        Ok(expense)
    }

    /// Pay an approved expense: post the `EXP-` entry (debit the category's
    /// expense account, credit cash) and mark the expense paid, atomically.
    pub fn pay_expense(
        &self,
        scope: Scope,
        expense_id: ExpenseId,
        payment_date: NaiveDate,
        paid_by: UserId,
    ) -> StoreResult<PaidExpense> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut expense = state.expense(scope, expense_id)?.clone();
        let base_version = expense.version();

        // Checked again by the aggregate; checked here first so a re-pay
        // reports the status problem, not the taken journal reference.
        if expense.status() != ExpenseStatus::Approved {
            return Err(DomainError::invalid_state("only approved expenses can be paid").into());
        }

        let category_id = expense.category_id().ok_or_else(DomainError::not_found)?;
        let category = state.expense_category(scope, category_id)?;
        let expense_account = state.account(scope, category.expense_account())?;
        let chart = state.chart(scope);
        let cash_account = state.account_by_code(scope, &chart.cash)?;

        let event = FinancialEvent::ExpensePaid {
            reference: expense.reference().to_string(),
            description: expense.description().to_string(),
            date: payment_date,
            amount: expense.amount(),
            expense_account: expense_account.to_ref(),
            cash_account: cash_account.to_ref(),
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, paid_by, now)?;

        let mark_paid = MarkExpensePaid {
            scope,
            expense_id,
            payment_date,
            entry_id: posted.entry.id_typed().0,
            occurred_at: now,
        };
        let events = execute(&mut expense, &ExpenseCommand::MarkExpensePaid(mark_paid))?;
        let mut envelopes = posted.envelopes;
        envelopes.extend(envelopes_for(
            scope,
            expense_id.0,
            EXPENSE_AGGREGATE,
            base_version,
            &events,
        )?);

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.expenses.insert((scope, expense_id), expense.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "expense '{}' paid via entry '{}'",
            expense.reference(),
            posted.entry.reference()
        );
        Ok(PaidExpense {
            expense,
            entry: posted.entry,
        })
    }

    pub fn cancel_expense(&self, scope: Scope, expense_id: ExpenseId) -> StoreResult<Expense> {
        let cancel = CancelExpense {
            scope,
            expense_id,
            occurred_at: Utc::now(),
        };
        let expense =
            self.run_expense_command(scope, expense_id, ExpenseCommand::CancelExpense(cancel))?;
        tracing::info!("expense '{}' cancelled", expense.reference());
        Ok(expense)
    }

    pub fn expense(&self, scope: Scope, expense_id: ExpenseId) -> StoreResult<Expense> {
        let state = self.read_state()?;
        Ok(state.expense(scope, expense_id)?.clone())
    }

    pub fn list_expenses(&self, scope: Scope) -> StoreResult<Vec<Expense>> {
        let state = self.read_state()?;
        let mut expenses = collect_scope(&state.expenses, scope);
        expenses.sort_by(|a, b| a.reference().cmp(b.reference()));
        Ok(expenses)
    }

    /// Run a command that touches only the expense itself.
    fn run_expense_command(
        &self,
        scope: Scope,
        expense_id: ExpenseId,
        command: ExpenseCommand,
    ) -> StoreResult<Expense> {
        let mut state = self.write_state()?;
        let mut expense = state.expense(scope, expense_id)?.clone();
        let base_version = expense.version();

        let events = execute(&mut expense, &command)?;
        let envelopes = envelopes_for(scope, expense_id.0, EXPENSE_AGGREGATE, base_version, &events)?;

        state.expenses.insert((scope, expense_id), expense.clone());
        drop(state);

        self.publish_all(envelopes);
        Ok(expense)
    }
}
