//! Income lifecycle operations, including receipt posting.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use ledgerly_accounts::{AccountId, AccountKind};
use ledgerly_core::{AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope, execute};
use ledgerly_income::{
    CancelIncome, ConfirmIncome, CreateIncome, Income, IncomeCategory, IncomeCategoryId,
    IncomeCommand, IncomeId, IncomeStatus,
};
use ledgerly_journal::{FinancialEvent, JournalEntry};

use super::{
    INCOME_AGGREGATE, LedgerService, StoreResult, build_posted_entry, collect_scope,
    commit_accounts, commit_entry, ensure_account_kind, envelopes_for,
};

/// Outcome of confirming an income: the record and its receipt entry.
#[derive(Debug, Clone)]
pub struct ConfirmedIncome {
    pub income: Income,
    pub entry: JournalEntry,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- income categories ----

    pub fn create_income_category(
        &self,
        scope: Scope,
        name: impl Into<String>,
        description: impl Into<String>,
        revenue_account: AccountId,
        created_by: UserId,
    ) -> StoreResult<IncomeCategory> {
        let mut state = self.write_state()?;
        ensure_account_kind(
            state.account(scope, revenue_account)?.kind(),
            AccountKind::Revenue,
            "income category must book to a revenue account",
        )?;

        let category = IncomeCategory::new(
            IncomeCategoryId::new(AggregateId::new()),
            name,
            description,
            revenue_account,
            scope,
            created_by,
        )?;

        state
            .income_categories
            .insert((scope, category.id_typed()), category.clone());
        drop(state);

        tracing::info!(
            "income category '{}' created for scope {scope}",
            category.name()
        );
        Ok(category)
    }

    pub fn income_category(
        &self,
        scope: Scope,
        category_id: IncomeCategoryId,
    ) -> StoreResult<IncomeCategory> {
        let state = self.read_state()?;
        Ok(state.income_category(scope, category_id)?.clone())
    }

    pub fn list_income_categories(&self, scope: Scope) -> StoreResult<Vec<IncomeCategory>> {
        let state = self.read_state()?;
        let mut categories = collect_scope(&state.income_categories, scope);
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    // ---- incomes ----

    #[allow(clippy::too_many_arguments)]
    pub fn create_income(
        &self,
        scope: Scope,
        category_id: IncomeCategoryId,
        reference: impl Into<String>,
        description: impl Into<String>,
        amount: i64,
        income_date: NaiveDate,
        created_by: UserId,
    ) -> StoreResult<Income> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let category = state.income_category(scope, category_id)?;
        if !category.is_active() {
            return Err(DomainError::invalid_state("income category is not active").into());
        }

        let income_id = IncomeId::new(AggregateId::new());
        let mut income = Income::empty(income_id);
        let create = CreateIncome {
            scope,
            income_id,
            category_id,
            reference: reference.into(),
            description: description.into(),
            amount,
            income_date,
            created_by,
            occurred_at: now,
        };
        let events = execute(&mut income, &IncomeCommand::CreateIncome(create))?;
        let envelopes = envelopes_for(scope, income_id.0, INCOME_AGGREGATE, 0, &events)?;

        state.incomes.insert((scope, income_id), income.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!("income '{}' created for scope {scope}", income.reference());
        Ok(income)
    }

    /// Confirm a draft income: post the `INC-` receipt (debit cash, credit
    /// the category's revenue account) and confirm the record, atomically.
    pub fn confirm_income(
        &self,
        scope: Scope,
        income_id: IncomeId,
        confirmed_by: UserId,
    ) -> StoreResult<ConfirmedIncome> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut income = state.income(scope, income_id)?.clone();
        let base_version = income.version();

        // Checked again by the aggregate; checked here first so a re-confirm
        // reports the status problem, not the taken journal reference.
        if income.status() != IncomeStatus::Draft {
            return Err(DomainError::invalid_state("only draft incomes can be confirmed").into());
        }

        let category_id = income.category_id().ok_or_else(DomainError::not_found)?;
        let income_date = income.income_date().ok_or_else(DomainError::not_found)?;
        let category = state.income_category(scope, category_id)?;
        let revenue_account = state.account(scope, category.revenue_account())?;
        let chart = state.chart(scope);
        let cash_account = state.account_by_code(scope, &chart.cash)?;

        let event = FinancialEvent::IncomeConfirmed {
            reference: income.reference().to_string(),
            description: income.description().to_string(),
            date: income_date,
            amount: income.amount(),
            revenue_account: revenue_account.to_ref(),
            cash_account: cash_account.to_ref(),
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, confirmed_by, now)?;

        let confirm = ConfirmIncome {
            scope,
            income_id,
            entry_id: posted.entry.id_typed().0,
            occurred_at: now,
        };
        let events = execute(&mut income, &IncomeCommand::ConfirmIncome(confirm))?;
        let mut envelopes = posted.envelopes;
        envelopes.extend(envelopes_for(
            scope,
            income_id.0,
            INCOME_AGGREGATE,
            base_version,
            &events,
        )?);

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.incomes.insert((scope, income_id), income.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "income '{}' confirmed via entry '{}'",
            income.reference(),
            posted.entry.reference()
        );
        Ok(ConfirmedIncome {
            income,
            entry: posted.entry,
        })
    }

    pub fn cancel_income(&self, scope: Scope, income_id: IncomeId) -> StoreResult<Income> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut income = state.income(scope, income_id)?.clone();
        let base_version = income.version();

        let cancel = CancelIncome {
            scope,
            income_id,
            occurred_at: now,
        };
        let events = execute(&mut income, &IncomeCommand::CancelIncome(cancel))?;
        let envelopes = envelopes_for(scope, income_id.0, INCOME_AGGREGATE, base_version, &events)?;

        state.incomes.insert((scope, income_id), income.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!("income '{}' cancelled", income.reference());
        Ok(income)
    }

    pub fn income(&self, scope: Scope, income_id: IncomeId) -> StoreResult<Income> {
        let state = self.read_state()?;
        Ok(state.income(scope, income_id)?.clone())
    }

    pub fn list_incomes(&self, scope: Scope) -> StoreResult<Vec<Income>> {
        let state = self.read_state()?;
        let mut incomes = collect_scope(&state.incomes, scope);
        incomes.sort_by(|a, b| a.reference().cmp(b.reference()));
        Ok(incomes)
    }
}
