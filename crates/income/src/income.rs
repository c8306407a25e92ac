use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::Event;

use crate::category::IncomeCategoryId;

/// Income identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncomeId(pub AggregateId);

impl IncomeId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for IncomeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Income status lifecycle. Confirmed and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeStatus {
    Draft,
    Confirmed,
    Cancelled,
}

/// Aggregate root: Income.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Income {
    id: IncomeId,
    scope: Option<Scope>,
    category_id: Option<IncomeCategoryId>,
    reference: String,
    description: String,
    /// Minor units, always positive.
    amount: i64,
    income_date: Option<NaiveDate>,
    status: IncomeStatus,
    receipt_entry_id: Option<AggregateId>,
    version: u64,
    created: bool,
}

impl Income {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: IncomeId) -> Self {
        Self {
            id,
            scope: None,
            category_id: None,
            reference: String::new(),
            description: String::new(),
            amount: 0,
            income_date: None,
            status: IncomeStatus::Draft,
            receipt_entry_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> IncomeId {
        self.id
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn category_id(&self) -> Option<IncomeCategoryId> {
        self.category_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn income_date(&self) -> Option<NaiveDate> {
        self.income_date
    }

    pub fn status(&self) -> IncomeStatus {
        self.status
    }

    pub fn receipt_entry_id(&self) -> Option<AggregateId> {
        self.receipt_entry_id
    }
}

impl AggregateRoot for Income {
    type Id = IncomeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateIncome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIncome {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub category_id: IncomeCategoryId,
    pub reference: String,
    pub description: String,
    pub amount: i64,
    pub income_date: NaiveDate,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmIncome.
///
/// `entry_id` is the journal entry booking the receipt; the caller creates
/// and posts it in the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmIncome {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelIncome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelIncome {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeCommand {
    CreateIncome(CreateIncome),
    ConfirmIncome(ConfirmIncome),
    CancelIncome(CancelIncome),
}

/// Event: IncomeCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeCreated {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub category_id: IncomeCategoryId,
    pub reference: String,
    pub description: String,
    pub amount: i64,
    pub income_date: NaiveDate,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: IncomeConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeConfirmed {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub amount: i64,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: IncomeCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeCancelled {
    pub scope: Scope,
    pub income_id: IncomeId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeEvent {
    IncomeCreated(IncomeCreated),
    IncomeConfirmed(IncomeConfirmed),
    IncomeCancelled(IncomeCancelled),
}

impl Event for IncomeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            IncomeEvent::IncomeCreated(_) => "income.created",
            IncomeEvent::IncomeConfirmed(_) => "income.confirmed",
            IncomeEvent::IncomeCancelled(_) => "income.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            IncomeEvent::IncomeCreated(e) => e.occurred_at,
            IncomeEvent::IncomeConfirmed(e) => e.occurred_at,
            IncomeEvent::IncomeCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Income {
    type Command = IncomeCommand;
    type Event = IncomeEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            IncomeEvent::IncomeCreated(e) => {
                self.id = e.income_id;
                self.scope = Some(e.scope);
                self.category_id = Some(e.category_id);
                self.reference = e.reference.clone();
                self.description = e.description.clone();
                self.amount = e.amount;
                self.income_date = Some(e.income_date);
                self.status = IncomeStatus::Draft;
                self.created = true;
            }
            IncomeEvent::IncomeConfirmed(e) => {
                self.status = IncomeStatus::Confirmed;
                self.receipt_entry_id = Some(e.entry_id);
            }
            IncomeEvent::IncomeCancelled(_) => {
                self.status = IncomeStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            IncomeCommand::CreateIncome(cmd) => self.handle_create(cmd),
            IncomeCommand::ConfirmIncome(cmd) => self.handle_confirm(cmd),
            IncomeCommand::CancelIncome(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Income {
    fn ensure_scope(&self, scope: Scope) -> Result<(), DomainError> {
        match self.scope {
            Some(own) => own.ensure_same(&scope, "income"),
            None => Ok(()),
        }
    }

    fn ensure_income_id(&self, income_id: IncomeId) -> Result<(), DomainError> {
        if self.id != income_id {
            return Err(DomainError::validation("income_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateIncome) -> Result<Vec<IncomeEvent>, DomainError> {
        if self.created {
            return Err(DomainError::integrity("income already exists"));
        }
        if cmd.reference.trim().is_empty() {
            return Err(DomainError::validation(
                "income reference must not be empty",
            ));
        }
        if cmd.amount <= 0 {
            return Err(DomainError::validation("income amount must be positive"));
        }

        Ok(vec![IncomeEvent::IncomeCreated(IncomeCreated {
            scope: cmd.scope,
            income_id: cmd.income_id,
            category_id: cmd.category_id,
            reference: cmd.reference.clone(),
            description: cmd.description.clone(),
            amount: cmd.amount,
            income_date: cmd.income_date,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmIncome) -> Result<Vec<IncomeEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_income_id(cmd.income_id)?;

        if self.status != IncomeStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft incomes can be confirmed",
            ));
        }

        Ok(vec![IncomeEvent::IncomeConfirmed(IncomeConfirmed {
            scope: cmd.scope,
            income_id: cmd.income_id,
            amount: self.amount,
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelIncome) -> Result<Vec<IncomeEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_income_id(cmd.income_id)?;

        if self.status != IncomeStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft incomes can be cancelled",
            ));
        }

        Ok(vec![IncomeEvent::IncomeCancelled(IncomeCancelled {
            scope: cmd.scope,
            income_id: cmd.income_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
