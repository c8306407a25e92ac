use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::Event;

use crate::category::ExpenseCategoryId;

/// Expense identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub AggregateId);

impl ExpenseId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Expense status lifecycle.
///
/// Paid, rejected and cancelled are terminal. Submission routes to
/// `PendingApproval` or straight to `Approved` depending on the category
/// policy evaluated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Paid,
    Cancelled,
}

/// Aggregate root: Expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expense {
    id: ExpenseId,
    scope: Option<Scope>,
    category_id: Option<ExpenseCategoryId>,
    reference: String,
    description: String,
    /// Minor units, always positive.
    amount: i64,
    expense_date: Option<NaiveDate>,
    status: ExpenseStatus,
    approved_by: Option<UserId>,
    rejection_reason: Option<String>,
    payment_date: Option<NaiveDate>,
    payment_entry_id: Option<AggregateId>,
    version: u64,
    created: bool,
}

impl Expense {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ExpenseId) -> Self {
        Self {
            id,
            scope: None,
            category_id: None,
            reference: String::new(),
            description: String::new(),
            amount: 0,
            expense_date: None,
            status: ExpenseStatus::Draft,
            approved_by: None,
            rejection_reason: None,
            payment_date: None,
            payment_entry_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ExpenseId {
        self.id
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn category_id(&self) -> Option<ExpenseCategoryId> {
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

    pub fn expense_date(&self) -> Option<NaiveDate> {
        self.expense_date
    }

    pub fn status(&self) -> ExpenseStatus {
        self.status
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    pub fn payment_entry_id(&self) -> Option<AggregateId> {
        self.payment_entry_id
    }
}

impl AggregateRoot for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpense {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub category_id: ExpenseCategoryId,
    pub reference: String,
    pub description: String,
    pub amount: i64,
    pub expense_date: NaiveDate,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SubmitExpense.
///
/// `needs_approval` is the category policy evaluated against this expense's
/// amount; when false the submission approves itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitExpense {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub needs_approval: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveExpense {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectExpense (reason required).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectExpense {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub rejected_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkExpensePaid.
///
/// `entry_id` is the journal entry booking the payment; the caller creates
/// and posts it in the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkExpensePaid {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub payment_date: NaiveDate,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelExpense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelExpense {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCommand {
    CreateExpense(CreateExpense),
    SubmitExpense(SubmitExpense),
    ApproveExpense(ApproveExpense),
    RejectExpense(RejectExpense),
    MarkExpensePaid(MarkExpensePaid),
    CancelExpense(CancelExpense),
}

/// Event: ExpenseCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCreated {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub category_id: ExpenseCategoryId,
    pub reference: String,
    pub description: String,
    pub amount: i64,
    pub expense_date: NaiveDate,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSubmitted {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseApproved.
///
/// `approved_by` is `None` when the category policy approved the submission
/// without review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseApproved {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub approved_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRejected {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub rejected_by: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpensePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpensePaid {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub amount: i64,
    pub payment_date: NaiveDate,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ExpenseCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCancelled {
    pub scope: Scope,
    pub expense_id: ExpenseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseEvent {
    ExpenseCreated(ExpenseCreated),
    ExpenseSubmitted(ExpenseSubmitted),
    ExpenseApproved(ExpenseApproved),
    ExpenseRejected(ExpenseRejected),
    ExpensePaid(ExpensePaid),
    ExpenseCancelled(ExpenseCancelled),
}

impl Event for ExpenseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExpenseEvent::ExpenseCreated(_) => "expense.created",
            ExpenseEvent::ExpenseSubmitted(_) => "expense.submitted",
            ExpenseEvent::ExpenseApproved(_) => "expense.approved",
            ExpenseEvent::ExpenseRejected(_) => "expense.rejected",
            ExpenseEvent::ExpensePaid(_) => "expense.paid",
            ExpenseEvent::ExpenseCancelled(_) => "expense.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ExpenseEvent::ExpenseCreated(e) => e.occurred_at,
            ExpenseEvent::ExpenseSubmitted(e) => e.occurred_at,
            ExpenseEvent::ExpenseApproved(e) => e.occurred_at,
            ExpenseEvent::ExpenseRejected(e) => e.occurred_at,
            ExpenseEvent::ExpensePaid(e) => e.occurred_at,
            ExpenseEvent::ExpenseCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Expense {
    type Command = ExpenseCommand;
    type Event = ExpenseEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ExpenseEvent::ExpenseCreated(e) => {
                self.id = e.expense_id;
                self.scope = Some(e.scope);
                self.category_id = Some(e.category_id);
                self.reference = e.reference.clone();
                self.description = e.description.clone();
                self.amount = e.amount;
                self.expense_date = Some(e.expense_date);
                self.status = ExpenseStatus::Draft;
                self.created = true;
            }
            ExpenseEvent::ExpenseSubmitted(_) => {
                self.status = ExpenseStatus::PendingApproval;
            }
            ExpenseEvent::ExpenseApproved(e) => {
                self.status = ExpenseStatus::Approved;
                self.approved_by = e.approved_by;
            }
            ExpenseEvent::ExpenseRejected(e) => {
                self.status = ExpenseStatus::Rejected;
                self.rejection_reason = Some(e.reason.clone());
            }
            ExpenseEvent::ExpensePaid(e) => {
                self.status = ExpenseStatus::Paid;
                self.payment_date = Some(e.payment_date);
                self.payment_entry_id = Some(e.entry_id);
            }
            ExpenseEvent::ExpenseCancelled(_) => {
                self.status = ExpenseStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ExpenseCommand::CreateExpense(cmd) => self.handle_create(cmd),
            ExpenseCommand::SubmitExpense(cmd) => self.handle_submit(cmd),
            ExpenseCommand::ApproveExpense(cmd) => self.handle_approve(cmd),
            ExpenseCommand::RejectExpense(cmd) => self.handle_reject(cmd),
            ExpenseCommand::MarkExpensePaid(cmd) => self.handle_mark_paid(cmd),
            ExpenseCommand::CancelExpense(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Expense {
    fn ensure_scope(&self, scope: Scope) -> Result<(), DomainError> {
        match self.scope {
            Some(own) => own.ensure_same(&scope, "expense"),
            None => Ok(()),
        }
    }

    fn ensure_expense_id(&self, expense_id: ExpenseId) -> Result<(), DomainError> {
        if self.id != expense_id {
            return Err(DomainError::validation("expense_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateExpense) -> Result<Vec<ExpenseEvent>, DomainError> {
        if self.created {
            return Err(DomainError::integrity("expense already exists"));
        }
        if cmd.reference.trim().is_empty() {
            return Err(DomainError::validation(
                "expense reference must not be empty",
            ));
        }
        if cmd.amount <= 0 {
            return Err(DomainError::validation("expense amount must be positive"));
        }

        Ok(vec![ExpenseEvent::ExpenseCreated(ExpenseCreated {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            category_id: cmd.category_id,
            reference: cmd.reference.clone(),
            description: cmd.description.clone(),
            amount: cmd.amount,
            expense_date: cmd.expense_date,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_submit(&self, cmd: &SubmitExpense) -> Result<Vec<ExpenseEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_expense_id(cmd.expense_id)?;

        if self.status != ExpenseStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft expenses can be submitted",
            ));
        }

        let submitted = ExpenseEvent::ExpenseSubmitted(ExpenseSubmitted {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            occurred_at: cmd.occurred_at,
        });

        if cmd.needs_approval {
            Ok(vec![submitted])
        } else {
            // Policy waives review: the submission approves itself.
            Ok(vec![
                submitted,
                ExpenseEvent::ExpenseApproved(ExpenseApproved {
                    scope: cmd.scope,
                    expense_id: cmd.expense_id,
                    approved_by: None,
                    occurred_at: cmd.occurred_at,
                }),
            ])
        }
    }

    fn handle_approve(&self, cmd: &ApproveExpense) -> Result<Vec<ExpenseEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_expense_id(cmd.expense_id)?;

        if self.status != ExpenseStatus::PendingApproval {
            return Err(DomainError::invalid_state(
                "only expenses pending approval can be approved",
            ));
        }

        Ok(vec![ExpenseEvent::ExpenseApproved(ExpenseApproved {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            approved_by: Some(cmd.approved_by),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectExpense) -> Result<Vec<ExpenseEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_expense_id(cmd.expense_id)?;

        if self.status != ExpenseStatus::PendingApproval {
            return Err(DomainError::invalid_state(
                "only expenses pending approval can be rejected",
            ));
        }
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation(
                "rejection reason must be provided",
            ));
        }

        Ok(vec![ExpenseEvent::ExpenseRejected(ExpenseRejected {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            rejected_by: cmd.rejected_by,
            reason: cmd.reason.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_paid(&self, cmd: &MarkExpensePaid) -> Result<Vec<ExpenseEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_expense_id(cmd.expense_id)?;

        if self.status != ExpenseStatus::Approved {
            return Err(DomainError::invalid_state(
                "only approved expenses can be paid",
            ));
        }

        Ok(vec![ExpenseEvent::ExpensePaid(ExpensePaid {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            amount: self.amount,
            payment_date: cmd.payment_date,
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelExpense) -> Result<Vec<ExpenseEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_expense_id(cmd.expense_id)?;

        match self.status {
            ExpenseStatus::Draft | ExpenseStatus::PendingApproval | ExpenseStatus::Approved => {}
            _ => {
                return Err(DomainError::invalid_state(
                    "paid, rejected or cancelled expenses cannot be cancelled",
                ));
            }
        }

        Ok(vec![ExpenseEvent::ExpenseCancelled(ExpenseCancelled {
            scope: cmd.scope,
            expense_id: cmd.expense_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
