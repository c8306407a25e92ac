use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_accounts::{AccountId, AccountRef, LineSide, balance_delta};
use ledgerly_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Scope, UserId,
};
use ledgerly_events::Event;

/// Journal entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalEntryId(pub AggregateId);

impl JournalEntryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Journal entry status lifecycle. Posted and cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Posted,
    Cancelled,
}

/// One committed line of a journal entry.
///
/// Lines inherit the entry's scope by construction; the embedded account
/// snapshot was resolved within that scope when the line was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub line_no: u32,
    pub account: AccountRef,
    pub side: LineSide,
    /// Positive amount in minor units (e.g., cents).
    pub amount: i64,
    pub description: String,
}

/// Line data as supplied to create/replace commands (line numbers are
/// assigned by the aggregate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub account: AccountRef,
    pub side: LineSide,
    pub amount: i64,
    pub description: String,
}

/// Signed effect one posted line has on its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub account_id: AccountId,
    pub delta: i64,
}

/// Balance changes a set of posted lines produces, via the sign rule.
pub fn balance_changes(lines: &[JournalLine]) -> Vec<BalanceChange> {
    lines
        .iter()
        .map(|line| BalanceChange {
            account_id: line.account.account_id,
            delta: balance_delta(line.account.kind, line.side, line.amount),
        })
        .collect()
}

/// Aggregate root: JournalEntry.
///
/// Owns its lines. Drafts may be edited; posting re-validates the
/// double-entry invariant and is terminal, as is cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    id: JournalEntryId,
    scope: Option<Scope>,
    date: NaiveDate,
    reference: String,
    description: String,
    status: EntryStatus,
    /// Sum of debit lines in minor units.
    total_amount: i64,
    lines: Vec<JournalLine>,
    created_by: Option<UserId>,
    version: u64,
    created: bool,
}

impl JournalEntry {
    /// Empty, not-yet-created aggregate instance.
    pub fn empty(id: JournalEntryId) -> Self {
        Self {
            id,
            scope: None,
            date: NaiveDate::default(),
            reference: String::new(),
            description: String::new(),
            status: EntryStatus::Draft,
            total_amount: 0,
            lines: Vec::new(),
            created_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> JournalEntryId {
        self.id
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn lines(&self) -> &[JournalLine] {
        &self.lines
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    /// Double-entry invariant for the current lines.
    ///
    /// Fails when the entry has fewer than two lines or its debit and credit
    /// totals differ (exact equality, minor units).
    pub fn validate(&self) -> DomainResult<()> {
        validate_balanced(&self.lines)
    }
}

impl AggregateRoot for JournalEntry {
    type Id = JournalEntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntry {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub lines: Vec<LineInput>,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceLines (drafts only; swaps the full line set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceLines {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub lines: Vec<LineInput>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PostEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostEntry {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelEntry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelEntry {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryCommand {
    Create(CreateEntry),
    ReplaceLines(ReplaceLines),
    Post(PostEntry),
    Cancel(CancelEntry),
}

/// Event: EntryCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCreated {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub lines: Vec<JournalLine>,
    pub total_amount: i64,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LinesReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinesReplaced {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub lines: Vec<JournalLine>,
    pub total_amount: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryPosted. Carries the lines so consumers need no second read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPosted {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub date: NaiveDate,
    pub reference: String,
    pub lines: Vec<JournalLine>,
    pub total_amount: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryCancelled {
    pub scope: Scope,
    pub entry_id: JournalEntryId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryEvent {
    Created(EntryCreated),
    LinesReplaced(LinesReplaced),
    Posted(EntryPosted),
    Cancelled(EntryCancelled),
}

impl Event for EntryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EntryEvent::Created(_) => "journal.entry.created",
            EntryEvent::LinesReplaced(_) => "journal.entry.lines_replaced",
            EntryEvent::Posted(_) => "journal.entry.posted",
            EntryEvent::Cancelled(_) => "journal.entry.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EntryEvent::Created(e) => e.occurred_at,
            EntryEvent::LinesReplaced(e) => e.occurred_at,
            EntryEvent::Posted(e) => e.occurred_at,
            EntryEvent::Cancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for JournalEntry {
    type Command = EntryCommand;
    type Event = EntryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EntryEvent::Created(e) => {
                self.id = e.entry_id;
                self.scope = Some(e.scope);
                self.date = e.date;
                self.reference = e.reference.clone();
                self.description = e.description.clone();
                self.status = EntryStatus::Draft;
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
                self.created_by = Some(e.created_by);
                self.created = true;
            }
            EntryEvent::LinesReplaced(e) => {
                self.lines = e.lines.clone();
                self.total_amount = e.total_amount;
            }
            EntryEvent::Posted(_) => {
                self.status = EntryStatus::Posted;
            }
            EntryEvent::Cancelled(_) => {
                self.status = EntryStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EntryCommand::Create(cmd) => self.handle_create(cmd),
            EntryCommand::ReplaceLines(cmd) => self.handle_replace_lines(cmd),
            EntryCommand::Post(cmd) => self.handle_post(cmd),
            EntryCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl JournalEntry {
    fn ensure_scope(&self, scope: Scope) -> DomainResult<()> {
        match self.scope {
            Some(own) => own.ensure_same(&scope, "journal entry"),
            None => Ok(()),
        }
    }

    fn ensure_entry_id(&self, entry_id: JournalEntryId) -> DomainResult<()> {
        if self.id != entry_id {
            return Err(DomainError::validation("entry_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateEntry) -> DomainResult<Vec<EntryEvent>> {
        if self.created {
            return Err(DomainError::integrity("journal entry already exists"));
        }

        if cmd.reference.trim().is_empty() {
            return Err(DomainError::validation("entry reference must not be empty"));
        }
        if cmd.date > cmd.occurred_at.date_naive() {
            return Err(DomainError::validation("entry date cannot be in the future"));
        }

        let lines = build_lines(&cmd.lines)?;
        let total_amount = debit_total(&lines)?;

        Ok(vec![EntryEvent::Created(EntryCreated {
            scope: cmd.scope,
            entry_id: cmd.entry_id,
            date: cmd.date,
            reference: cmd.reference.clone(),
            description: cmd.description.clone(),
            lines,
            total_amount,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_lines(&self, cmd: &ReplaceLines) -> DomainResult<Vec<EntryEvent>> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_entry_id(cmd.entry_id)?;

        if self.status != EntryStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft entries can be modified",
            ));
        }

        let lines = build_lines(&cmd.lines)?;
        let total_amount = debit_total(&lines)?;

        Ok(vec![EntryEvent::LinesReplaced(LinesReplaced {
            scope: cmd.scope,
            entry_id: cmd.entry_id,
            lines,
            total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostEntry) -> DomainResult<Vec<EntryEvent>> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_entry_id(cmd.entry_id)?;

        if self.status != EntryStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft entries can be posted",
            ));
        }

        validate_balanced(&self.lines)?;
        let total_amount = debit_total(&self.lines)?;

        Ok(vec![EntryEvent::Posted(EntryPosted {
            scope: cmd.scope,
            entry_id: cmd.entry_id,
            date: self.date,
            reference: self.reference.clone(),
            lines: self.lines.clone(),
            total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelEntry) -> DomainResult<Vec<EntryEvent>> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_entry_id(cmd.entry_id)?;

        if self.status != EntryStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft entries can be cancelled",
            ));
        }

        Ok(vec![EntryEvent::Cancelled(EntryCancelled {
            scope: cmd.scope,
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Validate line inputs and assign line numbers.
fn build_lines(inputs: &[LineInput]) -> DomainResult<Vec<JournalLine>> {
    let mut lines = Vec::with_capacity(inputs.len());
    for (idx, input) in inputs.iter().enumerate() {
        if input.amount <= 0 {
            return Err(DomainError::validation("line amount must be positive"));
        }
        lines.push(JournalLine {
            line_no: (idx as u32) + 1,
            account: input.account.clone(),
            side: input.side,
            amount: input.amount,
            description: input.description.clone(),
        });
    }
    Ok(lines)
}

/// Sum of debit lines, checked into minor units.
fn debit_total(lines: &[JournalLine]) -> DomainResult<i64> {
    let total: i128 = lines
        .iter()
        .filter(|l| l.side == LineSide::Debit)
        .map(|l| l.amount as i128)
        .sum();
    i64::try_from(total).map_err(|_| DomainError::validation("entry total overflow"))
}

fn validate_balanced(lines: &[JournalLine]) -> DomainResult<()> {
    if lines.len() < 2 {
        return Err(DomainError::balance_mismatch(
            "journal entry must have at least two lines",
        ));
    }

    let mut debit_total: i128 = 0;
    let mut credit_total: i128 = 0;
    for line in lines {
        match line.side {
            LineSide::Debit => debit_total += line.amount as i128,
            LineSide::Credit => credit_total += line.amount as i128,
        }
    }

    if debit_total != credit_total {
        return Err(DomainError::balance_mismatch(
            "total debit must equal total credit",
        ));
    }
    Ok(())
}
