//! Ledger operations as single units of work.
//!
//! Every mutating operation follows the same pipeline:
//!
//! ```text
//! Operation
//!   ↓
//! 1. Take the state write lock (concurrent operations serialize here)
//!   ↓
//! 2. Decide on clones: run commands, apply balance deltas, build envelopes
//!    (all fallible work; committed state is untouched on any error)
//!   ↓
//! 3. Commit the clones into the tables (infallible inserts)
//!   ↓
//! 4. Drop the lock, then publish the envelopes to the bus
//! ```
//!
//! The decision phase never mutates the guarded state, so an error anywhere
//! in step 2 rolls the operation back by simply returning. Publication is
//! best-effort: the commit is the source of truth, and a consumer that
//! missed an envelope rebuilds from committed state.

use std::collections::{HashMap, hash_map};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use ledgerly_accounts::{
    Account, AccountCategory, AccountCategoryId, AccountId, AccountKind, ChartConfig,
};
use ledgerly_core::{AggregateId, DomainError, Scope, UserId};
use ledgerly_events::{Event, EventBus, EventEnvelope, execute};
use ledgerly_journal::{
    BalanceChange, EntryCommand, FinancialEvent, JournalEntry, JournalEntryId, PostEntry,
    balance_changes,
};

use crate::state::LedgerState;

mod assets;
mod budgets;
mod expenses;
mod incomes;
mod journal;
mod switches;
mod transactions;

pub use assets::{DepreciationRun, DisposedAsset};
pub use expenses::PaidExpense;
pub use incomes::ConfirmedIncome;
pub use journal::NewEntryLine;
pub use switches::{PostedSwitch, ReversedSwitch};

/// Aggregate type tags carried on published envelopes.
const ENTRY_AGGREGATE: &str = "journal.entry";
const EXPENSE_AGGREGATE: &str = "expense";
const INCOME_AGGREGATE: &str = "income";
const ASSET_AGGREGATE: &str = "asset";
const BUDGET_AGGREGATE: &str = "budget";

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure; the operation was rolled back.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The state lock was poisoned by a panicking writer.
    #[error("ledger state lock poisoned")]
    Poisoned,

    /// An event payload could not be serialized for publication.
    #[error("failed to serialize event payload: {0}")]
    Serialize(String),
}

/// The ledger: authoritative state behind one lock, plus the event bus.
///
/// Cheap to share behind an `Arc`; all methods take `&self`. The single
/// write lock is what makes concurrent posts against the same accounts
/// serialize instead of interleaving.
#[derive(Debug)]
pub struct LedgerService<B> {
    state: RwLock<LedgerState>,
    bus: B,
}

impl<B> LedgerService<B> {
    pub fn new(bus: B) -> Self {
        Self {
            state: RwLock::new(LedgerState::new()),
            bus,
        }
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Publish committed envelopes. Failures are logged, never surfaced:
    /// the state commit already happened and must not be reported as failed.
    fn publish_all(&self, envelopes: Vec<EventEnvelope<JsonValue>>) {
        for envelope in envelopes {
            let event_id = envelope.event_id();
            if let Err(e) = self.bus.publish(envelope) {
                tracing::warn!("event {event_id} publication failed after commit: {e:?}");
            }
        }
    }

    // ---- chart of accounts ----

    /// Install the chart mapping for a scope (replaces any previous one).
    pub fn set_chart(&self, scope: Scope, chart: ChartConfig) -> StoreResult<()> {
        let mut state = self.write_state()?;
        state.charts.insert(scope, chart);
        drop(state);

        tracing::info!("chart of accounts configured for scope {scope}");
        Ok(())
    }

    /// Chart mapping for a scope; defaults apply until one is installed.
    pub fn chart(&self, scope: Scope) -> StoreResult<ChartConfig> {
        let state = self.read_state()?;
        Ok(state.chart(scope))
    }

    // ---- account categories ----

    pub fn create_account_category(
        &self,
        scope: Scope,
        name: impl Into<String>,
        kind: AccountKind,
        description: impl Into<String>,
        created_by: UserId,
    ) -> StoreResult<AccountCategory> {
        let category = AccountCategory::new(
            AccountCategoryId::new(AggregateId::new()),
            name,
            kind,
            description,
            scope,
            created_by,
        )?;

        let mut state = self.write_state()?;
        state
            .account_categories
            .insert((scope, category.id_typed()), category.clone());
        drop(state);

        tracing::info!(
            "account category '{}' created for scope {scope}",
            category.name()
        );
        Ok(category)
    }

    pub fn account_category(
        &self,
        scope: Scope,
        category_id: AccountCategoryId,
    ) -> StoreResult<AccountCategory> {
        let state = self.read_state()?;
        Ok(state.account_category(scope, category_id)?.clone())
    }

    pub fn list_account_categories(&self, scope: Scope) -> StoreResult<Vec<AccountCategory>> {
        let state = self.read_state()?;
        let mut categories = collect_scope(&state.account_categories, scope);
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    // ---- accounts ----

    /// Create an account under a category; the category fixes its kind.
    pub fn create_account(
        &self,
        scope: Scope,
        code: impl Into<String>,
        name: impl Into<String>,
        category_id: AccountCategoryId,
        created_by: UserId,
    ) -> StoreResult<Account> {
        let code = code.into();

        let mut state = self.write_state()?;
        let kind = state.account_category(scope, category_id)?.kind();
        ensure_unused_code(&state, scope, &code)?;

        let account = Account::new(
            AccountId::new(AggregateId::new()),
            code,
            name,
            category_id,
            kind,
            scope,
            created_by,
        )?;

        state
            .account_codes
            .insert((scope, account.code().to_string()), account.id_typed());
        state
            .accounts
            .insert((scope, account.id_typed()), account.clone());
        drop(state);

        tracing::info!(
            "account {} '{}' created for scope {scope}",
            account.code(),
            account.name()
        );
        Ok(account)
    }

    pub fn account(&self, scope: Scope, account_id: AccountId) -> StoreResult<Account> {
        let state = self.read_state()?;
        Ok(state.account(scope, account_id)?.clone())
    }

    pub fn account_by_code(&self, scope: Scope, code: &str) -> StoreResult<Account> {
        let state = self.read_state()?;
        Ok(state.account_by_code(scope, code)?.clone())
    }

    pub fn list_accounts(&self, scope: Scope) -> StoreResult<Vec<Account>> {
        let state = self.read_state()?;
        let mut accounts = collect_scope(&state.accounts, scope);
        accounts.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(accounts)
    }
}

/// A journal entry decided within a unit of work, ready to commit.
struct PostedEntry {
    entry: JournalEntry,
    envelopes: Vec<EventEnvelope<JsonValue>>,
}

/// Create and post the entry a financial event books, all on clones.
///
/// Resolves nothing itself: the caller has already snapshotted the accounts
/// into the event. Balance deltas accumulate into `touched` so several
/// entries in one unit of work can hit the same account.
fn build_posted_entry(
    state: &LedgerState,
    scope: Scope,
    event: &FinancialEvent,
    touched: &mut HashMap<AccountId, Account>,
    created_by: UserId,
    now: DateTime<Utc>,
) -> StoreResult<PostedEntry> {
    let draft = event.entry_draft()?;
    ensure_unused_reference(state, scope, &draft.reference)?;

    let entry_id = JournalEntryId::new(AggregateId::new());
    let mut entry = JournalEntry::empty(entry_id);

    let create = draft.into_create(scope, entry_id, created_by, now);
    let mut events = execute(&mut entry, &EntryCommand::Create(create))?;
    let post = PostEntry {
        scope,
        entry_id,
        occurred_at: now,
    };
    events.extend(execute(&mut entry, &EntryCommand::Post(post))?);

    apply_balance_changes(state, scope, touched, &balance_changes(entry.lines()))?;

    let envelopes = envelopes_for(scope, entry_id.0, ENTRY_AGGREGATE, 0, &events)?;
    Ok(PostedEntry { entry, envelopes })
}

/// Apply signed balance changes to account clones, loading each touched
/// account once. Fails without side effects if an account is missing or a
/// balance would overflow.
fn apply_balance_changes(
    state: &LedgerState,
    scope: Scope,
    touched: &mut HashMap<AccountId, Account>,
    changes: &[BalanceChange],
) -> StoreResult<()> {
    for change in changes {
        let account = match touched.entry(change.account_id) {
            hash_map::Entry::Occupied(slot) => slot.into_mut(),
            hash_map::Entry::Vacant(slot) => {
                slot.insert(state.account(scope, change.account_id)?.clone())
            }
        };
        account.apply_delta(change.delta)?;
    }
    Ok(())
}

/// Wrap decided events into envelopes, sequenced after `base_version`.
fn envelopes_for<E>(
    scope: Scope,
    aggregate_id: AggregateId,
    aggregate_type: &str,
    base_version: u64,
    events: &[E],
) -> StoreResult<Vec<EventEnvelope<JsonValue>>>
where
    E: Event + Serialize,
{
    let mut envelopes = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        let payload =
            serde_json::to_value(event).map_err(|e| StoreError::Serialize(e.to_string()))?;
        envelopes.push(EventEnvelope::new(
            Uuid::now_v7(),
            scope,
            aggregate_id,
            aggregate_type,
            base_version + 1 + i as u64,
            payload,
        ));
    }
    Ok(envelopes)
}

fn ensure_unused_reference(
    state: &LedgerState,
    scope: Scope,
    reference: &str,
) -> Result<(), DomainError> {
    if state.entry_refs.contains_key(&(scope, reference.to_string())) {
        return Err(DomainError::integrity(format!(
            "journal reference '{reference}' is already in use"
        )));
    }
    Ok(())
}

fn ensure_unused_code(state: &LedgerState, scope: Scope, code: &str) -> Result<(), DomainError> {
    if state.account_codes.contains_key(&(scope, code.to_string())) {
        return Err(DomainError::integrity(format!(
            "account code '{code}' is already in use"
        )));
    }
    Ok(())
}

fn ensure_account_kind(
    actual: AccountKind,
    expected: AccountKind,
    message: &str,
) -> Result<(), DomainError> {
    if actual != expected {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

/// Commit a decided entry: register its reference, then store it.
fn commit_entry(state: &mut LedgerState, scope: Scope, entry: &JournalEntry) {
    state
        .entry_refs
        .insert((scope, entry.reference().to_string()), entry.id_typed());
    state.entries.insert((scope, entry.id_typed()), entry.clone());
}

/// Commit the touched account clones over their committed versions.
fn commit_accounts(state: &mut LedgerState, scope: Scope, touched: HashMap<AccountId, Account>) {
    for (account_id, account) in touched {
        state.accounts.insert((scope, account_id), account);
    }
}

fn collect_scope<K, V: Clone>(table: &HashMap<(Scope, K), V>, scope: Scope) -> Vec<V> {
    table
        .iter()
        .filter_map(|((s, _k), v)| if *s == scope { Some(v.clone()) } else { None })
        .collect()
}
