//! Manual journal entry operations.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use ledgerly_accounts::{AccountId, LineSide};
use ledgerly_core::{AggregateId, AggregateRoot, DomainResult, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope, execute};
use ledgerly_journal::{
    CancelEntry, CreateEntry, EntryCommand, JournalEntry, JournalEntryId, LineInput, PostEntry,
    ReplaceLines, balance_changes,
};

use super::{
    ENTRY_AGGREGATE, LedgerService, StoreResult, apply_balance_changes, collect_scope,
    commit_accounts, commit_entry, ensure_unused_reference, envelopes_for,
};
use crate::state::LedgerState;

/// One line of a new journal entry, before account resolution.
///
/// The service resolves the account id into the snapshot the line keeps;
/// an id from another scope simply fails the lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntryLine {
    pub account_id: AccountId,
    pub side: LineSide,
    pub amount: i64,
    pub description: String,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Create a draft entry. Balances are untouched until it posts.
    pub fn create_entry(
        &self,
        scope: Scope,
        date: NaiveDate,
        reference: impl Into<String>,
        description: impl Into<String>,
        lines: Vec<NewEntryLine>,
        created_by: UserId,
    ) -> StoreResult<JournalEntry> {
        let reference = reference.into();
        let now = Utc::now();

        let mut state = self.write_state()?;
        ensure_unused_reference(&state, scope, &reference)?;
        let lines = resolve_lines(&state, scope, lines)?;

        let entry_id = JournalEntryId::new(AggregateId::new());
        let mut entry = JournalEntry::empty(entry_id);
        let create = CreateEntry {
            scope,
            entry_id,
            date,
            reference,
            description: description.into(),
            lines,
            created_by,
            occurred_at: now,
        };
        let events = execute(&mut entry, &EntryCommand::Create(create))?;
        let envelopes = envelopes_for(scope, entry_id.0, ENTRY_AGGREGATE, 0, &events)?;

        commit_entry(&mut state, scope, &entry);
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "journal entry '{}' created for scope {scope}",
            entry.reference()
        );
        Ok(entry)
    }

    /// Swap the full line set of a draft entry.
    pub fn replace_entry_lines(
        &self,
        scope: Scope,
        entry_id: JournalEntryId,
        lines: Vec<NewEntryLine>,
    ) -> StoreResult<JournalEntry> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut entry = state.entry(scope, entry_id)?.clone();
        let base_version = entry.version();
        let lines = resolve_lines(&state, scope, lines)?;

        let replace = ReplaceLines {
            scope,
            entry_id,
            lines,
            occurred_at: now,
        };
        let events = execute(&mut entry, &EntryCommand::ReplaceLines(replace))?;
        let envelopes = envelopes_for(scope, entry_id.0, ENTRY_AGGREGATE, base_version, &events)?;

        state.entries.insert((scope, entry_id), entry.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!("journal entry '{}' lines replaced", entry.reference());
        Ok(entry)
    }

    /// Post a draft entry: re-validate the double-entry invariant, then move
    /// every affected balance in the same unit of work. Terminal.
    pub fn post_entry(&self, scope: Scope, entry_id: JournalEntryId) -> StoreResult<JournalEntry> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut entry = state.entry(scope, entry_id)?.clone();
        let base_version = entry.version();

        let post = PostEntry {
            scope,
            entry_id,
            occurred_at: now,
        };
        let events = execute(&mut entry, &EntryCommand::Post(post))?;

        let mut touched = HashMap::new();
        apply_balance_changes(&state, scope, &mut touched, &balance_changes(entry.lines()))?;
        let envelopes = envelopes_for(scope, entry_id.0, ENTRY_AGGREGATE, base_version, &events)?;

        commit_accounts(&mut state, scope, touched);
        state.entries.insert((scope, entry_id), entry.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "journal entry '{}' posted for scope {scope}",
            entry.reference()
        );
        Ok(entry)
    }

    /// Cancel a draft entry. Terminal; the reference stays taken.
    pub fn cancel_entry(
        &self,
        scope: Scope,
        entry_id: JournalEntryId,
    ) -> StoreResult<JournalEntry> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut entry = state.entry(scope, entry_id)?.clone();
        let base_version = entry.version();

        let cancel = CancelEntry {
            scope,
            entry_id,
            occurred_at: now,
        };
        let events = execute(&mut entry, &EntryCommand::Cancel(cancel))?;
        let envelopes = envelopes_for(scope, entry_id.0, ENTRY_AGGREGATE, base_version, &events)?;

        state.entries.insert((scope, entry_id), entry.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!("journal entry '{}' cancelled", entry.reference());
        Ok(entry)
    }

    pub fn entry(&self, scope: Scope, entry_id: JournalEntryId) -> StoreResult<JournalEntry> {
        let state = self.read_state()?;
        Ok(state.entry(scope, entry_id)?.clone())
    }

    pub fn entry_by_reference(&self, scope: Scope, reference: &str) -> StoreResult<JournalEntry> {
        let state = self.read_state()?;
        Ok(state.entry_by_reference(scope, reference)?.clone())
    }

    pub fn list_entries(&self, scope: Scope) -> StoreResult<Vec<JournalEntry>> {
        let state = self.read_state()?;
        let mut entries = collect_scope(&state.entries, scope);
        entries.sort_by(|a, b| (a.date(), a.reference()).cmp(&(b.date(), b.reference())));
        Ok(entries)
    }
}

/// Resolve account ids into the snapshots the lines keep.
fn resolve_lines(
    state: &LedgerState,
    scope: Scope,
    lines: Vec<NewEntryLine>,
) -> DomainResult<Vec<LineInput>> {
    let mut resolved = Vec::with_capacity(lines.len());
    for line in lines {
        let account = state.account(scope, line.account_id)?;
        resolved.push(LineInput {
            account: account.to_ref(),
            side: line.side,
            amount: line.amount,
            description: line.description,
        });
    }
    Ok(resolved)
}
