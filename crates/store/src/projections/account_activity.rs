use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use ledgerly_accounts::{AccountKind, LineSide, balance_delta};
use ledgerly_core::{AggregateId, Scope};
use ledgerly_events::EventEnvelope;
use ledgerly_journal::EntryEvent;

use crate::read_model::ScopedStore;

/// Read model: posting activity per account for a scope.
///
/// `balance` follows the account's sign rule (natural side positive), so it
/// agrees with the authoritative account balances; the debit and credit
/// totals are unsigned running sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountActivity {
    pub account_code: String,
    pub account_name: String,
    pub kind: AccountKind,
    pub lines_posted: u64,
    pub debit_total: i128,
    pub credit_total: i128,
    pub balance: i128,
}

/// Scope+aggregate cursor for idempotent projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    scope: Scope,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum ActivityProjectionError {
    #[error("failed to deserialize journal event: {0}")]
    Deserialize(String),

    #[error("scope isolation violation: {0}")]
    ScopeIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Projection: posted journal entries → per-account activity per scope.
#[derive(Debug)]
pub struct AccountActivityProjection<S>
where
    S: ScopedStore<String, AccountActivity>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> AccountActivityProjection<S>
where
    S: ScopedStore<String, AccountActivity>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, scope: Scope, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors
                .get(&CursorKey {
                    scope,
                    aggregate_id,
                })
                .unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, scope: Scope, aggregate_id: AggregateId, sequence_number: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(
                CursorKey {
                    scope,
                    aggregate_id,
                },
                sequence_number,
            );
        }
    }

    fn clear_cursors(&self, scope: Scope) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.scope != scope);
        }
    }

    /// Get activity for a specific account code.
    pub fn get(&self, scope: Scope, code: &str) -> Option<AccountActivity> {
        self.store.get(scope, &code.to_string())
    }

    /// List all activity rows for a scope.
    pub fn list(&self, scope: Scope) -> Vec<AccountActivity> {
        self.store.list(scope)
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ActivityProjectionError> {
        if envelope.aggregate_type() != "journal.entry" {
            return Ok(());
        }

        let scope = envelope.scope();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(scope, aggregate_id);

        if seq == 0 {
            return Err(ActivityProjectionError::NonMonotonicSequence { last, found: seq });
        }

        // At-least-once delivery: replays are skipped, not errors.
        if seq <= last {
            return Ok(());
        }

        if seq != last + 1 && last != 0 {
            return Err(ActivityProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: EntryEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ActivityProjectionError::Deserialize(e.to_string()))?;

        let event_scope = match &ev {
            EntryEvent::Created(e) => e.scope,
            EntryEvent::LinesReplaced(e) => e.scope,
            EntryEvent::Posted(e) => e.scope,
            EntryEvent::Cancelled(e) => e.scope,
        };

        if event_scope != scope {
            return Err(ActivityProjectionError::ScopeIsolation(
                "event scope does not match envelope scope".to_string(),
            ));
        }

        // Only posting moves balances; the other events just advance the
        // cursor.
        if let EntryEvent::Posted(e) = ev {
            for line in &e.lines {
                let code = line.account.code.clone();
                let mut rm = self.store.get(scope, &code).unwrap_or(AccountActivity {
                    account_code: code.clone(),
                    account_name: line.account.name.clone(),
                    kind: line.account.kind,
                    lines_posted: 0,
                    debit_total: 0,
                    credit_total: 0,
                    balance: 0,
                });

                rm.lines_posted += 1;
                match line.side {
                    LineSide::Debit => rm.debit_total += i128::from(line.amount),
                    LineSide::Credit => rm.credit_total += i128::from(line.amount),
                }
                rm.balance += i128::from(balance_delta(line.account.kind, line.side, line.amount));
                self.store.upsert(scope, code, rm);
            }
        }

        self.update_cursor(scope, aggregate_id, seq);
        Ok(())
    }

    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ActivityProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        {
            let mut scopes = envs.iter().map(|e| e.scope()).collect::<Vec<_>>();
            scopes.sort_by_key(|s| {
                (
                    *s.tenant_id.as_uuid().as_bytes(),
                    *s.branch_id.as_uuid().as_bytes(),
                )
            });
            scopes.dedup();
            for s in scopes {
                self.store.clear_scope(s);
                self.clear_cursors(s);
            }
        }

        envs.sort_by_key(|e| {
            (
                *e.scope().tenant_id.as_uuid().as_bytes(),
                *e.scope().branch_id.as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }

        Ok(())
    }
}
