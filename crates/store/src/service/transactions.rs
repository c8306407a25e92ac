//! Generic sink for transactions handed over by integrated modules.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value as JsonValue;

use ledgerly_core::{Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope};
use ledgerly_integrations::TransactionRequest;
use ledgerly_journal::{FinancialEvent, JournalEntry};

use super::{LedgerService, StoreResult, build_posted_entry, commit_accounts, commit_entry};

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Book a transaction handed over by procurement, payroll or sales.
    ///
    /// The source picks its debit and credit chart codes; the scope must
    /// carry accounts under both codes or the whole call fails and nothing
    /// is booked.
    pub fn record_transaction(
        &self,
        scope: Scope,
        request: TransactionRequest,
        created_by: UserId,
    ) -> StoreResult<JournalEntry> {
        request.validate()?;
        let now = Utc::now();

        let mut state = self.write_state()?;
        let chart = state.chart(scope);
        let (debit_code, credit_code) = request.source.entry_codes(&chart);
        let debit_account = state.account_by_code(scope, debit_code)?.to_ref();
        let credit_account = state.account_by_code(scope, credit_code)?.to_ref();

        let event = FinancialEvent::IntegrationReceived {
            module: request.source.module_code().to_string(),
            reference: request.reference.clone(),
            description: request.description.clone(),
            date: request.date,
            amount: request.amount,
            debit_account,
            credit_account,
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, created_by, now)?;

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        drop(state);

        self.publish_all(posted.envelopes);
        tracing::info!(
            "{} transaction '{}' booked as entry '{}'",
            request.source.module_code(),
            request.reference,
            posted.entry.reference()
        );
        Ok(posted.entry)
    }
}
