//! Balance switches: move an amount between two accounts through the books.
//!
//! A switch is never edited or deleted in place. Deleting posts the mirror
//! entry and marks the record reversed; updating reverses the original and
//! posts a corrected switch under a fresh id, all in one unit of work.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use ledgerly_accounts::{AccountId, SwitchId, SwitchRecord, SwitchStatus};
use ledgerly_core::{AggregateId, DomainError, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope};
use ledgerly_journal::{FinancialEvent, JournalEntry};

use super::{
    LedgerService, StoreResult, build_posted_entry, collect_scope, commit_accounts, commit_entry,
};

/// Outcome of posting a balance switch.
#[derive(Debug, Clone)]
pub struct PostedSwitch {
    pub switch: SwitchRecord,
    pub entry: JournalEntry,
}

/// Outcome of reversing a balance switch.
#[derive(Debug, Clone)]
pub struct ReversedSwitch {
    pub switch: SwitchRecord,
    pub reversal_entry: JournalEntry,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Move `amount` from one account to another: post the 2-line entry
    /// (debit destination, credit source) and record the switch, atomically.
    #[allow(clippy::too_many_arguments)]
    pub fn switch_balance(
        &self,
        scope: Scope,
        from_account: AccountId,
        to_account: AccountId,
        amount: i64,
        switch_date: NaiveDate,
        description: impl Into<String>,
        created_by: UserId,
    ) -> StoreResult<PostedSwitch> {
        let description = description.into();
        let now = Utc::now();

        let mut state = self.write_state()?;
        let from = state.account(scope, from_account)?.to_ref();
        let to = state.account(scope, to_account)?.to_ref();

        let switch_id = SwitchId::new(AggregateId::new());
        let event = FinancialEvent::BalanceSwitched {
            switch_id,
            description: description.clone(),
            date: switch_date,
            amount,
            from_account: from,
            to_account: to,
            reversal: false,
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, created_by, now)?;

        let switch = SwitchRecord::new(
            switch_id,
            from_account,
            to_account,
            amount,
            switch_date,
            description,
            posted.entry.id_typed().0,
            scope,
            created_by,
        )?;

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.switches.insert((scope, switch_id), switch.clone());
        drop(state);

        self.publish_all(posted.envelopes);
        tracing::info!(
            "balance of {amount} switched between accounts via entry '{}'",
            posted.entry.reference()
        );
        Ok(PostedSwitch {
            switch,
            entry: posted.entry,
        })
    }

    /// Undo a switch by posting its mirror entry, dated as originally booked.
    pub fn delete_switch(
        &self,
        scope: Scope,
        switch_id: SwitchId,
        deleted_by: UserId,
    ) -> StoreResult<ReversedSwitch> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut switch = state.switch(scope, switch_id)?.clone();

        // Checked again by mark_reversed; checked here first so a re-delete
        // reports the status problem, not the taken journal reference.
        if switch.status() != SwitchStatus::Posted {
            return Err(DomainError::invalid_state("switch has already been reversed").into());
        }

        let from = state.account(scope, switch.from_account())?.to_ref();
        let to = state.account(scope, switch.to_account())?.to_ref();

        let event = FinancialEvent::BalanceSwitched {
            switch_id,
            description: format!("Reversal of: {}", switch.description()),
            date: switch.switch_date(),
            amount: switch.amount(),
            from_account: from,
            to_account: to,
            reversal: true,
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, deleted_by, now)?;
        switch.mark_reversed(posted.entry.id_typed().0)?;

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.switches.insert((scope, switch_id), switch.clone());
        drop(state);

        self.publish_all(posted.envelopes);
        tracing::info!("switch {switch_id} reversed via entry '{}'", posted.entry.reference());
        Ok(ReversedSwitch {
            switch,
            reversal_entry: posted.entry,
        })
    }

    /// Correct a switch: reverse the original movement and post the new one
    /// under a fresh id, in a single unit of work.
    #[allow(clippy::too_many_arguments)]
    pub fn update_switch(
        &self,
        scope: Scope,
        switch_id: SwitchId,
        from_account: AccountId,
        to_account: AccountId,
        amount: i64,
        switch_date: NaiveDate,
        description: impl Into<String>,
        updated_by: UserId,
    ) -> StoreResult<PostedSwitch> {
        let description = description.into();
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut original = state.switch(scope, switch_id)?.clone();

        // Checked again by mark_reversed; checked here first so an update of
        // a reversed switch reports the status problem, not the taken
        // journal reference.
        if original.status() != SwitchStatus::Posted {
            return Err(DomainError::invalid_state("switch has already been reversed").into());
        }

        let old_from = state.account(scope, original.from_account())?.to_ref();
        let old_to = state.account(scope, original.to_account())?.to_ref();
        let reversal = FinancialEvent::BalanceSwitched {
            switch_id,
            description: format!("Reversal of: {}", original.description()),
            date: original.switch_date(),
            amount: original.amount(),
            from_account: old_from,
            to_account: old_to,
            reversal: true,
        };

        // The replacement gets its own id so its journal reference cannot
        // collide with the original's.
        let replacement_id = SwitchId::new(AggregateId::new());
        let new_from = state.account(scope, from_account)?.to_ref();
        let new_to = state.account(scope, to_account)?.to_ref();
        let corrected = FinancialEvent::BalanceSwitched {
            switch_id: replacement_id,
            description: description.clone(),
            date: switch_date,
            amount,
            from_account: new_from,
            to_account: new_to,
            reversal: false,
        };

        let mut touched = HashMap::new();
        let reversal_posted =
            build_posted_entry(&state, scope, &reversal, &mut touched, updated_by, now)?;
        let corrected_posted =
            build_posted_entry(&state, scope, &corrected, &mut touched, updated_by, now)?;

        original.mark_reversed(reversal_posted.entry.id_typed().0)?;
        let switch = SwitchRecord::new(
            replacement_id,
            from_account,
            to_account,
            amount,
            switch_date,
            description,
            corrected_posted.entry.id_typed().0,
            scope,
            updated_by,
        )?;

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &reversal_posted.entry);
        commit_entry(&mut state, scope, &corrected_posted.entry);
        state.switches.insert((scope, switch_id), original);
        state
            .switches
            .insert((scope, replacement_id), switch.clone());
        drop(state);

        let mut envelopes = reversal_posted.envelopes;
        envelopes.extend(corrected_posted.envelopes);
        self.publish_all(envelopes);
        tracing::info!(
            "switch {switch_id} corrected: reversal '{}' and replacement '{}' posted",
            reversal_posted.entry.reference(),
            corrected_posted.entry.reference()
        );
        Ok(PostedSwitch {
            switch,
            entry: corrected_posted.entry,
        })
    }

    pub fn switch(&self, scope: Scope, switch_id: SwitchId) -> StoreResult<SwitchRecord> {
        let state = self.read_state()?;
        Ok(state.switch(scope, switch_id)?.clone())
    }

    pub fn list_switches(&self, scope: Scope) -> StoreResult<Vec<SwitchRecord>> {
        let state = self.read_state()?;
        let mut switches = collect_scope(&state.switches, scope);
        switches.sort_by_key(|s| s.switch_date());
        Ok(switches)
    }
}
