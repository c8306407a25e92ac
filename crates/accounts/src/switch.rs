use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

use crate::account::AccountId;

/// Balance switch identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(pub AggregateId);

impl SwitchId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SwitchId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchStatus {
    Posted,
    Reversed,
}

/// Record of a balance moved between two accounts.
///
/// The movement itself lives in the books as an ordinary 2-line journal entry
/// (debit destination, credit source); this record points at that entry so
/// the switch can later be reversed by posting the mirror entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRecord {
    id: SwitchId,
    from_account: AccountId,
    to_account: AccountId,
    /// Positive amount in minor units.
    amount: i64,
    switch_date: NaiveDate,
    description: String,
    entry_id: AggregateId,
    reversal_entry_id: Option<AggregateId>,
    status: SwitchStatus,
    scope: Scope,
    created_by: UserId,
}

impl SwitchRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SwitchId,
        from_account: AccountId,
        to_account: AccountId,
        amount: i64,
        switch_date: NaiveDate,
        description: impl Into<String>,
        entry_id: AggregateId,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        if from_account == to_account {
            return Err(DomainError::validation(
                "cannot switch balance to the same account",
            ));
        }
        if amount <= 0 {
            return Err(DomainError::validation("switch amount must be positive"));
        }
        Ok(Self {
            id,
            from_account,
            to_account,
            amount,
            switch_date,
            description: description.into(),
            entry_id,
            reversal_entry_id: None,
            status: SwitchStatus::Posted,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> SwitchId {
        self.id
    }

    pub fn from_account(&self) -> AccountId {
        self.from_account
    }

    pub fn to_account(&self) -> AccountId {
        self.to_account
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn switch_date(&self) -> NaiveDate {
        self.switch_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn entry_id(&self) -> AggregateId {
        self.entry_id
    }

    pub fn reversal_entry_id(&self) -> Option<AggregateId> {
        self.reversal_entry_id
    }

    pub fn status(&self) -> SwitchStatus {
        self.status
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Mark the switch reversed once the mirror entry has posted.
    pub fn mark_reversed(&mut self, reversal_entry_id: AggregateId) -> DomainResult<()> {
        if self.status != SwitchStatus::Posted {
            return Err(DomainError::invalid_state(
                "switch has already been reversed",
            ));
        }
        self.reversal_entry_id = Some(reversal_entry_id);
        self.status = SwitchStatus::Reversed;
        Ok(())
    }
}

impl Entity for SwitchRecord {
    type Id = SwitchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
