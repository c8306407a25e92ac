use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_accounts::{AccountRef, LineSide};
use ledgerly_core::{Scope, UserId};

use crate::entry::{CreateEntry, JournalEntryId, LineInput};

/// A journal entry under construction.
///
/// Drafts carry no identity or scope yet; adapters build them from financial
/// events and the store turns them into create commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub reference: String,
    pub description: String,
    pub lines: Vec<LineInput>,
}

impl EntryDraft {
    pub fn new(date: NaiveDate, reference: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            date,
            reference: reference.into(),
            description: description.into(),
            lines: Vec::new(),
        }
    }

    /// The canonical 2-line form: debit one account, credit another, same
    /// amount. Every single-amount financial event books this shape.
    pub fn two_line(
        date: NaiveDate,
        reference: impl Into<String>,
        description: impl Into<String>,
        debit: AccountRef,
        credit: AccountRef,
        amount: i64,
    ) -> Self {
        let description = description.into();
        let mut draft = Self::new(date, reference, description.clone());
        draft.push(debit, LineSide::Debit, amount, description.clone());
        draft.push(credit, LineSide::Credit, amount, description);
        draft
    }

    pub fn push(
        &mut self,
        account: AccountRef,
        side: LineSide,
        amount: i64,
        description: impl Into<String>,
    ) {
        self.lines.push(LineInput {
            account,
            side,
            amount,
            description: description.into(),
        });
    }

    /// Net debit minus credit over the draft lines (diagnostic; the entry
    /// aggregate re-validates on post).
    pub fn imbalance(&self) -> i128 {
        self.lines
            .iter()
            .map(|l| match l.side {
                LineSide::Debit => l.amount as i128,
                LineSide::Credit => -(l.amount as i128),
            })
            .sum()
    }

    /// Turn the draft into a create command for a fresh entry.
    pub fn into_create(
        self,
        scope: Scope,
        entry_id: JournalEntryId,
        created_by: UserId,
        occurred_at: DateTime<Utc>,
    ) -> CreateEntry {
        CreateEntry {
            scope,
            entry_id,
            date: self.date,
            reference: self.reference,
            description: self.description,
            lines: self.lines,
            created_by,
            occurred_at,
        }
    }
}
