//! `ledgerly-journal` — journal entries and the posting protocol.
//!
//! A journal entry is the only way balances move. Drafts are built (directly
//! or through a [`adapters::FinancialEvent`]), validated against the
//! double-entry invariant and posted exactly once; posting yields the signed
//! balance changes the store applies to the affected accounts.

pub mod adapters;
pub mod draft;
pub mod entry;

pub use adapters::FinancialEvent;
pub use draft::EntryDraft;
pub use entry::{
    BalanceChange, CancelEntry, CreateEntry, EntryCommand, EntryEvent, EntryStatus, JournalEntry,
    JournalEntryId, JournalLine, LineInput, PostEntry, ReplaceLines, balance_changes,
};
