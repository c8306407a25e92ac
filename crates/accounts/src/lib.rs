//! `ledgerly-accounts` — chart of accounts and the balance sign rule.
//!
//! Accounts hold the running balances the ledger maintains; every balance
//! change flows through the pure [`sign::balance_delta`] function. Categories
//! classify accounts into the five double-entry kinds, and [`chart::ChartConfig`]
//! names the well-known codes adapters resolve against.

pub mod account;
pub mod category;
pub mod chart;
pub mod sign;
pub mod switch;

pub use account::{Account, AccountId, AccountRef};
pub use category::{AccountCategory, AccountCategoryId, AccountKind};
pub use chart::ChartConfig;
pub use sign::{LineSide, balance_delta, natural_side};
pub use switch::{SwitchId, SwitchRecord, SwitchStatus};
