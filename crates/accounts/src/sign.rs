//! The double-entry sign rule, as a pure function.
//!
//! Asset and expense accounts carry a debit normal balance: debits increase
//! them, credits decrease them. Liability, equity and revenue accounts carry
//! a credit normal balance: credits increase them, debits decrease them.

use serde::{Deserialize, Serialize};

use crate::category::AccountKind;

/// Which side of an entry a journal line sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSide {
    Debit,
    Credit,
}

impl LineSide {
    pub fn opposite(self) -> Self {
        match self {
            LineSide::Debit => LineSide::Credit,
            LineSide::Credit => LineSide::Debit,
        }
    }
}

/// The side on which an account of this kind grows.
pub fn natural_side(kind: AccountKind) -> LineSide {
    match kind {
        AccountKind::Asset | AccountKind::Expense => LineSide::Debit,
        AccountKind::Liability | AccountKind::Equity | AccountKind::Revenue => LineSide::Credit,
    }
}

/// Signed balance change a posted line produces on its account.
///
/// `amount` is a positive line amount in minor units; the sign of the result
/// is determined entirely by the account kind and the line side.
pub fn balance_delta(kind: AccountKind, side: LineSide, amount: i64) -> i64 {
    if side == natural_side(kind) {
        amount
    } else {
        -amount
    }
}
