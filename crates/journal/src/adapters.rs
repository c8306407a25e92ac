//! Financial events and how each books itself as a journal entry.
//!
//! Every module that moves money (expenses, income, assets, switches,
//! external integrations) reduces to one of these variants. Each variant
//! knows its deterministic journal reference and its balanced line set;
//! the store creates and posts the resulting draft in the same unit of work
//! that transitions the source record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_accounts::{AccountKind, AccountRef, LineSide, SwitchId};
use ledgerly_core::{DomainError, DomainResult};

use crate::draft::EntryDraft;

/// A financial fact awaiting its journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FinancialEvent {
    /// An approved expense is paid from cash.
    ExpensePaid {
        reference: String,
        description: String,
        date: NaiveDate,
        amount: i64,
        expense_account: AccountRef,
        cash_account: AccountRef,
    },
    /// A draft income is confirmed and received into cash.
    IncomeConfirmed {
        reference: String,
        description: String,
        date: NaiveDate,
        amount: i64,
        revenue_account: AccountRef,
        cash_account: AccountRef,
    },
    /// One period of depreciation charged against an asset.
    AssetDepreciated {
        asset_number: String,
        asset_name: String,
        date: NaiveDate,
        amount: i64,
        depreciation_account: AccountRef,
        accumulated_depreciation_account: AccountRef,
    },
    /// An asset leaves the books; proceeds, cost recovery and gain/loss.
    AssetDisposed {
        asset_number: String,
        asset_name: String,
        date: NaiveDate,
        sale_price: i64,
        costs_of_disposal: i64,
        purchase_cost: i64,
        book_value: i64,
        cash_account: AccountRef,
        asset_account: AccountRef,
        accumulated_depreciation_account: AccountRef,
        gain_account: AccountRef,
        loss_account: AccountRef,
    },
    /// Balance moved between two accounts (or the mirror of an earlier move).
    BalanceSwitched {
        switch_id: SwitchId,
        description: String,
        date: NaiveDate,
        amount: i64,
        from_account: AccountRef,
        to_account: AccountRef,
        reversal: bool,
    },
    /// A transaction handed over by an integrated module (procurement, HR,
    /// sales) with both accounts already resolved.
    IntegrationReceived {
        module: String,
        reference: String,
        description: String,
        date: NaiveDate,
        amount: i64,
        debit_account: AccountRef,
        credit_account: AccountRef,
    },
}

impl FinancialEvent {
    /// Deterministic journal reference for this event.
    pub fn reference(&self) -> String {
        match self {
            FinancialEvent::ExpensePaid { reference, .. } => format!("EXP-{reference}"),
            FinancialEvent::IncomeConfirmed { reference, .. } => format!("INC-{reference}"),
            FinancialEvent::AssetDepreciated {
                asset_number, date, ..
            } => format!("DEP-{}-{}", asset_number, date.format("%Y-%m-%d")),
            FinancialEvent::AssetDisposed { asset_number, .. } => format!("DISP-{asset_number}"),
            FinancialEvent::BalanceSwitched {
                switch_id, reversal, ..
            } => {
                if *reversal {
                    format!("SWI-{switch_id}-REV")
                } else {
                    format!("SWI-{switch_id}")
                }
            }
            FinancialEvent::IntegrationReceived {
                module, reference, ..
            } => format!("{module}-{reference}"),
        }
    }

    /// Check the event's own preconditions (amounts, account kinds).
    pub fn validate(&self) -> DomainResult<()> {
        match self {
            FinancialEvent::ExpensePaid {
                reference,
                amount,
                expense_account,
                cash_account,
                ..
            } => {
                ensure_reference(reference)?;
                ensure_positive(*amount, "expense amount")?;
                ensure_kind(expense_account, AccountKind::Expense, "expense account")?;
                ensure_kind(cash_account, AccountKind::Asset, "cash account")
            }
            FinancialEvent::IncomeConfirmed {
                reference,
                amount,
                revenue_account,
                cash_account,
                ..
            } => {
                ensure_reference(reference)?;
                ensure_positive(*amount, "income amount")?;
                ensure_kind(revenue_account, AccountKind::Revenue, "revenue account")?;
                ensure_kind(cash_account, AccountKind::Asset, "cash account")
            }
            FinancialEvent::AssetDepreciated {
                asset_number,
                amount,
                depreciation_account,
                accumulated_depreciation_account,
                ..
            } => {
                ensure_reference(asset_number)?;
                ensure_positive(*amount, "depreciation amount")?;
                ensure_kind(
                    depreciation_account,
                    AccountKind::Expense,
                    "depreciation account",
                )?;
                ensure_kind(
                    accumulated_depreciation_account,
                    AccountKind::Asset,
                    "accumulated depreciation account",
                )
            }
            FinancialEvent::AssetDisposed {
                asset_number,
                sale_price,
                costs_of_disposal,
                purchase_cost,
                book_value,
                cash_account,
                asset_account,
                accumulated_depreciation_account,
                gain_account,
                loss_account,
                ..
            } => {
                ensure_reference(asset_number)?;
                ensure_positive(*purchase_cost, "purchase cost")?;
                if *sale_price < 0 {
                    return Err(DomainError::validation("sale price cannot be negative"));
                }
                if *costs_of_disposal < 0 {
                    return Err(DomainError::validation(
                        "costs of disposal cannot be negative",
                    ));
                }
                if *book_value < 0 || book_value > purchase_cost {
                    return Err(DomainError::validation(
                        "book value must be between zero and purchase cost",
                    ));
                }
                ensure_kind(cash_account, AccountKind::Asset, "cash account")?;
                ensure_kind(asset_account, AccountKind::Asset, "asset account")?;
                ensure_kind(
                    accumulated_depreciation_account,
                    AccountKind::Asset,
                    "accumulated depreciation account",
                )?;
                ensure_kind(gain_account, AccountKind::Revenue, "disposal gain account")?;
                ensure_kind(loss_account, AccountKind::Expense, "disposal loss account")
            }
            FinancialEvent::BalanceSwitched {
                amount,
                from_account,
                to_account,
                ..
            } => {
                ensure_positive(*amount, "switch amount")?;
                if from_account.account_id == to_account.account_id {
                    return Err(DomainError::validation(
                        "cannot switch balance to the same account",
                    ));
                }
                Ok(())
            }
            FinancialEvent::IntegrationReceived {
                module,
                reference,
                amount,
                debit_account,
                credit_account,
                ..
            } => {
                if module.trim().is_empty() {
                    return Err(DomainError::validation("integration module must be named"));
                }
                ensure_reference(reference)?;
                ensure_positive(*amount, "transaction amount")?;
                if debit_account.account_id == credit_account.account_id {
                    return Err(DomainError::validation(
                        "debit and credit accounts must differ",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Build the balanced entry draft that books this event.
    pub fn entry_draft(&self) -> DomainResult<EntryDraft> {
        self.validate()?;

        let draft = match self {
            FinancialEvent::ExpensePaid {
                description,
                date,
                amount,
                expense_account,
                cash_account,
                ..
            } => EntryDraft::two_line(
                *date,
                self.reference(),
                format!("Payment for expense: {description}"),
                expense_account.clone(),
                cash_account.clone(),
                *amount,
            ),
            FinancialEvent::IncomeConfirmed {
                description,
                date,
                amount,
                revenue_account,
                cash_account,
                ..
            } => EntryDraft::two_line(
                *date,
                self.reference(),
                format!("Income received: {description}"),
                cash_account.clone(),
                revenue_account.clone(),
                *amount,
            ),
            FinancialEvent::AssetDepreciated {
                asset_name,
                date,
                amount,
                depreciation_account,
                accumulated_depreciation_account,
                ..
            } => EntryDraft::two_line(
                *date,
                self.reference(),
                format!("Depreciation of {asset_name}"),
                depreciation_account.clone(),
                accumulated_depreciation_account.clone(),
                *amount,
            ),
            FinancialEvent::BalanceSwitched {
                description,
                date,
                amount,
                from_account,
                to_account,
                reversal,
                ..
            } => {
                // The mirror entry swaps the sides of the original.
                let (debit, credit) = if *reversal {
                    (from_account.clone(), to_account.clone())
                } else {
                    (to_account.clone(), from_account.clone())
                };
                EntryDraft::two_line(
                    *date,
                    self.reference(),
                    description.clone(),
                    debit,
                    credit,
                    *amount,
                )
            }
            FinancialEvent::IntegrationReceived {
                description,
                date,
                amount,
                debit_account,
                credit_account,
                ..
            } => EntryDraft::two_line(
                *date,
                self.reference(),
                description.clone(),
                debit_account.clone(),
                credit_account.clone(),
                *amount,
            ),
            FinancialEvent::AssetDisposed {
                asset_name,
                date,
                sale_price,
                costs_of_disposal,
                purchase_cost,
                book_value,
                cash_account,
                asset_account,
                accumulated_depreciation_account,
                gain_account,
                loss_account,
                ..
            } => {
                let description = format!("Disposal of {asset_name}");
                let mut draft = EntryDraft::new(*date, self.reference(), description.clone());

                if *sale_price > 0 {
                    draft.push(
                        cash_account.clone(),
                        LineSide::Debit,
                        *sale_price,
                        format!("Sale proceeds: {asset_name}"),
                    );
                }
                if *costs_of_disposal > 0 {
                    draft.push(
                        cash_account.clone(),
                        LineSide::Credit,
                        *costs_of_disposal,
                        format!("Costs of disposal: {asset_name}"),
                    );
                }

                // Remove the asset at original cost and recover accumulated
                // depreciation.
                draft.push(
                    asset_account.clone(),
                    LineSide::Credit,
                    *purchase_cost,
                    description.clone(),
                );
                let accumulated = purchase_cost - book_value;
                if accumulated > 0 {
                    draft.push(
                        accumulated_depreciation_account.clone(),
                        LineSide::Debit,
                        accumulated,
                        description.clone(),
                    );
                }

                let gain_loss = (sale_price - costs_of_disposal) - book_value;
                if gain_loss > 0 {
                    draft.push(
                        gain_account.clone(),
                        LineSide::Credit,
                        gain_loss,
                        format!("Gain on disposal of {asset_name}"),
                    );
                } else if gain_loss < 0 {
                    draft.push(
                        loss_account.clone(),
                        LineSide::Debit,
                        -gain_loss,
                        format!("Loss on disposal of {asset_name}"),
                    );
                }

                draft
            }
        };

        Ok(draft)
    }
}

fn ensure_positive(amount: i64, what: &str) -> DomainResult<()> {
    if amount <= 0 {
        return Err(DomainError::validation(format!("{what} must be positive")));
    }
    Ok(())
}

fn ensure_reference(reference: &str) -> DomainResult<()> {
    if reference.trim().is_empty() {
        return Err(DomainError::validation("reference must not be empty"));
    }
    Ok(())
}

fn ensure_kind(account: &AccountRef, kind: AccountKind, what: &str) -> DomainResult<()> {
    if account.kind != kind {
        let kind_name = match kind {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Revenue => "revenue",
            AccountKind::Expense => "expense",
        };
        return Err(DomainError::validation(format!(
            "{what} must be an {kind_name} account"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_accounts::AccountId;
    use ledgerly_core::AggregateId;
    use proptest::prelude::*;

    fn test_account(code: &str, kind: AccountKind) -> AccountRef {
        AccountRef {
            account_id: AccountId::new(AggregateId::new()),
            code: code.to_string(),
            name: code.to_string(),
            kind,
        }
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn expense_paid(amount: i64) -> FinancialEvent {
        FinancialEvent::ExpensePaid {
            reference: "2024-001".to_string(),
            description: "travel".to_string(),
            date: test_date(),
            amount,
            expense_account: test_account("5000", AccountKind::Expense),
            cash_account: test_account("1001", AccountKind::Asset),
        }
    }

    fn disposal(
        sale_price: i64,
        costs_of_disposal: i64,
        purchase_cost: i64,
        book_value: i64,
    ) -> FinancialEvent {
        FinancialEvent::AssetDisposed {
            asset_number: "FA-0007".to_string(),
            asset_name: "delivery van".to_string(),
            date: test_date(),
            sale_price,
            costs_of_disposal,
            purchase_cost,
            book_value,
            cash_account: test_account("1001", AccountKind::Asset),
            asset_account: test_account("1500", AccountKind::Asset),
            accumulated_depreciation_account: test_account("1510", AccountKind::Asset),
            gain_account: test_account("8001", AccountKind::Revenue),
            loss_account: test_account("8002", AccountKind::Expense),
        }
    }

    #[test]
    fn expense_payment_books_two_balanced_lines() {
        let event = expense_paid(25_000);
        assert_eq!(event.reference(), "EXP-2024-001");
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.imbalance(), 0);
        assert_eq!(draft.lines[0].side, LineSide::Debit);
        assert_eq!(draft.lines[0].account.kind, AccountKind::Expense);
    }

    #[test]
    fn wrong_cash_kind_is_rejected() {
        let event = FinancialEvent::ExpensePaid {
            reference: "X-1".to_string(),
            description: String::new(),
            date: test_date(),
            amount: 100,
            expense_account: test_account("5000", AccountKind::Expense),
            cash_account: test_account("2000", AccountKind::Liability),
        };
        let err = event.entry_draft().unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("cash account") => {}
            _ => panic!("Expected Validation error for cash account kind"),
        }
    }

    #[test]
    fn income_confirmation_debits_cash() {
        let event = FinancialEvent::IncomeConfirmed {
            reference: "R-9".to_string(),
            description: "consulting".to_string(),
            date: test_date(),
            amount: 40_000,
            revenue_account: test_account("4000", AccountKind::Revenue),
            cash_account: test_account("1001", AccountKind::Asset),
        };
        assert_eq!(event.reference(), "INC-R-9");
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.lines[0].account.kind, AccountKind::Asset);
        assert_eq!(draft.lines[0].side, LineSide::Debit);
        assert_eq!(draft.imbalance(), 0);
    }

    #[test]
    fn depreciation_reference_embeds_asset_and_date() {
        let event = FinancialEvent::AssetDepreciated {
            asset_number: "FA-0007".to_string(),
            asset_name: "delivery van".to_string(),
            date: test_date(),
            amount: 5_000,
            depreciation_account: test_account("5100", AccountKind::Expense),
            accumulated_depreciation_account: test_account("1510", AccountKind::Asset),
        };
        assert_eq!(event.reference(), "DEP-FA-0007-2024-06-30");
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.imbalance(), 0);
    }

    #[test]
    fn disposal_at_a_gain_credits_the_gain_account() {
        // Book value 30_000, net proceeds 45_000 - 5_000 = 40_000, gain 10_000.
        let event = disposal(45_000, 5_000, 100_000, 30_000);
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.imbalance(), 0);

        let gain_line = draft
            .lines
            .iter()
            .find(|l| l.account.code == "8001")
            .expect("gain line");
        assert_eq!(gain_line.side, LineSide::Credit);
        assert_eq!(gain_line.amount, 10_000);
        // Accumulated depreciation recovered: 100_000 - 30_000.
        let accum_line = draft
            .lines
            .iter()
            .find(|l| l.account.code == "1510")
            .expect("accumulated depreciation line");
        assert_eq!(accum_line.amount, 70_000);
    }

    #[test]
    fn disposal_at_a_loss_debits_the_loss_account() {
        // Book value 50_000, net proceeds 20_000, loss 30_000.
        let event = disposal(20_000, 0, 80_000, 50_000);
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.imbalance(), 0);

        let loss_line = draft
            .lines
            .iter()
            .find(|l| l.account.code == "8002")
            .expect("loss line");
        assert_eq!(loss_line.side, LineSide::Debit);
        assert_eq!(loss_line.amount, 30_000);
    }

    #[test]
    fn disposal_with_no_proceeds_still_balances() {
        let event = disposal(0, 0, 80_000, 50_000);
        let draft = event.entry_draft().unwrap();
        assert_eq!(draft.imbalance(), 0);
        assert!(draft.lines.len() >= 2);
    }

    #[test]
    fn switch_reversal_mirrors_the_original() {
        let from = test_account("1001", AccountKind::Asset);
        let to = test_account("1002", AccountKind::Asset);
        let switch_id = SwitchId::new(AggregateId::new());

        let original = FinancialEvent::BalanceSwitched {
            switch_id,
            description: "rebalance".to_string(),
            date: test_date(),
            amount: 5_000,
            from_account: from.clone(),
            to_account: to.clone(),
            reversal: false,
        };
        let reversal = FinancialEvent::BalanceSwitched {
            switch_id,
            description: "rebalance".to_string(),
            date: test_date(),
            amount: 5_000,
            from_account: from.clone(),
            to_account: to.clone(),
            reversal: true,
        };

        let a = original.entry_draft().unwrap();
        let b = reversal.entry_draft().unwrap();
        assert!(reversal.reference().ends_with("-REV"));

        // Original debits the destination; the mirror debits the source.
        assert_eq!(a.lines[0].account.account_id, to.account_id);
        assert_eq!(b.lines[0].account.account_id, from.account_id);
        assert_eq!(a.imbalance(), 0);
        assert_eq!(b.imbalance(), 0);
    }

    proptest! {
        /// Property: disposal entries balance for every combination of
        /// proceeds, costs and remaining book value.
        #[test]
        fn disposal_always_balances(
            sale_price in 0i64..200_000,
            costs in 0i64..50_000,
            purchase_cost in 1i64..500_000,
            book_value_frac in 0u8..=100,
        ) {
            let book_value = purchase_cost * (book_value_frac as i64) / 100;
            let event = disposal(sale_price, costs, purchase_cost, book_value);
            let draft = event.entry_draft().unwrap();
            prop_assert_eq!(draft.imbalance(), 0);
            prop_assert!(draft.lines.len() >= 2);
        }
    }
}
