use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_accounts::ChartConfig;
use ledgerly_core::{DomainError, DomainResult};

/// What a procurement transaction bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcurementItemType {
    Inventory,
    FixedAsset,
}

/// What a payroll transaction pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollPaymentType {
    Salary,
    Overtime,
    Bonus,
    Commission,
}

/// How a sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesPaymentMethod {
    Cash,
    Credit,
}

/// Which module a transaction came from, with the detail that picks its
/// accounts. Adding a module means adding a variant and a row in the
/// lookup, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum TransactionSource {
    Procurement { item_type: ProcurementItemType },
    Payroll { payment_type: PayrollPaymentType },
    Sales { payment_method: SalesPaymentMethod },
}

impl TransactionSource {
    /// Short module code used as the journal reference prefix.
    pub fn module_code(&self) -> &'static str {
        match self {
            TransactionSource::Procurement { .. } => "PROC",
            TransactionSource::Payroll { .. } => "HR",
            TransactionSource::Sales { .. } => "SALES",
        }
    }

    /// Chart codes to debit and credit for this source.
    pub fn entry_codes<'a>(&self, chart: &'a ChartConfig) -> (&'a str, &'a str) {
        match self {
            TransactionSource::Procurement { item_type } => {
                let debit = match item_type {
                    ProcurementItemType::Inventory => &chart.inventory,
                    ProcurementItemType::FixedAsset => &chart.fixed_assets,
                };
                (debit, &chart.accounts_payable)
            }
            TransactionSource::Payroll { payment_type } => {
                let debit = match payment_type {
                    PayrollPaymentType::Salary => &chart.salary_expense,
                    PayrollPaymentType::Overtime => &chart.overtime_expense,
                    PayrollPaymentType::Bonus => &chart.bonus_expense,
                    PayrollPaymentType::Commission => &chart.commission_expense,
                };
                (debit, &chart.payroll_payable)
            }
            TransactionSource::Sales { payment_method } => {
                let debit = match payment_method {
                    SalesPaymentMethod::Cash => &chart.cash,
                    SalesPaymentMethod::Credit => &chart.accounts_receivable,
                };
                (debit, &chart.sales_revenue)
            }
        }
    }
}

/// A transaction handed over by an integrated module, before account
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub source: TransactionSource,
    pub date: NaiveDate,
    pub reference: String,
    pub description: String,
    /// Minor units, always positive.
    pub amount: i64,
}

impl TransactionRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.reference.trim().is_empty() {
            return Err(DomainError::validation(
                "transaction reference must not be empty",
            ));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation(
                "transaction description must not be empty",
            ));
        }
        if self.amount <= 0 {
            return Err(DomainError::validation(
                "transaction amount must be positive",
            ));
        }
        Ok(())
    }

    /// Deterministic journal reference, e.g. `HR-PAY-2024-03`.
    pub fn journal_reference(&self) -> String {
        format!("{}-{}", self.source.module_code(), self.reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: TransactionSource) -> TransactionRequest {
        TransactionRequest {
            source,
            date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            reference: "2024-03".to_string(),
            description: "monthly run".to_string(),
            amount: 100_000,
        }
    }

    #[test]
    fn procurement_debits_inventory_or_fixed_assets() {
        let chart = ChartConfig::default();

        let source = TransactionSource::Procurement {
            item_type: ProcurementItemType::Inventory,
        };
        assert_eq!(source.entry_codes(&chart), ("1200", "2000"));

        let source = TransactionSource::Procurement {
            item_type: ProcurementItemType::FixedAsset,
        };
        assert_eq!(source.entry_codes(&chart), ("1500", "2000"));
    }

    #[test]
    fn payroll_picks_the_matching_expense_account() {
        let chart = ChartConfig::default();

        let cases = [
            (PayrollPaymentType::Salary, "5000"),
            (PayrollPaymentType::Overtime, "5001"),
            (PayrollPaymentType::Bonus, "5002"),
            (PayrollPaymentType::Commission, "5003"),
        ];
        for (payment_type, expected) in cases {
            let source = TransactionSource::Payroll { payment_type };
            assert_eq!(source.entry_codes(&chart), (expected, "2001"));
        }
    }

    #[test]
    fn sales_routes_by_payment_method() {
        let chart = ChartConfig::default();

        let source = TransactionSource::Sales {
            payment_method: SalesPaymentMethod::Cash,
        };
        assert_eq!(source.entry_codes(&chart), ("1001", "4000"));

        let source = TransactionSource::Sales {
            payment_method: SalesPaymentMethod::Credit,
        };
        assert_eq!(source.entry_codes(&chart), ("1100", "4000"));
    }

    #[test]
    fn reference_carries_the_module_prefix() {
        let req = request(TransactionSource::Payroll {
            payment_type: PayrollPaymentType::Salary,
        });
        assert_eq!(req.journal_reference(), "HR-2024-03");

        let req = request(TransactionSource::Sales {
            payment_method: SalesPaymentMethod::Cash,
        });
        assert_eq!(req.journal_reference(), "SALES-2024-03");
    }

    #[test]
    fn blank_reference_is_rejected() {
        let mut req = request(TransactionSource::Procurement {
            item_type: ProcurementItemType::Inventory,
        });
        req.reference = " ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn source_serializes_with_a_module_tag() {
        let source = TransactionSource::Procurement {
            item_type: ProcurementItemType::FixedAsset,
        };
        let json = serde_json::to_string(&source).unwrap();
        assert_eq!(json, r#"{"module":"procurement","item_type":"fixed_asset"}"#);
    }
}
