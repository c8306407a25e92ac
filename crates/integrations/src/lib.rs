//! Transactions handed over by sibling modules (procurement, payroll,
//! sales), mapped to chart accounts by lookup rather than per-module code.

pub mod request;

pub use request::{
    PayrollPaymentType, ProcurementItemType, SalesPaymentMethod, TransactionRequest,
    TransactionSource,
};
