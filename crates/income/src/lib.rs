//! Income management: revenue categories and the income lifecycle from
//! draft to confirmation.

pub mod category;
pub mod income;

pub use category::{IncomeCategory, IncomeCategoryId};
pub use income::{
    CancelIncome, ConfirmIncome, CreateIncome, Income, IncomeCommand, IncomeEvent, IncomeId,
    IncomeStatus,
};
