//! Expense management: categories with approval policy and the expense
//! lifecycle from draft through payment.

pub mod category;
pub mod expense;

pub use category::{ExpenseCategory, ExpenseCategoryId};
pub use expense::{
    ApproveExpense, CancelExpense, CreateExpense, Expense, ExpenseCommand, ExpenseEvent,
    ExpenseId, ExpenseStatus, MarkExpensePaid, RejectExpense, SubmitExpense,
};
