//! Budget planning: per-account amounts across the periods of a fiscal
//! year, with a one-way approval lifecycle.

pub mod budget;

pub use budget::{
    ActivateBudget, ApproveBudget, Budget, BudgetCommand, BudgetEvent, BudgetId, BudgetItem,
    BudgetPeriod, BudgetStatus, CloseBudget, CreateBudget, RemoveBudgetItem, SetBudgetItem,
};
