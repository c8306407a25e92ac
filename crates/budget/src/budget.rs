use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_accounts::AccountId;
use ledgerly_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::Event;

/// Budget identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetId(pub AggregateId);

impl BudgetId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for BudgetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Granularity of the budget periods within the fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Monthly,
    Quarterly,
    Annual,
}

impl BudgetPeriod {
    pub fn max_period_num(self) -> u32 {
        match self {
            BudgetPeriod::Monthly => 12,
            BudgetPeriod::Quarterly => 4,
            BudgetPeriod::Annual => 1,
        }
    }
}

/// Budget status lifecycle, strictly one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Draft,
    Approved,
    Active,
    Closed,
}

/// One budgeted amount: an account in one period of the year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub account_id: AccountId,
    pub period_num: u32,
    pub amount: i64,
}

/// Aggregate root: Budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Budget {
    id: BudgetId,
    scope: Option<Scope>,
    name: String,
    fiscal_year: i32,
    period: BudgetPeriod,
    status: BudgetStatus,
    items: Vec<BudgetItem>,
    version: u64,
    created: bool,
}

impl Budget {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: BudgetId) -> Self {
        Self {
            id,
            scope: None,
            name: String::new(),
            fiscal_year: 0,
            period: BudgetPeriod::Annual,
            status: BudgetStatus::Draft,
            items: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> BudgetId {
        self.id
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    pub fn period(&self) -> BudgetPeriod {
        self.period
    }

    pub fn status(&self) -> BudgetStatus {
        self.status
    }

    pub fn items(&self) -> &[BudgetItem] {
        &self.items
    }

    /// The budgeted amount for an account in one period, if set.
    pub fn item_amount(&self, account_id: AccountId, period_num: u32) -> Option<i64> {
        self.items
            .iter()
            .find(|item| item.account_id == account_id && item.period_num == period_num)
            .map(|item| item.amount)
    }

    /// Total budgeted across all periods and accounts.
    pub fn total_amount(&self) -> i64 {
        self.items.iter().map(|item| item.amount).sum()
    }
}

impl AggregateRoot for Budget {
    type Id = BudgetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateBudget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBudget {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub name: String,
    pub fiscal_year: i32,
    pub period: BudgetPeriod,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetBudgetItem (upsert; draft only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBudgetItem {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub account_id: AccountId,
    pub period_num: u32,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveBudgetItem (draft only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveBudgetItem {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub account_id: AccountId,
    pub period_num: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveBudget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveBudget {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateBudget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateBudget {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseBudget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseBudget {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetCommand {
    CreateBudget(CreateBudget),
    SetBudgetItem(SetBudgetItem),
    RemoveBudgetItem(RemoveBudgetItem),
    ApproveBudget(ApproveBudget),
    ActivateBudget(ActivateBudget),
    CloseBudget(CloseBudget),
}

/// Event: BudgetCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCreated {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub name: String,
    pub fiscal_year: i32,
    pub period: BudgetPeriod,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BudgetItemSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemSet {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub account_id: AccountId,
    pub period_num: u32,
    pub amount: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BudgetItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetItemRemoved {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub account_id: AccountId,
    pub period_num: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BudgetApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetApproved {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BudgetActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetActivated {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BudgetClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetClosed {
    pub scope: Scope,
    pub budget_id: BudgetId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetEvent {
    BudgetCreated(BudgetCreated),
    BudgetItemSet(BudgetItemSet),
    BudgetItemRemoved(BudgetItemRemoved),
    BudgetApproved(BudgetApproved),
    BudgetActivated(BudgetActivated),
    BudgetClosed(BudgetClosed),
}

impl Event for BudgetEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BudgetEvent::BudgetCreated(_) => "budget.created",
            BudgetEvent::BudgetItemSet(_) => "budget.item_set",
            BudgetEvent::BudgetItemRemoved(_) => "budget.item_removed",
            BudgetEvent::BudgetApproved(_) => "budget.approved",
            BudgetEvent::BudgetActivated(_) => "budget.activated",
            BudgetEvent::BudgetClosed(_) => "budget.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BudgetEvent::BudgetCreated(e) => e.occurred_at,
            BudgetEvent::BudgetItemSet(e) => e.occurred_at,
            BudgetEvent::BudgetItemRemoved(e) => e.occurred_at,
            BudgetEvent::BudgetApproved(e) => e.occurred_at,
            BudgetEvent::BudgetActivated(e) => e.occurred_at,
            BudgetEvent::BudgetClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Budget {
    type Command = BudgetCommand;
    type Event = BudgetEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            BudgetEvent::BudgetCreated(e) => {
                self.id = e.budget_id;
                self.scope = Some(e.scope);
                self.name = e.name.clone();
                self.fiscal_year = e.fiscal_year;
                self.period = e.period;
                self.status = BudgetStatus::Draft;
                self.items.clear();
                self.created = true;
            }
            BudgetEvent::BudgetItemSet(e) => {
                let slot = self
                    .items
                    .iter_mut()
                    .find(|item| item.account_id == e.account_id && item.period_num == e.period_num);
                match slot {
                    Some(item) => item.amount = e.amount,
                    None => self.items.push(BudgetItem {
                        account_id: e.account_id,
                        period_num: e.period_num,
                        amount: e.amount,
                    }),
                }
            }
            BudgetEvent::BudgetItemRemoved(e) => {
                self.items
                    .retain(|item| !(item.account_id == e.account_id && item.period_num == e.period_num));
            }
            BudgetEvent::BudgetApproved(_) => {
                self.status = BudgetStatus::Approved;
            }
            BudgetEvent::BudgetActivated(_) => {
                self.status = BudgetStatus::Active;
            }
            BudgetEvent::BudgetClosed(_) => {
                self.status = BudgetStatus::Closed;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            BudgetCommand::CreateBudget(cmd) => self.handle_create(cmd),
            BudgetCommand::SetBudgetItem(cmd) => self.handle_set_item(cmd),
            BudgetCommand::RemoveBudgetItem(cmd) => self.handle_remove_item(cmd),
            BudgetCommand::ApproveBudget(cmd) => self.handle_approve(cmd),
            BudgetCommand::ActivateBudget(cmd) => self.handle_activate(cmd),
            BudgetCommand::CloseBudget(cmd) => self.handle_close(cmd),
        }
    }
}

impl Budget {
    fn ensure_scope(&self, scope: Scope) -> Result<(), DomainError> {
        match self.scope {
            Some(own) => own.ensure_same(&scope, "budget"),
            None => Ok(()),
        }
    }

    fn ensure_budget_id(&self, budget_id: BudgetId) -> Result<(), DomainError> {
        if self.id != budget_id {
            return Err(DomainError::validation("budget_id mismatch"));
        }
        Ok(())
    }

    fn ensure_draft(&self) -> Result<(), DomainError> {
        if self.status != BudgetStatus::Draft {
            return Err(DomainError::invalid_state(
                "budget items can only be edited in draft",
            ));
        }
        Ok(())
    }

    fn ensure_period_num(&self, period_num: u32) -> Result<(), DomainError> {
        let max = self.period.max_period_num();
        if period_num == 0 || period_num > max {
            return Err(DomainError::validation(format!(
                "period number must be between 1 and {max}"
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateBudget) -> Result<Vec<BudgetEvent>, DomainError> {
        if self.created {
            return Err(DomainError::integrity("budget already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("budget name must not be empty"));
        }

        Ok(vec![BudgetEvent::BudgetCreated(BudgetCreated {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            name: cmd.name.clone(),
            fiscal_year: cmd.fiscal_year,
            period: cmd.period,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_item(&self, cmd: &SetBudgetItem) -> Result<Vec<BudgetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_budget_id(cmd.budget_id)?;
        self.ensure_draft()?;
        self.ensure_period_num(cmd.period_num)?;

        if cmd.amount <= 0 {
            return Err(DomainError::validation(
                "budgeted amount must be positive",
            ));
        }

        Ok(vec![BudgetEvent::BudgetItemSet(BudgetItemSet {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            account_id: cmd.account_id,
            period_num: cmd.period_num,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveBudgetItem) -> Result<Vec<BudgetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_budget_id(cmd.budget_id)?;
        self.ensure_draft()?;

        if self.item_amount(cmd.account_id, cmd.period_num).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![BudgetEvent::BudgetItemRemoved(BudgetItemRemoved {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            account_id: cmd.account_id,
            period_num: cmd.period_num,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveBudget) -> Result<Vec<BudgetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_budget_id(cmd.budget_id)?;

        if self.status != BudgetStatus::Draft {
            return Err(DomainError::invalid_state(
                "only draft budgets can be approved",
            ));
        }
        if self.items.is_empty() {
            return Err(DomainError::validation("cannot approve an empty budget"));
        }

        Ok(vec![BudgetEvent::BudgetApproved(BudgetApproved {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            approved_by: cmd.approved_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateBudget) -> Result<Vec<BudgetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_budget_id(cmd.budget_id)?;

        if self.status != BudgetStatus::Approved {
            return Err(DomainError::invalid_state(
                "only approved budgets can be activated",
            ));
        }

        Ok(vec![BudgetEvent::BudgetActivated(BudgetActivated {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_close(&self, cmd: &CloseBudget) -> Result<Vec<BudgetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_budget_id(cmd.budget_id)?;

        if self.status != BudgetStatus::Active {
            return Err(DomainError::invalid_state(
                "only active budgets can be closed",
            ));
        }

        Ok(vec![BudgetEvent::BudgetClosed(BudgetClosed {
            scope: cmd.scope,
            budget_id: cmd.budget_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::{BranchId, TenantId};

    fn test_scope() -> Scope {
        Scope::new(TenantId::new(), BranchId::new())
    }

    fn test_budget_id() -> BudgetId {
        BudgetId::new(AggregateId::new())
    }

    fn test_account_id() -> AccountId {
        AccountId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_budget(scope: Scope, period: BudgetPeriod) -> Budget {
        let budget_id = test_budget_id();
        let mut budget = Budget::empty(budget_id);
        let cmd = CreateBudget {
            scope,
            budget_id,
            name: "FY2025 operating".to_string(),
            fiscal_year: 2025,
            period,
            created_by: UserId::new(),
            occurred_at: test_time(),
        };
        let events = budget.handle(&BudgetCommand::CreateBudget(cmd)).unwrap();
        for event in &events {
            budget.apply(event);
        }
        budget
    }

    fn set_item(budget: &mut Budget, scope: Scope, account_id: AccountId, period_num: u32, amount: i64) {
        let cmd = SetBudgetItem {
            scope,
            budget_id: budget.id_typed(),
            account_id,
            period_num,
            amount,
            occurred_at: test_time(),
        };
        let events = budget.handle(&BudgetCommand::SetBudgetItem(cmd)).unwrap();
        for event in &events {
            budget.apply(event);
        }
    }

    #[test]
    fn set_item_upserts_per_account_and_period() {
        let scope = test_scope();
        let mut budget = created_budget(scope, BudgetPeriod::Monthly);
        let account_id = test_account_id();

        set_item(&mut budget, scope, account_id, 1, 10_000);
        set_item(&mut budget, scope, account_id, 2, 12_000);
        set_item(&mut budget, scope, account_id, 1, 11_000);

        assert_eq!(budget.items().len(), 2);
        assert_eq!(budget.item_amount(account_id, 1), Some(11_000));
        assert_eq!(budget.total_amount(), 23_000);
    }

    #[test]
    fn period_number_is_bounded_by_granularity() {
        let scope = test_scope();
        let budget = created_budget(scope, BudgetPeriod::Quarterly);

        let cmd = SetBudgetItem {
            scope,
            budget_id: budget.id_typed(),
            account_id: test_account_id(),
            period_num: 5,
            amount: 10_000,
            occurred_at: test_time(),
        };
        let err = budget
            .handle(&BudgetCommand::SetBudgetItem(cmd))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("between 1 and 4") => {}
            _ => panic!("Expected Validation error for out-of-range period"),
        }
    }

    #[test]
    fn items_are_frozen_after_approval() {
        let scope = test_scope();
        let mut budget = created_budget(scope, BudgetPeriod::Annual);
        set_item(&mut budget, scope, test_account_id(), 1, 50_000);

        let approve = ApproveBudget {
            scope,
            budget_id: budget.id_typed(),
            approved_by: UserId::new(),
            occurred_at: test_time(),
        };
        let events = budget.handle(&BudgetCommand::ApproveBudget(approve)).unwrap();
        budget.apply(&events[0]);
        assert_eq!(budget.status(), BudgetStatus::Approved);

        let cmd = SetBudgetItem {
            scope,
            budget_id: budget.id_typed(),
            account_id: test_account_id(),
            period_num: 1,
            amount: 1,
            occurred_at: test_time(),
        };
        let err = budget
            .handle(&BudgetCommand::SetBudgetItem(cmd))
            .unwrap_err();
        match err {
            DomainError::InvalidState(msg) if msg.contains("draft") => {}
            _ => panic!("Expected InvalidState error for editing an approved budget"),
        }
    }

    #[test]
    fn empty_budget_cannot_be_approved() {
        let scope = test_scope();
        let budget = created_budget(scope, BudgetPeriod::Monthly);

        let cmd = ApproveBudget {
            scope,
            budget_id: budget.id_typed(),
            approved_by: UserId::new(),
            occurred_at: test_time(),
        };
        let err = budget
            .handle(&BudgetCommand::ApproveBudget(cmd))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("empty budget") => {}
            _ => panic!("Expected Validation error for approving an empty budget"),
        }
    }

    #[test]
    fn lifecycle_is_one_way() {
        let scope = test_scope();
        let mut budget = created_budget(scope, BudgetPeriod::Monthly);
        set_item(&mut budget, scope, test_account_id(), 3, 10_000);

        // Draft cannot be activated directly.
        let activate = ActivateBudget {
            scope,
            budget_id: budget.id_typed(),
            occurred_at: test_time(),
        };
        assert!(
            budget
                .handle(&BudgetCommand::ActivateBudget(activate.clone()))
                .is_err()
        );

        let approve = ApproveBudget {
            scope,
            budget_id: budget.id_typed(),
            approved_by: UserId::new(),
            occurred_at: test_time(),
        };
        let events = budget.handle(&BudgetCommand::ApproveBudget(approve)).unwrap();
        budget.apply(&events[0]);

        let events = budget
            .handle(&BudgetCommand::ActivateBudget(activate))
            .unwrap();
        budget.apply(&events[0]);
        assert_eq!(budget.status(), BudgetStatus::Active);

        let close = CloseBudget {
            scope,
            budget_id: budget.id_typed(),
            occurred_at: test_time(),
        };
        let events = budget.handle(&BudgetCommand::CloseBudget(close.clone())).unwrap();
        budget.apply(&events[0]);
        assert_eq!(budget.status(), BudgetStatus::Closed);

        // Closed is terminal.
        assert!(budget.handle(&BudgetCommand::CloseBudget(close)).is_err());
    }

    #[test]
    fn removing_a_missing_item_is_not_found() {
        let scope = test_scope();
        let budget = created_budget(scope, BudgetPeriod::Monthly);

        let cmd = RemoveBudgetItem {
            scope,
            budget_id: budget.id_typed(),
            account_id: test_account_id(),
            period_num: 1,
            occurred_at: test_time(),
        };
        let err = budget
            .handle(&BudgetCommand::RemoveBudgetItem(cmd))
            .unwrap_err();
        match err {
            DomainError::NotFound => {}
            _ => panic!("Expected NotFound error for removing a missing item"),
        }
    }
}
