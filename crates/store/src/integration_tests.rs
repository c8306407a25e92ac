//! Integration tests for the full posting pipeline.
//!
//! Tests: Service → LedgerState → EventBus → Projection → ReadModel
//!
//! Verifies:
//! - Posted entries move account balances by the double-entry sign rule
//! - Rejected operations leave committed state untouched
//! - Scope isolation holds end to end
//! - Concurrent writers serialize without losing posts

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use ledgerly_accounts::{Account, AccountId, AccountKind, LineSide, SwitchStatus};
    use ledgerly_assets::{AssetStatus, DepreciationMethod};
    use ledgerly_budget::{BudgetPeriod, BudgetStatus};
    use ledgerly_core::{BranchId, DomainError, Scope, TenantId, UserId};
    use ledgerly_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use ledgerly_expense::ExpenseStatus;
    use ledgerly_income::IncomeStatus;
    use ledgerly_integrations::{ProcurementItemType, TransactionRequest, TransactionSource};
    use ledgerly_journal::EntryStatus;

    use crate::projections::{AccountActivity, AccountActivityProjection};
    use crate::read_model::InMemoryScopedStore;
    use crate::service::{LedgerService, NewEntryLine, StoreError};

    type TestBus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
    type TestStore = Arc<InMemoryScopedStore<String, AccountActivity>>;

    fn test_scope() -> Scope {
        Scope::new(TenantId::new(), BranchId::new())
    }

    fn test_user() -> UserId {
        UserId::new()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn setup() -> (
        LedgerService<TestBus>,
        Arc<AccountActivityProjection<TestStore>>,
    ) {
        ledgerly_observability::init();

        let bus: TestBus = Arc::new(InMemoryEventBus::new());
        let service = LedgerService::new(bus.clone());
        let activity_store: TestStore = Arc::new(InMemoryScopedStore::new());
        let projection = Arc::new(AccountActivityProjection::new(activity_store));

        // Subscribe to the bus BEFORE any events are published
        let projection_clone = projection.clone();
        let bus_clone = bus.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        std::thread::spawn(move || {
            let sub = bus_clone.subscribe();
            let _ = ready_tx.send(());
            loop {
                match sub.recv() {
                    Ok(env) => {
                        if let Err(e) = projection_clone.apply_envelope(&env) {
                            eprintln!("Failed to apply envelope: {:?}", e);
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        // Ensure subscriber is ready before returning (prevents missing early events).
        let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));

        (service, projection)
    }

    /// Helper: Wait a short time for events to be processed.
    /// The subscriber thread processes events synchronously.
    fn wait_for_processing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    /// Helper: category plus account in one call, for tests that only need
    /// somewhere to book to.
    fn seed_account(
        service: &LedgerService<TestBus>,
        scope: Scope,
        code: &str,
        name: &str,
        kind: AccountKind,
        user: UserId,
    ) -> Account {
        let category = service
            .create_account_category(scope, format!("{} accounts", name), kind, "", user)
            .unwrap();
        service
            .create_account(scope, code, name, category.id_typed(), user)
            .unwrap()
    }

    fn line(account_id: AccountId, side: LineSide, amount: i64) -> NewEntryLine {
        NewEntryLine {
            account_id,
            side,
            amount,
            description: String::new(),
        }
    }

    #[test]
    fn posting_a_balanced_entry_updates_account_balances() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let entry = service
            .create_entry(
                scope,
                date(2025, 3, 10),
                "JNL-001",
                "Cash sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 10_000),
                    line(revenue.id_typed(), LineSide::Credit, 10_000),
                ],
                user,
            )
            .unwrap();
        assert_eq!(entry.status(), EntryStatus::Draft);
        assert_eq!(entry.total_amount(), 10_000);

        // Drafts do not touch balances.
        assert_eq!(service.account_by_code(scope, "1001").unwrap().balance(), 0);

        let posted = service.post_entry(scope, entry.id_typed()).unwrap();
        assert_eq!(posted.status(), EntryStatus::Posted);

        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            10_000
        );
        assert_eq!(
            service.account_by_code(scope, "4000").unwrap().balance(),
            10_000
        );

        let fetched = service.entry_by_reference(scope, "JNL-001").unwrap();
        assert_eq!(fetched.id_typed(), entry.id_typed());
        assert_eq!(fetched.status(), EntryStatus::Posted);
    }

    #[test]
    fn an_unbalanced_draft_cannot_be_posted() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        // Drafts may be lopsided while they are being built up.
        let entry = service
            .create_entry(
                scope,
                date(2025, 3, 10),
                "JNL-002",
                "Half-entered sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 10_000),
                    line(revenue.id_typed(), LineSide::Credit, 9_000),
                ],
                user,
            )
            .unwrap();

        let result = service.post_entry(scope, entry.id_typed());
        match result.unwrap_err() {
            StoreError::Domain(DomainError::BalanceMismatch(_)) => {}
            e => panic!("Expected BalanceMismatch, got: {:?}", e),
        }

        // The failed post committed nothing.
        let stored = service.entry(scope, entry.id_typed()).unwrap();
        assert_eq!(stored.status(), EntryStatus::Draft);
        assert_eq!(service.account_by_code(scope, "1001").unwrap().balance(), 0);
    }

    #[test]
    fn an_entry_posts_exactly_once() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let entry = service
            .create_entry(
                scope,
                date(2025, 3, 10),
                "JNL-003",
                "Cash sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 5_000),
                    line(revenue.id_typed(), LineSide::Credit, 5_000),
                ],
                user,
            )
            .unwrap();
        service.post_entry(scope, entry.id_typed()).unwrap();

        let result = service.post_entry(scope, entry.id_typed());
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }

        // The balance moved once, not twice.
        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            5_000
        );
    }

    #[test]
    fn a_posted_entry_cannot_be_cancelled() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let entry = service
            .create_entry(
                scope,
                date(2025, 3, 10),
                "JNL-004",
                "Cash sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 5_000),
                    line(revenue.id_typed(), LineSide::Credit, 5_000),
                ],
                user,
            )
            .unwrap();
        service.post_entry(scope, entry.id_typed()).unwrap();

        let result = service.cancel_entry(scope, entry.id_typed());
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }

        let stored = service.entry(scope, entry.id_typed()).unwrap();
        assert_eq!(stored.status(), EntryStatus::Posted);
    }

    #[test]
    fn duplicate_journal_references_are_rejected() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let lines = vec![
            line(cash.id_typed(), LineSide::Debit, 5_000),
            line(revenue.id_typed(), LineSide::Credit, 5_000),
        ];
        service
            .create_entry(scope, date(2025, 3, 10), "JNL-100", "First", lines.clone(), user)
            .unwrap();

        let result = service.create_entry(scope, date(2025, 3, 11), "JNL-100", "Second", lines, user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::Integrity(_)) => {}
            e => panic!("Expected Integrity, got: {:?}", e),
        }

        // Account codes are unique per scope as well.
        let result = service.create_account(scope, "1001", "Cash again", cash.category_id(), user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::Integrity(_)) => {}
            e => panic!("Expected Integrity, got: {:?}", e),
        }
    }

    #[test]
    fn replacing_lines_reshapes_a_draft() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let receivable = seed_account(
            &service,
            scope,
            "1100",
            "Accounts Receivable",
            AccountKind::Asset,
            user,
        );
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let entry = service
            .create_entry(
                scope,
                date(2025, 3, 10),
                "JNL-005",
                "Mixed sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 10_000),
                    line(revenue.id_typed(), LineSide::Credit, 10_000),
                ],
                user,
            )
            .unwrap();

        // Part of the sale turns out to be on credit.
        let reshaped = service
            .replace_entry_lines(
                scope,
                entry.id_typed(),
                vec![
                    line(cash.id_typed(), LineSide::Debit, 4_000),
                    line(receivable.id_typed(), LineSide::Debit, 6_000),
                    line(revenue.id_typed(), LineSide::Credit, 10_000),
                ],
            )
            .unwrap();
        assert_eq!(reshaped.lines().len(), 3);
        assert_eq!(reshaped.total_amount(), 10_000);

        service.post_entry(scope, entry.id_typed()).unwrap();
        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            4_000
        );
        assert_eq!(
            service.account_by_code(scope, "1100").unwrap().balance(),
            6_000
        );
        assert_eq!(
            service.account_by_code(scope, "4000").unwrap().balance(),
            10_000
        );
    }

    #[test]
    fn a_draft_expense_cannot_be_paid() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let office = seed_account(
            &service,
            scope,
            "5100",
            "Office Supplies",
            AccountKind::Expense,
            user,
        );

        let category = service
            .create_expense_category(scope, "Office", "", office.id_typed(), true, None, user)
            .unwrap();
        let expense = service
            .create_expense(
                scope,
                category.id_typed(),
                "OFF-1",
                "Printer paper",
                7_500,
                date(2025, 4, 2),
                user,
            )
            .unwrap();
        assert_eq!(expense.status(), ExpenseStatus::Draft);

        let result = service.pay_expense(scope, expense.id_typed(), date(2025, 4, 3), user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }
        assert_eq!(service.account_by_code(scope, "1001").unwrap().balance(), 0);
    }

    #[test]
    fn the_expense_lifecycle_books_the_payment() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let office = seed_account(
            &service,
            scope,
            "5100",
            "Office Supplies",
            AccountKind::Expense,
            user,
        );

        let category = service
            .create_expense_category(
                scope,
                "Office",
                "Supplies and sundries",
                office.id_typed(),
                true,
                Some(50_000),
                user,
            )
            .unwrap();
        let expense = service
            .create_expense(
                scope,
                category.id_typed(),
                "OFF-9",
                "Standing desks",
                75_000,
                date(2025, 4, 2),
                user,
            )
            .unwrap();

        // Above the threshold, so submission parks it for review.
        let submitted = service.submit_expense(scope, expense.id_typed()).unwrap();
        assert_eq!(submitted.status(), ExpenseStatus::PendingApproval);

        let approved = service
            .approve_expense(scope, expense.id_typed(), user)
            .unwrap();
        assert_eq!(approved.status(), ExpenseStatus::Approved);

        let paid = service
            .pay_expense(scope, expense.id_typed(), date(2025, 4, 10), user)
            .unwrap();
        assert_eq!(paid.expense.status(), ExpenseStatus::Paid);
        assert_eq!(paid.entry.status(), EntryStatus::Posted);
        assert_eq!(paid.entry.reference(), "EXP-OFF-9");
        assert_eq!(
            paid.expense.payment_entry_id(),
            Some(paid.entry.id_typed().0)
        );

        assert_eq!(
            service.account_by_code(scope, "5100").unwrap().balance(),
            75_000
        );
        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            -75_000
        );
    }

    #[test]
    fn small_expenses_approve_on_submission() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let office = seed_account(
            &service,
            scope,
            "5100",
            "Office Supplies",
            AccountKind::Expense,
            user,
        );

        let category = service
            .create_expense_category(
                scope,
                "Office",
                "",
                office.id_typed(),
                true,
                Some(50_000),
                user,
            )
            .unwrap();
        let expense = service
            .create_expense(
                scope,
                category.id_typed(),
                "OFF-2",
                "Staplers",
                20_000,
                date(2025, 4, 2),
                user,
            )
            .unwrap();

        let submitted = service.submit_expense(scope, expense.id_typed()).unwrap();
        assert_eq!(submitted.status(), ExpenseStatus::Approved);
    }

    #[test]
    fn rejected_expenses_record_the_reason_and_stay_unpaid() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let office = seed_account(
            &service,
            scope,
            "5100",
            "Office Supplies",
            AccountKind::Expense,
            user,
        );

        let category = service
            .create_expense_category(scope, "Office", "", office.id_typed(), true, None, user)
            .unwrap();
        let expense = service
            .create_expense(
                scope,
                category.id_typed(),
                "OFF-3",
                "Espresso machine",
                90_000,
                date(2025, 4, 2),
                user,
            )
            .unwrap();
        service.submit_expense(scope, expense.id_typed()).unwrap();

        let rejected = service
            .reject_expense(scope, expense.id_typed(), user, "No receipt attached")
            .unwrap();
        assert_eq!(rejected.status(), ExpenseStatus::Rejected);
        assert_eq!(rejected.rejection_reason(), Some("No receipt attached"));

        let result = service.pay_expense(scope, expense.id_typed(), date(2025, 4, 3), user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }
    }

    #[test]
    fn confirming_income_books_cash_against_revenue() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let consulting = seed_account(
            &service,
            scope,
            "4100",
            "Consulting Revenue",
            AccountKind::Revenue,
            user,
        );

        let category = service
            .create_income_category(scope, "Consulting", "", consulting.id_typed(), user)
            .unwrap();
        let income = service
            .create_income(
                scope,
                category.id_typed(),
                "INV-77",
                "Q1 retainer",
                40_000,
                date(2025, 4, 5),
                user,
            )
            .unwrap();
        assert_eq!(income.status(), IncomeStatus::Draft);

        let confirmed = service.confirm_income(scope, income.id_typed(), user).unwrap();
        assert_eq!(confirmed.income.status(), IncomeStatus::Confirmed);
        assert_eq!(confirmed.entry.status(), EntryStatus::Posted);
        assert_eq!(confirmed.entry.reference(), "INC-INV-77");
        assert_eq!(
            confirmed.income.receipt_entry_id(),
            Some(confirmed.entry.id_typed().0)
        );

        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            40_000
        );
        assert_eq!(
            service.account_by_code(scope, "4100").unwrap().balance(),
            40_000
        );
    }

    #[test]
    fn depreciation_posts_once_per_period() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let fixed = seed_account(
            &service,
            scope,
            "1500",
            "Fixed Assets",
            AccountKind::Asset,
            user,
        );
        let accumulated = seed_account(
            &service,
            scope,
            "1510",
            "Accumulated Depreciation",
            AccountKind::Asset,
            user,
        );
        let depreciation = seed_account(
            &service,
            scope,
            "5200",
            "Depreciation Expense",
            AccountKind::Expense,
            user,
        );

        let category = service
            .create_asset_category(
                scope,
                "Vehicles",
                "",
                DepreciationMethod::StraightLine,
                5,
                0,
                fixed.id_typed(),
                depreciation.id_typed(),
                accumulated.id_typed(),
                user,
            )
            .unwrap();
        let asset = service
            .register_asset(
                scope,
                category.id_typed(),
                "FA-001",
                "Delivery van",
                "",
                date(2025, 1, 15),
                600_000,
                0,
                user,
            )
            .unwrap();
        assert_eq!(asset.status(), AssetStatus::Active);

        // 600_000 over 60 months.
        let run = service
            .record_depreciation(scope, asset.id_typed(), date(2025, 2, 20), user)
            .unwrap();
        assert_eq!(run.amount, 10_000);
        let entry = run.entry.unwrap();
        assert_eq!(entry.status(), EntryStatus::Posted);
        assert_eq!(run.asset.accumulated_depreciation(), 10_000);
        assert_eq!(run.asset.current_value(), 590_000);

        assert_eq!(
            service.account_by_code(scope, "5200").unwrap().balance(),
            10_000
        );
        assert_eq!(
            service.account_by_code(scope, "1510").unwrap().balance(),
            -10_000
        );

        // Nothing further accrues within the same month; the run is a no-op.
        let rerun = service
            .record_depreciation(scope, asset.id_typed(), date(2025, 2, 20), user)
            .unwrap();
        assert_eq!(rerun.amount, 0);
        assert!(rerun.entry.is_none());
        assert_eq!(
            service.account_by_code(scope, "1510").unwrap().balance(),
            -10_000
        );
    }

    #[test]
    fn disposal_books_the_gain_and_retires_the_asset() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        seed_account(
            &service,
            scope,
            "2000",
            "Accounts Payable",
            AccountKind::Liability,
            user,
        );
        let fixed = seed_account(
            &service,
            scope,
            "1500",
            "Fixed Assets",
            AccountKind::Asset,
            user,
        );
        let accumulated = seed_account(
            &service,
            scope,
            "1510",
            "Accumulated Depreciation",
            AccountKind::Asset,
            user,
        );
        let depreciation = seed_account(
            &service,
            scope,
            "5200",
            "Depreciation Expense",
            AccountKind::Expense,
            user,
        );
        seed_account(
            &service,
            scope,
            "8001",
            "Gain on Disposal",
            AccountKind::Revenue,
            user,
        );
        seed_account(
            &service,
            scope,
            "8002",
            "Loss on Disposal",
            AccountKind::Expense,
            user,
        );

        // Purchase arrives through the procurement handover.
        let purchase = service
            .record_transaction(
                scope,
                TransactionRequest {
                    source: TransactionSource::Procurement {
                        item_type: ProcurementItemType::FixedAsset,
                    },
                    date: date(2025, 1, 15),
                    reference: "PO-77".to_string(),
                    description: "Delivery van".to_string(),
                    amount: 600_000,
                },
                user,
            )
            .unwrap();
        assert_eq!(purchase.reference(), "PROC-PO-77");
        assert_eq!(
            service.account_by_code(scope, "1500").unwrap().balance(),
            600_000
        );

        let category = service
            .create_asset_category(
                scope,
                "Vehicles",
                "",
                DepreciationMethod::StraightLine,
                5,
                0,
                fixed.id_typed(),
                depreciation.id_typed(),
                accumulated.id_typed(),
                user,
            )
            .unwrap();
        let asset = service
            .register_asset(
                scope,
                category.id_typed(),
                "FA-001",
                "Delivery van",
                "",
                date(2025, 1, 15),
                600_000,
                0,
                user,
            )
            .unwrap();
        service
            .record_depreciation(scope, asset.id_typed(), date(2025, 2, 20), user)
            .unwrap();

        // Book value 590_000, net proceeds 640_000, gain 50_000.
        let disposed = service
            .dispose_asset(scope, asset.id_typed(), date(2025, 3, 1), 650_000, 10_000, user)
            .unwrap();
        assert_eq!(disposed.asset.status(), AssetStatus::Disposed);
        assert_eq!(disposed.disposal.gain_loss(), 50_000);
        assert_eq!(disposed.entry.reference(), "DISP-FA-001");
        assert_eq!(disposed.entry.status(), EntryStatus::Posted);

        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            640_000
        );
        assert_eq!(service.account_by_code(scope, "1500").unwrap().balance(), 0);
        assert_eq!(service.account_by_code(scope, "1510").unwrap().balance(), 0);
        assert_eq!(
            service.account_by_code(scope, "8001").unwrap().balance(),
            50_000
        );

        let result = service.dispose_asset(scope, asset.id_typed(), date(2025, 3, 2), 0, 0, user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }
    }

    #[test]
    fn switching_balances_moves_money_and_reversal_restores_it() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let petty = seed_account(&service, scope, "1002", "Petty Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let seeding = service
            .create_entry(
                scope,
                date(2025, 5, 1),
                "JNL-050",
                "Opening takings",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 50_000),
                    line(revenue.id_typed(), LineSide::Credit, 50_000),
                ],
                user,
            )
            .unwrap();
        service.post_entry(scope, seeding.id_typed()).unwrap();

        let posted = service
            .switch_balance(
                scope,
                cash.id_typed(),
                petty.id_typed(),
                20_000,
                date(2025, 5, 10),
                "Float for the front desk",
                user,
            )
            .unwrap();
        assert_eq!(posted.switch.status(), SwitchStatus::Posted);
        assert_eq!(posted.entry.status(), EntryStatus::Posted);
        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            30_000
        );
        assert_eq!(
            service.account_by_code(scope, "1002").unwrap().balance(),
            20_000
        );

        let reversed = service
            .delete_switch(scope, posted.switch.id_typed(), user)
            .unwrap();
        assert_eq!(reversed.switch.status(), SwitchStatus::Reversed);
        assert!(reversed.switch.reversal_entry_id().is_some());
        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            50_000
        );
        assert_eq!(service.account_by_code(scope, "1002").unwrap().balance(), 0);

        let result = service.delete_switch(scope, posted.switch.id_typed(), user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }
    }

    #[test]
    fn updating_a_switch_rebooks_under_a_fresh_reference() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let petty = seed_account(&service, scope, "1002", "Petty Cash", AccountKind::Asset, user);
        let drawer = seed_account(&service, scope, "1003", "Till Drawer", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let seeding = service
            .create_entry(
                scope,
                date(2025, 5, 1),
                "JNL-051",
                "Opening takings",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 50_000),
                    line(revenue.id_typed(), LineSide::Credit, 50_000),
                ],
                user,
            )
            .unwrap();
        service.post_entry(scope, seeding.id_typed()).unwrap();

        let original = service
            .switch_balance(
                scope,
                cash.id_typed(),
                petty.id_typed(),
                20_000,
                date(2025, 5, 10),
                "Float for the front desk",
                user,
            )
            .unwrap();

        // Wrong destination and wrong amount; correct both in one go.
        let replacement = service
            .update_switch(
                scope,
                original.switch.id_typed(),
                cash.id_typed(),
                drawer.id_typed(),
                5_000,
                date(2025, 5, 12),
                "Float for the till drawer",
                user,
            )
            .unwrap();
        assert_ne!(replacement.switch.id_typed(), original.switch.id_typed());
        assert_eq!(replacement.switch.status(), SwitchStatus::Posted);

        let stored_original = service.switch(scope, original.switch.id_typed()).unwrap();
        assert_eq!(stored_original.status(), SwitchStatus::Reversed);

        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            45_000
        );
        assert_eq!(service.account_by_code(scope, "1002").unwrap().balance(), 0);
        assert_eq!(
            service.account_by_code(scope, "1003").unwrap().balance(),
            5_000
        );
        assert_eq!(service.list_switches(scope).unwrap().len(), 2);
    }

    #[test]
    fn integration_transactions_book_against_the_chart() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        seed_account(&service, scope, "1200", "Inventory", AccountKind::Asset, user);
        seed_account(
            &service,
            scope,
            "2000",
            "Accounts Payable",
            AccountKind::Liability,
            user,
        );

        let entry = service
            .record_transaction(
                scope,
                TransactionRequest {
                    source: TransactionSource::Procurement {
                        item_type: ProcurementItemType::Inventory,
                    },
                    date: date(2025, 4, 1),
                    reference: "PO-88".to_string(),
                    description: "Stock replenishment".to_string(),
                    amount: 30_000,
                },
                user,
            )
            .unwrap();
        assert_eq!(entry.status(), EntryStatus::Posted);
        assert_eq!(entry.reference(), "PROC-PO-88");

        assert_eq!(
            service.account_by_code(scope, "1200").unwrap().balance(),
            30_000
        );
        assert_eq!(
            service.account_by_code(scope, "2000").unwrap().balance(),
            30_000
        );

        // A scope that never set up its chart accounts cannot book handovers.
        let bare_scope = test_scope();
        let result = service.record_transaction(
            bare_scope,
            TransactionRequest {
                source: TransactionSource::Procurement {
                    item_type: ProcurementItemType::Inventory,
                },
                date: date(2025, 4, 1),
                reference: "PO-89".to_string(),
                description: "Stock replenishment".to_string(),
                amount: 30_000,
            },
            user,
        );
        match result.unwrap_err() {
            StoreError::Domain(DomainError::NotFound) => {}
            e => panic!("Expected NotFound, got: {:?}", e),
        }
    }

    #[test]
    fn budgets_move_through_their_lifecycle() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let office = seed_account(
            &service,
            scope,
            "5100",
            "Office Supplies",
            AccountKind::Expense,
            user,
        );

        let budget = service
            .create_budget(scope, "Operating budget", 2025, BudgetPeriod::Monthly, user)
            .unwrap();
        assert_eq!(budget.status(), BudgetStatus::Draft);

        // Only one budget per fiscal year and period granularity.
        let result = service.create_budget(scope, "Second try", 2025, BudgetPeriod::Monthly, user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::Integrity(_)) => {}
            e => panic!("Expected Integrity, got: {:?}", e),
        }

        // An empty budget has nothing to approve.
        let result = service.approve_budget(scope, budget.id_typed(), user);
        match result.unwrap_err() {
            StoreError::Domain(DomainError::InvalidState(_)) => {}
            e => panic!("Expected InvalidState, got: {:?}", e),
        }

        let with_item = service
            .set_budget_item(scope, budget.id_typed(), office.id_typed(), 3, 25_000)
            .unwrap();
        assert_eq!(with_item.item_amount(office.id_typed(), 3), Some(25_000));
        assert_eq!(with_item.total_amount(), 25_000);

        let approved = service.approve_budget(scope, budget.id_typed(), user).unwrap();
        assert_eq!(approved.status(), BudgetStatus::Approved);

        let active = service.activate_budget(scope, budget.id_typed()).unwrap();
        assert_eq!(active.status(), BudgetStatus::Active);

        let closed = service.close_budget(scope, budget.id_typed()).unwrap();
        assert_eq!(closed.status(), BudgetStatus::Closed);
    }

    #[test]
    fn scopes_are_isolated_end_to_end() {
        let (service, projection) = setup();
        let scope_a = test_scope();
        let scope_b = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope_a, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope_a,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        let entry = service
            .create_entry(
                scope_a,
                date(2025, 3, 10),
                "JNL-001",
                "Cash sale",
                vec![
                    line(cash.id_typed(), LineSide::Debit, 10_000),
                    line(revenue.id_typed(), LineSide::Credit, 10_000),
                ],
                user,
            )
            .unwrap();
        service.post_entry(scope_a, entry.id_typed()).unwrap();
        wait_for_processing();

        // The other scope sees none of it.
        match service.account(scope_b, cash.id_typed()).unwrap_err() {
            StoreError::Domain(DomainError::NotFound) => {}
            e => panic!("Expected NotFound, got: {:?}", e),
        }
        match service.entry_by_reference(scope_b, "JNL-001").unwrap_err() {
            StoreError::Domain(DomainError::NotFound) => {}
            e => panic!("Expected NotFound, got: {:?}", e),
        }
        assert!(service.list_accounts(scope_b).unwrap().is_empty());
        assert!(projection.list(scope_b).is_empty());

        // And the same reference is free for the other scope to take.
        let cash_b = seed_account(&service, scope_b, "1001", "Cash", AccountKind::Asset, user);
        let revenue_b = seed_account(
            &service,
            scope_b,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );
        service
            .create_entry(
                scope_b,
                date(2025, 3, 10),
                "JNL-001",
                "Cash sale",
                vec![
                    line(cash_b.id_typed(), LineSide::Debit, 2_000),
                    line(revenue_b.id_typed(), LineSide::Credit, 2_000),
                ],
                user,
            )
            .unwrap();
    }

    #[test]
    fn the_projection_tracks_posted_activity() {
        let (service, projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );

        for (idx, amount) in [10_000i64, 2_500].iter().enumerate() {
            let entry = service
                .create_entry(
                    scope,
                    date(2025, 3, 10),
                    format!("JNL-{}", idx),
                    "Cash sale",
                    vec![
                        line(cash.id_typed(), LineSide::Debit, *amount),
                        line(revenue.id_typed(), LineSide::Credit, *amount),
                    ],
                    user,
                )
                .unwrap();
            service.post_entry(scope, entry.id_typed()).unwrap();
        }
        wait_for_processing();

        let cash_activity = projection.get(scope, "1001").unwrap();
        assert_eq!(cash_activity.lines_posted, 2);
        assert_eq!(cash_activity.debit_total, 12_500);
        assert_eq!(cash_activity.credit_total, 0);
        assert_eq!(cash_activity.balance, 12_500);

        let revenue_activity = projection.get(scope, "4000").unwrap();
        assert_eq!(revenue_activity.credit_total, 12_500);
        assert_eq!(revenue_activity.balance, 12_500);

        // The read model agrees with the authoritative balances.
        assert_eq!(
            i128::from(service.account_by_code(scope, "1001").unwrap().balance()),
            cash_activity.balance
        );
    }

    #[test]
    fn concurrent_posts_serialize_without_losing_writes() {
        let (service, _projection) = setup();
        let scope = test_scope();
        let user = test_user();

        let cash = seed_account(&service, scope, "1001", "Cash", AccountKind::Asset, user);
        let revenue = seed_account(
            &service,
            scope,
            "4000",
            "Sales Revenue",
            AccountKind::Revenue,
            user,
        );
        let cash_id = cash.id_typed();
        let revenue_id = revenue.id_typed();

        let service = Arc::new(service);
        let mut handles = Vec::new();
        for worker in 0..8 {
            let service = Arc::clone(&service);
            handles.push(std::thread::spawn(move || {
                for i in 0..5 {
                    let entry = service
                        .create_entry(
                            scope,
                            date(2025, 6, 1),
                            format!("CON-{}-{}", worker, i),
                            "Concurrent posting",
                            vec![
                                line(cash_id, LineSide::Debit, 1_000),
                                line(revenue_id, LineSide::Credit, 1_000),
                            ],
                            user,
                        )
                        .unwrap();
                    service.post_entry(scope, entry.id_typed()).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            service.account_by_code(scope, "1001").unwrap().balance(),
            40_000
        );
        assert_eq!(service.list_entries(scope).unwrap().len(), 40);
    }
}
