//! Fixed asset operations: registration, depreciation runs, disposal.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;

use ledgerly_accounts::{AccountId, AccountKind};
use ledgerly_assets::{
    Asset, AssetCategory, AssetCategoryId, AssetCommand, AssetDisposal, AssetDisposalId, AssetId,
    AssetStatus, DepreciationMethod, MarkAssetDisposed, RecordDepreciation, RegisterAsset,
};
use ledgerly_core::{AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::{EventBus, EventEnvelope, execute};
use ledgerly_journal::{FinancialEvent, JournalEntry};

use super::{
    ASSET_AGGREGATE, LedgerService, StoreResult, build_posted_entry, collect_scope,
    commit_accounts, commit_entry, ensure_account_kind, envelopes_for,
};
use crate::state::LedgerState;

/// Outcome of a depreciation run.
///
/// `entry` is `None` when nothing was due; the run is then a no-op, not an
/// error, so periodic schedulers can call it blindly.
#[derive(Debug, Clone)]
pub struct DepreciationRun {
    pub asset: Asset,
    pub amount: i64,
    pub entry: Option<JournalEntry>,
}

/// Outcome of disposing an asset.
#[derive(Debug, Clone)]
pub struct DisposedAsset {
    pub asset: Asset,
    pub disposal: AssetDisposal,
    pub entry: JournalEntry,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    // ---- asset categories ----

    /// Create an asset category with its depreciation defaults and the three
    /// booking accounts (asset, depreciation charge, accumulated depreciation).
    #[allow(clippy::too_many_arguments)]
    pub fn create_asset_category(
        &self,
        scope: Scope,
        name: impl Into<String>,
        description: impl Into<String>,
        method: DepreciationMethod,
        useful_life_years: u32,
        rate_bps: u32,
        asset_account: AccountId,
        depreciation_account: AccountId,
        accumulated_depreciation_account: AccountId,
        created_by: UserId,
    ) -> StoreResult<AssetCategory> {
        let mut state = self.write_state()?;
        ensure_account_kind(
            state.account(scope, asset_account)?.kind(),
            AccountKind::Asset,
            "asset category must book to an asset account",
        )?;
        ensure_account_kind(
            state.account(scope, depreciation_account)?.kind(),
            AccountKind::Expense,
            "depreciation must charge an expense account",
        )?;
        ensure_account_kind(
            state.account(scope, accumulated_depreciation_account)?.kind(),
            AccountKind::Asset,
            "accumulated depreciation must be a contra asset account",
        )?;

        let category = AssetCategory::new(
            AssetCategoryId::new(AggregateId::new()),
            name,
            description,
            method,
            useful_life_years,
            rate_bps,
            asset_account,
            depreciation_account,
            accumulated_depreciation_account,
            scope,
            created_by,
        )?;

        state
            .asset_categories
            .insert((scope, category.id_typed()), category.clone());
        drop(state);

        tracing::info!(
            "asset category '{}' created for scope {scope}",
            category.name()
        );
        Ok(category)
    }

    pub fn asset_category(
        &self,
        scope: Scope,
        category_id: AssetCategoryId,
    ) -> StoreResult<AssetCategory> {
        let state = self.read_state()?;
        Ok(state.asset_category(scope, category_id)?.clone())
    }

    pub fn list_asset_categories(&self, scope: Scope) -> StoreResult<Vec<AssetCategory>> {
        let state = self.read_state()?;
        let mut categories = collect_scope(&state.asset_categories, scope);
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(categories)
    }

    // ---- assets ----

    /// Register an asset under a category; the category supplies the
    /// depreciation method, life and rate. Asset numbers are unique per scope.
    #[allow(clippy::too_many_arguments)]
    pub fn register_asset(
        &self,
        scope: Scope,
        category_id: AssetCategoryId,
        asset_number: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        purchase_date: NaiveDate,
        purchase_cost: i64,
        salvage_value: i64,
        created_by: UserId,
    ) -> StoreResult<Asset> {
        let asset_number = asset_number.into();
        let now = Utc::now();

        let mut state = self.write_state()?;
        let category = state.asset_category(scope, category_id)?;
        if !category.is_active() {
            return Err(DomainError::invalid_state("asset category is not active").into());
        }
        ensure_unused_asset_number(&state, scope, &asset_number)?;

        let asset_id = AssetId::new(AggregateId::new());
        let mut asset = Asset::empty(asset_id);
        let register = RegisterAsset {
            scope,
            asset_id,
            category_id,
            asset_number,
            name: name.into(),
            description: description.into(),
            purchase_date,
            purchase_cost,
            salvage_value,
            method: category.method(),
            useful_life_years: category.useful_life_years(),
            rate_bps: category.rate_bps(),
            created_by,
            occurred_at: now,
        };
        let events = execute(&mut asset, &AssetCommand::RegisterAsset(register))?;
        let envelopes = envelopes_for(scope, asset_id.0, ASSET_AGGREGATE, 0, &events)?;

        state
            .asset_numbers
            .insert((scope, asset.asset_number().to_string()), asset_id);
        state.assets.insert((scope, asset_id), asset.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "asset {} '{}' registered for scope {scope}",
            asset.asset_number(),
            asset.name()
        );
        Ok(asset)
    }

    /// Run depreciation for one asset as of a date.
    ///
    /// Books the `DEP-` charge (debit depreciation expense, credit
    /// accumulated depreciation) and advances the asset, atomically. When no
    /// full month has accrued, or the value already sits at salvage, the run
    /// returns with `amount == 0` and no entry.
    pub fn record_depreciation(
        &self,
        scope: Scope,
        asset_id: AssetId,
        as_of: NaiveDate,
        recorded_by: UserId,
    ) -> StoreResult<DepreciationRun> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut asset = state.asset(scope, asset_id)?.clone();
        let base_version = asset.version();

        let amount = asset.depreciation_due(as_of);
        if amount == 0 {
            tracing::debug!(
                "no depreciation due for asset {} as of {as_of}",
                asset.asset_number()
            );
            return Ok(DepreciationRun {
                asset,
                amount: 0,
                entry: None,
            });
        }

        let category_id = asset.category_id().ok_or_else(DomainError::not_found)?;
        let category = state.asset_category(scope, category_id)?;
        let depreciation_account = state.account(scope, category.depreciation_account())?;
        let accumulated_account =
            state.account(scope, category.accumulated_depreciation_account())?;

        let event = FinancialEvent::AssetDepreciated {
            asset_number: asset.asset_number().to_string(),
            asset_name: asset.name().to_string(),
            date: as_of,
            amount,
            depreciation_account: depreciation_account.to_ref(),
            accumulated_depreciation_account: accumulated_account.to_ref(),
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, recorded_by, now)?;

        let record = RecordDepreciation {
            scope,
            asset_id,
            date: as_of,
            amount,
            entry_id: posted.entry.id_typed().0,
            occurred_at: now,
        };
        let events = execute(&mut asset, &AssetCommand::RecordDepreciation(record))?;
        let mut envelopes = posted.envelopes;
        envelopes.extend(envelopes_for(
            scope,
            asset_id.0,
            ASSET_AGGREGATE,
            base_version,
            &events,
        )?);

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.assets.insert((scope, asset_id), asset.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "depreciation of {amount} recorded for asset {} via entry '{}'",
            asset.asset_number(),
            posted.entry.reference()
        );
        Ok(DepreciationRun {
            asset,
            amount,
            entry: Some(posted.entry),
        })
    }

    /// Dispose an asset: post the `DISP-` entry (proceeds, cost recovery,
    /// gain or loss), record the disposal and terminate the asset, atomically.
    #[allow(clippy::too_many_arguments)]
    pub fn dispose_asset(
        &self,
        scope: Scope,
        asset_id: AssetId,
        disposal_date: NaiveDate,
        sale_price: i64,
        costs_of_disposal: i64,
        disposed_by: UserId,
    ) -> StoreResult<DisposedAsset> {
        let now = Utc::now();

        let mut state = self.write_state()?;
        let mut asset = state.asset(scope, asset_id)?.clone();
        let base_version = asset.version();

        // Checked again by the aggregate; checked here first so a re-disposal
        // reports the status problem, not the taken journal reference.
        if asset.status() == AssetStatus::Disposed {
            return Err(DomainError::invalid_state("asset has already been disposed").into());
        }

        let category_id = asset.category_id().ok_or_else(DomainError::not_found)?;
        let category = state.asset_category(scope, category_id)?;
        let asset_account = state.account(scope, category.asset_account())?;
        let accumulated_account =
            state.account(scope, category.accumulated_depreciation_account())?;
        let chart = state.chart(scope);
        let cash_account = state.account_by_code(scope, &chart.cash)?;
        let gain_account = state.account_by_code(scope, &chart.disposal_gain)?;
        let loss_account = state.account_by_code(scope, &chart.disposal_loss)?;

        let event = FinancialEvent::AssetDisposed {
            asset_number: asset.asset_number().to_string(),
            asset_name: asset.name().to_string(),
            date: disposal_date,
            sale_price,
            costs_of_disposal,
            purchase_cost: asset.purchase_cost(),
            book_value: asset.current_value(),
            cash_account: cash_account.to_ref(),
            asset_account: asset_account.to_ref(),
            accumulated_depreciation_account: accumulated_account.to_ref(),
            gain_account: gain_account.to_ref(),
            loss_account: loss_account.to_ref(),
        };

        let mut touched = HashMap::new();
        let posted = build_posted_entry(&state, scope, &event, &mut touched, disposed_by, now)?;

        let disposal_id = AssetDisposalId::new(AggregateId::new());
        let disposal = AssetDisposal::new(
            disposal_id,
            asset_id,
            disposal_date,
            sale_price,
            costs_of_disposal,
            asset.current_value(),
            posted.entry.id_typed().0,
            scope,
            disposed_by,
        )?;

        let dispose = MarkAssetDisposed {
            scope,
            asset_id,
            disposal_id: disposal_id.0,
            entry_id: posted.entry.id_typed().0,
            occurred_at: now,
        };
        let events = execute(&mut asset, &AssetCommand::MarkAssetDisposed(dispose))?;
        let mut envelopes = posted.envelopes;
        envelopes.extend(envelopes_for(
            scope,
            asset_id.0,
            ASSET_AGGREGATE,
            base_version,
            &events,
        )?);

        commit_accounts(&mut state, scope, touched);
        commit_entry(&mut state, scope, &posted.entry);
        state.disposals.insert((scope, disposal_id), disposal.clone());
        state.assets.insert((scope, asset_id), asset.clone());
        drop(state);

        self.publish_all(envelopes);
        tracing::info!(
            "asset {} disposed via entry '{}' (gain/loss {})",
            asset.asset_number(),
            posted.entry.reference(),
            disposal.gain_loss()
        );
        Ok(DisposedAsset {
            asset,
            disposal,
            entry: posted.entry,
        })
    }

    pub fn asset(&self, scope: Scope, asset_id: AssetId) -> StoreResult<Asset> {
        let state = self.read_state()?;
        Ok(state.asset(scope, asset_id)?.clone())
    }

    pub fn asset_by_number(&self, scope: Scope, asset_number: &str) -> StoreResult<Asset> {
        let state = self.read_state()?;
        Ok(state.asset_by_number(scope, asset_number)?.clone())
    }

    pub fn list_assets(&self, scope: Scope) -> StoreResult<Vec<Asset>> {
        let state = self.read_state()?;
        let mut assets = collect_scope(&state.assets, scope);
        assets.sort_by(|a, b| a.asset_number().cmp(b.asset_number()));
        Ok(assets)
    }

    pub fn disposal(
        &self,
        scope: Scope,
        disposal_id: AssetDisposalId,
    ) -> StoreResult<AssetDisposal> {
        let state = self.read_state()?;
        Ok(state.disposal(scope, disposal_id)?.clone())
    }

    pub fn list_disposals(&self, scope: Scope) -> StoreResult<Vec<AssetDisposal>> {
        let state = self.read_state()?;
        let mut disposals = collect_scope(&state.disposals, scope);
        disposals.sort_by_key(|d| d.disposal_date());
        Ok(disposals)
    }
}

fn ensure_unused_asset_number(
    state: &LedgerState,
    scope: Scope,
    asset_number: &str,
) -> Result<(), DomainError> {
    if state
        .asset_numbers
        .contains_key(&(scope, asset_number.to_string()))
    {
        return Err(DomainError::integrity(format!(
            "asset number '{asset_number}' is already in use"
        )));
    }
    Ok(())
}
