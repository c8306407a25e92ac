use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgerly_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Scope, UserId};
use ledgerly_events::Event;

use crate::category::{AssetCategoryId, DepreciationMethod};

/// Asset identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub AggregateId);

impl AssetId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AssetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Asset status lifecycle. Disposed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Active,
    Disposed,
}

/// Aggregate root: Asset.
///
/// `current_value` is the book value: purchase cost minus accumulated
/// depreciation, never below `salvage_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    id: AssetId,
    scope: Option<Scope>,
    category_id: Option<AssetCategoryId>,
    asset_number: String,
    name: String,
    description: String,
    purchase_date: Option<NaiveDate>,
    purchase_cost: i64,
    salvage_value: i64,
    current_value: i64,
    method: DepreciationMethod,
    useful_life_years: u32,
    rate_bps: u32,
    last_depreciation_date: Option<NaiveDate>,
    status: AssetStatus,
    disposal_id: Option<AggregateId>,
    version: u64,
    created: bool,
}

impl Asset {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: AssetId) -> Self {
        Self {
            id,
            scope: None,
            category_id: None,
            asset_number: String::new(),
            name: String::new(),
            description: String::new(),
            purchase_date: None,
            purchase_cost: 0,
            salvage_value: 0,
            current_value: 0,
            method: DepreciationMethod::StraightLine,
            useful_life_years: 0,
            rate_bps: 0,
            last_depreciation_date: None,
            status: AssetStatus::Active,
            disposal_id: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> AssetId {
        self.id
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn category_id(&self) -> Option<AssetCategoryId> {
        self.category_id
    }

    pub fn asset_number(&self) -> &str {
        &self.asset_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn purchase_date(&self) -> Option<NaiveDate> {
        self.purchase_date
    }

    pub fn purchase_cost(&self) -> i64 {
        self.purchase_cost
    }

    pub fn salvage_value(&self) -> i64 {
        self.salvage_value
    }

    /// Book value after depreciation recorded so far.
    pub fn current_value(&self) -> i64 {
        self.current_value
    }

    pub fn accumulated_depreciation(&self) -> i64 {
        self.purchase_cost - self.current_value
    }

    pub fn method(&self) -> DepreciationMethod {
        self.method
    }

    pub fn useful_life_years(&self) -> u32 {
        self.useful_life_years
    }

    pub fn rate_bps(&self) -> u32 {
        self.rate_bps
    }

    pub fn last_depreciation_date(&self) -> Option<NaiveDate> {
        self.last_depreciation_date
    }

    pub fn status(&self) -> AssetStatus {
        self.status
    }

    pub fn disposal_id(&self) -> Option<AggregateId> {
        self.disposal_id
    }

    /// One month of depreciation owed as of the given date, or zero when
    /// none is due.
    ///
    /// Zero when the asset is disposed, when `as_of` has not moved past the
    /// last depreciation date (falling back to the purchase date), and when
    /// book value already sits at salvage. The charge is one month of the
    /// configured method, rounded half-up to the cent and clamped so the
    /// book value cannot fall below salvage.
    pub fn depreciation_due(&self, as_of: NaiveDate) -> i64 {
        if !self.created || self.status != AssetStatus::Active {
            return 0;
        }
        let since = match self.last_depreciation_date.or(self.purchase_date) {
            Some(date) => date,
            None => return 0,
        };
        if as_of <= since {
            return 0;
        }
        let remaining = self.current_value - self.salvage_value;
        if remaining <= 0 {
            return 0;
        }

        let monthly = match self.method {
            DepreciationMethod::StraightLine => {
                let months = i128::from(self.useful_life_years) * 12;
                if months == 0 {
                    return 0;
                }
                div_round_half_up(
                    i128::from(self.purchase_cost - self.salvage_value),
                    months,
                )
            }
            DepreciationMethod::ReducingBalance => div_round_half_up(
                i128::from(self.current_value) * i128::from(self.rate_bps),
                120_000,
            ),
        };

        monthly.min(remaining)
    }
}

/// Integer division rounding half away from zero; operands are
/// non-negative in every caller.
fn div_round_half_up(numerator: i128, denominator: i128) -> i64 {
    let rounded = (numerator + denominator / 2) / denominator;
    // Charges never exceed the asset cost, which is an i64.
    rounded as i64
}

impl AggregateRoot for Asset {
    type Id = AssetId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterAsset.
///
/// Depreciation settings come from the asset category; the caller copies
/// them in when building the command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAsset {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub category_id: AssetCategoryId,
    pub asset_number: String,
    pub name: String,
    pub description: String,
    pub purchase_date: NaiveDate,
    pub purchase_cost: i64,
    pub salvage_value: i64,
    pub method: DepreciationMethod,
    pub useful_life_years: u32,
    pub rate_bps: u32,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordDepreciation.
///
/// `entry_id` is the journal entry booking the charge; the caller creates
/// and posts it in the same unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDepreciation {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub date: NaiveDate,
    pub amount: i64,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkAssetDisposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAssetDisposed {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub disposal_id: AggregateId,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCommand {
    RegisterAsset(RegisterAsset),
    RecordDepreciation(RecordDepreciation),
    MarkAssetDisposed(MarkAssetDisposed),
}

/// Event: AssetRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRegistered {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub category_id: AssetCategoryId,
    pub asset_number: String,
    pub name: String,
    pub description: String,
    pub purchase_date: NaiveDate,
    pub purchase_cost: i64,
    pub salvage_value: i64,
    pub method: DepreciationMethod,
    pub useful_life_years: u32,
    pub rate_bps: u32,
    pub created_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DepreciationRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationRecorded {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub date: NaiveDate,
    pub amount: i64,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssetDisposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDisposed {
    pub scope: Scope,
    pub asset_id: AssetId,
    pub disposal_id: AggregateId,
    pub entry_id: AggregateId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetEvent {
    AssetRegistered(AssetRegistered),
    DepreciationRecorded(DepreciationRecorded),
    AssetDisposed(AssetDisposed),
}

impl Event for AssetEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AssetEvent::AssetRegistered(_) => "asset.registered",
            AssetEvent::DepreciationRecorded(_) => "asset.depreciation_recorded",
            AssetEvent::AssetDisposed(_) => "asset.disposed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AssetEvent::AssetRegistered(e) => e.occurred_at,
            AssetEvent::DepreciationRecorded(e) => e.occurred_at,
            AssetEvent::AssetDisposed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Asset {
    type Command = AssetCommand;
    type Event = AssetEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AssetEvent::AssetRegistered(e) => {
                self.id = e.asset_id;
                self.scope = Some(e.scope);
                self.category_id = Some(e.category_id);
                self.asset_number = e.asset_number.clone();
                self.name = e.name.clone();
                self.description = e.description.clone();
                self.purchase_date = Some(e.purchase_date);
                self.purchase_cost = e.purchase_cost;
                self.salvage_value = e.salvage_value;
                self.current_value = e.purchase_cost;
                self.method = e.method;
                self.useful_life_years = e.useful_life_years;
                self.rate_bps = e.rate_bps;
                self.status = AssetStatus::Active;
                self.created = true;
            }
            AssetEvent::DepreciationRecorded(e) => {
                self.current_value -= e.amount;
                self.last_depreciation_date = Some(e.date);
            }
            AssetEvent::AssetDisposed(e) => {
                self.status = AssetStatus::Disposed;
                self.disposal_id = Some(e.disposal_id);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AssetCommand::RegisterAsset(cmd) => self.handle_register(cmd),
            AssetCommand::RecordDepreciation(cmd) => self.handle_depreciation(cmd),
            AssetCommand::MarkAssetDisposed(cmd) => self.handle_disposed(cmd),
        }
    }
}

impl Asset {
    fn ensure_scope(&self, scope: Scope) -> Result<(), DomainError> {
        match self.scope {
            Some(own) => own.ensure_same(&scope, "asset"),
            None => Ok(()),
        }
    }

    fn ensure_asset_id(&self, asset_id: AssetId) -> Result<(), DomainError> {
        if self.id != asset_id {
            return Err(DomainError::validation("asset_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterAsset) -> Result<Vec<AssetEvent>, DomainError> {
        if self.created {
            return Err(DomainError::integrity("asset already exists"));
        }
        if cmd.asset_number.trim().is_empty() {
            return Err(DomainError::validation("asset number must not be empty"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("asset name must not be empty"));
        }
        if cmd.purchase_cost <= 0 {
            return Err(DomainError::validation("purchase cost must be positive"));
        }
        if cmd.salvage_value < 0 || cmd.salvage_value > cmd.purchase_cost {
            return Err(DomainError::validation(
                "salvage value must be between zero and purchase cost",
            ));
        }
        match cmd.method {
            DepreciationMethod::StraightLine => {
                if cmd.useful_life_years == 0 {
                    return Err(DomainError::validation(
                        "useful life must be at least one year",
                    ));
                }
            }
            DepreciationMethod::ReducingBalance => {
                if cmd.rate_bps == 0 || cmd.rate_bps > 10_000 {
                    return Err(DomainError::validation(
                        "annual rate must be between 1 and 10000 basis points",
                    ));
                }
            }
        }

        Ok(vec![AssetEvent::AssetRegistered(AssetRegistered {
            scope: cmd.scope,
            asset_id: cmd.asset_id,
            category_id: cmd.category_id,
            asset_number: cmd.asset_number.clone(),
            name: cmd.name.clone(),
            description: cmd.description.clone(),
            purchase_date: cmd.purchase_date,
            purchase_cost: cmd.purchase_cost,
            salvage_value: cmd.salvage_value,
            method: cmd.method,
            useful_life_years: cmd.useful_life_years,
            rate_bps: cmd.rate_bps,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_depreciation(
        &self,
        cmd: &RecordDepreciation,
    ) -> Result<Vec<AssetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_asset_id(cmd.asset_id)?;

        if self.status != AssetStatus::Active {
            return Err(DomainError::invalid_state(
                "depreciation cannot be recorded on a disposed asset",
            ));
        }
        if cmd.amount <= 0 {
            return Err(DomainError::validation(
                "depreciation amount must be positive",
            ));
        }
        if cmd.amount > self.current_value - self.salvage_value {
            return Err(DomainError::validation(
                "depreciation cannot take the asset below its salvage value",
            ));
        }
        if let Some(since) = self.last_depreciation_date.or(self.purchase_date) {
            if cmd.date <= since {
                return Err(DomainError::validation(
                    "depreciation date must be after the previous depreciation",
                ));
            }
        }

        Ok(vec![AssetEvent::DepreciationRecorded(
            DepreciationRecorded {
                scope: cmd.scope,
                asset_id: cmd.asset_id,
                date: cmd.date,
                amount: cmd.amount,
                entry_id: cmd.entry_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_disposed(&self, cmd: &MarkAssetDisposed) -> Result<Vec<AssetEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_scope(cmd.scope)?;
        self.ensure_asset_id(cmd.asset_id)?;

        if self.status != AssetStatus::Active {
            return Err(DomainError::invalid_state(
                "asset has already been disposed",
            ));
        }

        Ok(vec![AssetEvent::AssetDisposed(AssetDisposed {
            scope: cmd.scope,
            asset_id: cmd.asset_id,
            disposal_id: cmd.disposal_id,
            entry_id: cmd.entry_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
