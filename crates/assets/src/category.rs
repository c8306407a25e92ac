use serde::{Deserialize, Serialize};

use ledgerly_accounts::AccountId;
use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

/// Asset category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetCategoryId(pub AggregateId);

impl AssetCategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AssetCategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    StraightLine,
    ReducingBalance,
}

/// Asset category: depreciation defaults applied at registration plus the
/// three chart accounts a depreciating asset books against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetCategory {
    id: AssetCategoryId,
    name: String,
    description: String,
    method: DepreciationMethod,
    /// Straight-line life; ignored for reducing balance.
    useful_life_years: u32,
    /// Annual reducing-balance rate in basis points; ignored for
    /// straight line.
    rate_bps: u32,
    asset_account: AccountId,
    depreciation_account: AccountId,
    accumulated_depreciation_account: AccountId,
    is_active: bool,
    scope: Scope,
    created_by: UserId,
}

impl AssetCategory {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AssetCategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        method: DepreciationMethod,
        useful_life_years: u32,
        rate_bps: u32,
        asset_account: AccountId,
        depreciation_account: AccountId,
        accumulated_depreciation_account: AccountId,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name must not be empty"));
        }
        match method {
            DepreciationMethod::StraightLine => {
                if useful_life_years == 0 {
                    return Err(DomainError::validation(
                        "useful life must be at least one year",
                    ));
                }
            }
            DepreciationMethod::ReducingBalance => {
                if rate_bps == 0 || rate_bps > 10_000 {
                    return Err(DomainError::validation(
                        "annual rate must be between 1 and 10000 basis points",
                    ));
                }
            }
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            method,
            useful_life_years,
            rate_bps,
            asset_account,
            depreciation_account,
            accumulated_depreciation_account,
            is_active: true,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> AssetCategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
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

    pub fn asset_account(&self) -> AccountId {
        self.asset_account
    }

    pub fn depreciation_account(&self) -> AccountId {
        self.depreciation_account
    }

    pub fn accumulated_depreciation_account(&self) -> AccountId {
        self.accumulated_depreciation_account
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for AssetCategory {
    type Id = AssetCategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerly_core::{BranchId, TenantId};

    fn accounts() -> (AccountId, AccountId, AccountId) {
        (
            AccountId::new(AggregateId::new()),
            AccountId::new(AggregateId::new()),
            AccountId::new(AggregateId::new()),
        )
    }

    #[test]
    fn straight_line_needs_a_useful_life() {
        let (a, d, acc) = accounts();
        let err = AssetCategory::new(
            AssetCategoryId::new(AggregateId::new()),
            "Vehicles",
            "",
            DepreciationMethod::StraightLine,
            0,
            0,
            a,
            d,
            acc,
            Scope::new(TenantId::new(), BranchId::new()),
            UserId::new(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("useful life") => {}
            _ => panic!("Expected Validation error for zero useful life"),
        }
    }

    #[test]
    fn reducing_balance_rate_is_bounded() {
        let (a, d, acc) = accounts();
        let err = AssetCategory::new(
            AssetCategoryId::new(AggregateId::new()),
            "IT equipment",
            "",
            DepreciationMethod::ReducingBalance,
            0,
            10_001,
            a,
            d,
            acc,
            Scope::new(TenantId::new(), BranchId::new()),
            UserId::new(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("basis points") => {}
            _ => panic!("Expected Validation error for out-of-range rate"),
        }
    }
}
