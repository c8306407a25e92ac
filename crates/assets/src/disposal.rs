use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgerly_core::{AggregateId, DomainError, DomainResult, Entity, Scope, UserId};

use crate::asset::AssetId;

/// Asset disposal identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetDisposalId(pub AggregateId);

impl AssetDisposalId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for AssetDisposalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Record of a completed asset disposal.
///
/// Captures the figures at the moment of disposal; `gain_loss` is net
/// proceeds (sale price minus disposal costs) against book value, positive
/// for a gain. The journal entry it points at carries the account-level
/// detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDisposal {
    id: AssetDisposalId,
    asset_id: AssetId,
    disposal_date: NaiveDate,
    sale_price: i64,
    costs_of_disposal: i64,
    book_value_at_disposal: i64,
    gain_loss: i64,
    entry_id: AggregateId,
    scope: Scope,
    created_by: UserId,
}

impl AssetDisposal {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AssetDisposalId,
        asset_id: AssetId,
        disposal_date: NaiveDate,
        sale_price: i64,
        costs_of_disposal: i64,
        book_value_at_disposal: i64,
        entry_id: AggregateId,
        scope: Scope,
        created_by: UserId,
    ) -> DomainResult<Self> {
        if sale_price < 0 {
            return Err(DomainError::validation("sale price cannot be negative"));
        }
        if costs_of_disposal < 0 {
            return Err(DomainError::validation(
                "costs of disposal cannot be negative",
            ));
        }
        if book_value_at_disposal < 0 {
            return Err(DomainError::validation("book value cannot be negative"));
        }
        let gain_loss = (sale_price - costs_of_disposal) - book_value_at_disposal;
        Ok(Self {
            id,
            asset_id,
            disposal_date,
            sale_price,
            costs_of_disposal,
            book_value_at_disposal,
            gain_loss,
            entry_id,
            scope,
            created_by,
        })
    }

    pub fn id_typed(&self) -> AssetDisposalId {
        self.id
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn disposal_date(&self) -> NaiveDate {
        self.disposal_date
    }

    pub fn sale_price(&self) -> i64 {
        self.sale_price
    }

    pub fn costs_of_disposal(&self) -> i64 {
        self.costs_of_disposal
    }

    pub fn net_proceeds(&self) -> i64 {
        self.sale_price - self.costs_of_disposal
    }

    pub fn book_value_at_disposal(&self) -> i64 {
        self.book_value_at_disposal
    }

    pub fn gain_loss(&self) -> i64 {
        self.gain_loss
    }

    pub fn entry_id(&self) -> AggregateId {
        self.entry_id
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }
}

impl Entity for AssetDisposal {
    type Id = AssetDisposalId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
