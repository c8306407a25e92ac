//! Tenant + branch pair every ledger record lives under.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::{BranchId, TenantId};

/// Ownership scope of a record: the tenant and the branch whose books it
/// belongs to.
///
/// Accounts, journal entries and their source records may only reference each
/// other within one scope. The identity layer is trusted to supply the scope;
/// the ledger only enforces equality across references.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub tenant_id: TenantId,
    pub branch_id: BranchId,
}

impl Scope {
    pub fn new(tenant_id: TenantId, branch_id: BranchId) -> Self {
        Self {
            tenant_id,
            branch_id,
        }
    }

    /// Fails with a validation error when `other` belongs to different books.
    pub fn ensure_same(&self, other: &Scope, what: &str) -> DomainResult<()> {
        if self != other {
            return Err(DomainError::validation(format!(
                "{what} belongs to a different tenant or branch"
            )));
        }
        Ok(())
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.branch_id)
    }
}
