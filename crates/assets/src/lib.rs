//! Fixed assets: categories with depreciation defaults, the asset
//! lifecycle, and disposal records.

pub mod asset;
pub mod category;
pub mod disposal;

pub use asset::{
    Asset, AssetCommand, AssetEvent, AssetId, AssetStatus, MarkAssetDisposed, RecordDepreciation,
    RegisterAsset,
};
pub use category::{AssetCategory, AssetCategoryId, DepreciationMethod};
pub use disposal::{AssetDisposal, AssetDisposalId};
