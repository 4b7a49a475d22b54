pub mod fusion;
pub mod identifier;
pub mod query_intent;

/// Catalog primary key of an inventory asset.
pub type AssetId = i64;
