use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use inq_domain::{AssetId, identifier::IdentifierRecord, query_intent::Filters};
use inq_storage::{
	catalog,
	db::Db,
	models::{AssetRow, ModelRow},
	qdrant::{QdrantStore, VectorHit},
};

use crate::{BoxFuture, CatalogStore, Result, VectorStore};

/// Catalog asset as returned to callers and carried as a candidate payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
	pub id: AssetId,
	pub serial_number: Option<String>,
	pub active_number: Option<String>,
	pub status: Option<String>,
	pub comments: Option<String>,
	pub internal_folio: Option<String>,
	#[serde(default, with = "crate::time_serde::option")]
	pub reception_date: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub alta_date: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub baja_date: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	pub model_name: String,
	pub brand_name: String,
	pub type_name: String,
	pub invoice_code: Option<String>,
	pub purchase_order_code: Option<String>,
	pub custom_fields_text: Option<String>,
}
impl AssetRecord {
	pub fn to_payload(&self) -> Result<Value> {
		Ok(serde_json::to_value(self)?)
	}
}
impl From<AssetRow> for AssetRecord {
	fn from(row: AssetRow) -> Self {
		Self {
			id: row.id,
			serial_number: row.serial_number,
			active_number: row.active_number,
			status: row.status,
			comments: row.comments,
			internal_folio: row.internal_folio,
			reception_date: row.reception_date,
			alta_date: row.alta_date,
			baja_date: row.baja_date,
			created_at: row.created_at,
			model_name: row.model_name,
			brand_name: row.brand_name,
			type_name: row.type_name,
			invoice_code: row.invoice_code,
			purchase_order_code: row.purchase_order_code,
			custom_fields_text: row.custom_fields_text,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRecord {
	pub id: AssetId,
	pub model_name: String,
	pub brand_name: String,
	pub type_name: String,
}
impl From<ModelRow> for ModelRecord {
	fn from(row: ModelRow) -> Self {
		Self {
			id: row.id,
			model_name: row.model_name,
			brand_name: row.brand_name,
			type_name: row.type_name,
		}
	}
}

impl CatalogStore for Db {
	fn identifier_snapshot(&self) -> BoxFuture<'_, Result<Vec<IdentifierRecord>>> {
		Box::pin(async move { Ok(catalog::identifier_snapshot(self).await?) })
	}

	fn find_by_identifier<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, Result<Option<AssetRecord>>> {
		Box::pin(async move {
			Ok(catalog::find_by_identifier(self, identifier).await?.map(AssetRecord::from))
		})
	}

	fn keyword_search<'a>(
		&'a self,
		text: &'a str,
		filters: &'a Filters,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssetRecord>>> {
		Box::pin(async move {
			let rows = catalog::keyword_search(self, text, filters, limit).await?;

			Ok(rows.into_iter().map(AssetRecord::from).collect())
		})
	}

	fn fetch_by_ids<'a>(&'a self, ids: &'a [AssetId]) -> BoxFuture<'a, Result<Vec<AssetRecord>>> {
		Box::pin(async move {
			let rows = catalog::fetch_by_ids(self, ids).await?;

			Ok(rows.into_iter().map(AssetRecord::from).collect())
		})
	}

	fn fetch_model(&self, id: AssetId) -> BoxFuture<'_, Result<Option<ModelRecord>>> {
		Box::pin(async move { Ok(catalog::fetch_model(self, id).await?.map(ModelRecord::from)) })
	}
}

impl VectorStore for QdrantStore {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		filters: &'a Filters,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>> {
		Box::pin(async move { Ok(QdrantStore::search(self, vector, filters, limit).await?) })
	}

	fn upsert(
		&self,
		asset_id: AssetId,
		vector: Vec<f32>,
		payload: Value,
	) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { Ok(QdrantStore::upsert(self, asset_id, vector, payload).await?) })
	}
}
