use serde::{Deserialize, Serialize};

use inq_domain::AssetId;

use crate::{
	AssetRecord, BatchOptions, EmbedOutcome, Error, InqService, Result, bounded_catalog,
	bounded_vectors, embedding_batch, rerank,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexRequest {
	pub id: AssetId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexReport {
	pub id: AssetId,
	pub dimensions: u32,
}

impl InqService {
	/// Re-embeds one catalog asset and replaces its vector point.
	pub async fn reindex_asset(&self, req: ReindexRequest) -> Result<ReindexReport> {
		let ids = [req.id];
		let rows =
			bounded_catalog(self.catalog_timeout(), self.stores.catalog.fetch_by_ids(&ids)).await?;
		let Some(asset) = rows.into_iter().find(|asset| asset.id == req.id) else {
			return Err(Error::NotFound { message: format!("Asset {} does not exist.", req.id) });
		};
		let payload = asset.to_payload()?;
		let texts = [document_text(&asset, &payload)];
		let opts = BatchOptions::from_config(&self.cfg);
		let mut outcomes = embedding_batch::embed_batch(
			self.providers.embedding.as_ref(),
			&self.cfg.providers.embedding,
			&texts,
			&opts,
		)
		.await;
		let vector = match outcomes.pop() {
			Some(EmbedOutcome::Embedded { vector }) => vector,
			Some(EmbedOutcome::Failed { error }) => return Err(Error::Provider { message: error }),
			None => {
				return Err(Error::Provider { message: "Embedding batch was empty.".to_string() });
			},
		};

		let upsert = self.stores.vectors.upsert(asset.id, vector, payload);

		bounded_vectors(self.vector_timeout(), upsert).await?;

		tracing::info!(asset_id = asset.id, "Asset vector reindexed.");

		Ok(ReindexReport { id: asset.id, dimensions: self.cfg.providers.embedding.dimensions })
	}
}

fn document_text(asset: &AssetRecord, payload: &serde_json::Value) -> String {
	let mut text = rerank::candidate_text(payload);

	for extra in [&asset.comments, &asset.custom_fields_text].into_iter().flatten() {
		let extra = extra.trim();

		if !extra.is_empty() {
			text.push('\n');
			text.push_str(extra);
		}
	}

	text
}

#[cfg(test)]
mod tests {
	use time::OffsetDateTime;

	use super::*;

	#[test]
	fn document_text_appends_free_text_fields() {
		let asset = AssetRecord {
			id: 7,
			serial_number: Some("MXL4455XYZ".to_string()),
			active_number: None,
			status: Some("ALTA".to_string()),
			comments: Some("  Sala de juntas  ".to_string()),
			internal_folio: None,
			reception_date: None,
			alta_date: None,
			baja_date: None,
			created_at: OffsetDateTime::UNIX_EPOCH,
			model_name: "ProDesk 600".to_string(),
			brand_name: "HP".to_string(),
			type_name: "Computadora".to_string(),
			invoice_code: None,
			purchase_order_code: None,
			custom_fields_text: Some(String::new()),
		};
		let payload = asset.to_payload().expect("Failed to encode payload.");

		assert_eq!(
			document_text(&asset, &payload),
			"HP ProDesk 600 [Computadora] SN:MXL4455XYZ ST:ALTA\nSala de juntas"
		);
	}
}
