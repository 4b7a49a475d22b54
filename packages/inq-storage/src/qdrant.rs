use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	QdrantError,
	client::Payload,
	qdrant::{
		Condition, Filter, PointId, PointStruct, Query, QueryPointsBuilder, UpsertPointsBuilder,
		Value, point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::{Map, Value as JsonValue};

use inq_domain::{AssetId, query_intent::Filters};

use crate::Result;

/// Payload key holding the catalog id of the point's asset.
pub const ASSET_ID_KEY: &str = "id";

#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
	pub asset_id: AssetId,
	pub score: f32,
}

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &inq_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Nearest neighbours of `vector`, best first, restricted to points whose payload matches
	/// every present facet. A missing collection reads as empty.
	pub async fn search(
		&self,
		vector: Vec<f32>,
		filters: &Filters,
		limit: u32,
	) -> Result<Vec<VectorHit>> {
		check_dimensions(&vector, self.vector_dim)?;

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.with_payload(true)
			.limit(u64::from(limit));

		if let Some(filter) = facet_filter(filters) {
			search = search.filter(filter);
		}

		let response = match self.client.query(search).await {
			Ok(response) => response,
			Err(err) if is_missing_collection_error(&err) => {
				tracing::warn!(
					error = %err,
					collection = %self.collection,
					"Vector collection is missing. Returning no semantic hits."
				);

				return Ok(Vec::new());
			},
			Err(err) => return Err(err.into()),
		};
		let hits = response
			.result
			.into_iter()
			.filter_map(|point| {
				let asset_id = point_asset_id(point.id.as_ref(), &point.payload)?;

				Some(VectorHit { asset_id, score: point.score })
			})
			.collect();

		Ok(hits)
	}

	/// Writes one asset point keyed by its catalog id.
	pub async fn upsert(
		&self,
		asset_id: AssetId,
		vector: Vec<f32>,
		payload: JsonValue,
	) -> Result<()> {
		check_dimensions(&vector, self.vector_dim)?;

		let point_id = u64::try_from(asset_id).map_err(|_| {
			crate::Error::InvalidArgument(format!("Asset id {asset_id} cannot be a point id."))
		})?;
		let payload = Payload::from(point_payload(asset_id, payload)?);
		let point = PointStruct::new(point_id, vector, payload);

		self.client
			.upsert_points(
				UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true),
			)
			.await?;

		Ok(())
	}
}

fn check_dimensions(vector: &[f32], expected: u32) -> Result<()> {
	if vector.len() != expected as usize {
		return Err(crate::Error::InvalidArgument(format!(
			"Vector has {} dimensions, expected {expected}.",
			vector.len()
		)));
	}

	Ok(())
}

/// Object payload with the asset id stored under [`ASSET_ID_KEY`].
fn point_payload(asset_id: AssetId, payload: JsonValue) -> Result<Map<String, JsonValue>> {
	let JsonValue::Object(mut map) = payload else {
		return Err(crate::Error::InvalidArgument(
			"Point payload must be a JSON object.".to_string(),
		));
	};

	map.insert(ASSET_ID_KEY.to_string(), JsonValue::from(asset_id));

	Ok(map)
}

fn facet_filter(filters: &Filters) -> Option<Filter> {
	let conditions = filters
		.iter()
		.map(|(facet, value)| Condition::matches(facet.payload_key(), value.to_string()))
		.collect::<Vec<_>>();

	if conditions.is_empty() { None } else { Some(Filter::must(conditions)) }
}

fn is_missing_collection_error(err: &QdrantError) -> bool {
	let message = err.to_string().to_lowercase();

	(message.contains("not found") || message.contains("404"))
		&& (message.contains("collection") || message.contains("doesn't exist"))
}

/// Prefers the payload id and falls back to a numeric point id.
fn point_asset_id(point_id: Option<&PointId>, payload: &HashMap<String, Value>) -> Option<AssetId> {
	if let Some(value) = payload.get(ASSET_ID_KEY) {
		let from_payload = match &value.kind {
			Some(Kind::IntegerValue(id)) => Some(*id),
			Some(Kind::DoubleValue(id)) if id.fract() == 0.0 => Some(*id as i64),
			Some(Kind::StringValue(id)) => id.trim().parse().ok(),
			_ => None,
		};

		if from_payload.is_some() {
			return from_payload;
		}
	}

	match point_id.and_then(|id| id.point_id_options.as_ref()) {
		Some(PointIdOptions::Num(id)) => AssetId::try_from(*id).ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn value(kind: Kind) -> Value {
		Value { kind: Some(kind) }
	}

	fn numeric_point(id: u64) -> PointId {
		PointId { point_id_options: Some(PointIdOptions::Num(id)) }
	}

	#[test]
	fn reads_asset_id_from_payload_shapes() {
		let mut payload = HashMap::new();

		payload.insert(ASSET_ID_KEY.to_string(), value(Kind::IntegerValue(42)));
		assert_eq!(point_asset_id(None, &payload), Some(42));

		payload.insert(ASSET_ID_KEY.to_string(), value(Kind::DoubleValue(17.0)));
		assert_eq!(point_asset_id(None, &payload), Some(17));

		payload.insert(ASSET_ID_KEY.to_string(), value(Kind::StringValue("305".to_string())));
		assert_eq!(point_asset_id(None, &payload), Some(305));
	}

	#[test]
	fn falls_back_to_numeric_point_id() {
		let mut payload = HashMap::new();

		payload.insert(ASSET_ID_KEY.to_string(), value(Kind::StringValue("n/a".to_string())));

		assert_eq!(point_asset_id(Some(&numeric_point(8)), &payload), Some(8));
		assert_eq!(point_asset_id(Some(&numeric_point(8)), &HashMap::new()), Some(8));
		assert_eq!(point_asset_id(None, &HashMap::new()), None);
	}

	#[test]
	fn point_payload_carries_asset_id() {
		let payload =
			point_payload(9, serde_json::json!({ "brandName": "HP" })).expect("Object payload.");

		assert_eq!(payload.get(ASSET_ID_KEY), Some(&serde_json::json!(9)));
		assert_eq!(payload.get("brandName"), Some(&serde_json::json!("HP")));
		assert!(point_payload(9, serde_json::json!([1, 2])).is_err());
	}

	#[test]
	fn rejects_wrong_dimensions() {
		assert!(check_dimensions(&[0.1, 0.2], 2).is_ok());
		assert!(matches!(check_dimensions(&[0.1], 2), Err(crate::Error::InvalidArgument(_))));
	}

	#[test]
	fn filter_has_one_condition_per_facet() {
		let filters = Filters {
			brand_name: Some("HP".to_string()),
			type_name: None,
			status: Some("ALTA".to_string()),
		};
		let filter = facet_filter(&filters).expect("Expected a filter.");

		assert_eq!(filter.must.len(), 2);
		assert!(facet_filter(&Filters::default()).is_none());
	}
}
