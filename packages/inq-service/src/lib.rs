pub mod catalog;
pub mod embedding_batch;
pub mod identifier_index;
pub mod model_specs;
pub mod reindex;
pub mod rerank;
pub mod search;
pub mod time_serde;

mod error;

pub use catalog::{AssetRecord, ModelRecord};
pub use embedding_batch::{BatchOptions, EmbedOutcome};
pub use error::{Error, Result};
pub use identifier_index::{IdentifierIndexHandle, RefreshReport};
pub use model_specs::{ModelSpecsRequest, ModelSpecsResponse};
pub use reindex::{ReindexReport, ReindexRequest};
pub use rerank::{RerankOutcome, RerankedResult};
pub use search::{
	EmbedRequest, EmbedResponse, ParsedEcho, SearchMode, SearchRequest, SearchResponse,
	SearchResult, SuggestRequest, SuggestResponse,
};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use inq_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use inq_domain::{AssetId, identifier::IdentifierRecord, query_intent::Filters};
use inq_providers::{embedding, generation};
use inq_storage::{db::Db, qdrant::{QdrantStore, VectorHit}};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Text to vector inference, one text per call.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

/// Prompt to text completion. Output has no structural guarantee.
pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>>;
}

pub trait CatalogStore
where
	Self: Send + Sync,
{
	/// Every identifier field of every enabled asset.
	fn identifier_snapshot(&self) -> BoxFuture<'_, Result<Vec<IdentifierRecord>>>;

	fn find_by_identifier<'a>(
		&'a self,
		identifier: &'a str,
	) -> BoxFuture<'a, Result<Option<AssetRecord>>>;

	/// Ranked best first.
	fn keyword_search<'a>(
		&'a self,
		text: &'a str,
		filters: &'a Filters,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<AssetRecord>>>;

	fn fetch_by_ids<'a>(&'a self, ids: &'a [AssetId]) -> BoxFuture<'a, Result<Vec<AssetRecord>>>;

	fn fetch_model(&self, id: AssetId) -> BoxFuture<'_, Result<Option<ModelRecord>>>;
}

pub trait VectorStore
where
	Self: Send + Sync,
{
	/// Ranked best first.
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		filters: &'a Filters,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<VectorHit>>>;

	/// Inserts or replaces the point for `asset_id`. `payload` must be a JSON object.
	fn upsert(
		&self,
		asset_id: AssetId,
		vector: Vec<f32>,
		payload: serde_json::Value,
	) -> BoxFuture<'_, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

#[derive(Clone)]
pub struct Stores {
	pub catalog: Arc<dyn CatalogStore>,
	pub vectors: Arc<dyn VectorStore>,
}
impl Stores {
	pub fn new(catalog: Arc<dyn CatalogStore>, vectors: Arc<dyn VectorStore>) -> Self {
		Self { catalog, vectors }
	}
}

pub struct InqService {
	pub cfg: Config,
	pub stores: Stores,
	pub providers: Providers,
	pub identifiers: IdentifierIndexHandle,
}
impl InqService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		Self::with_parts(cfg, Stores::new(Arc::new(db), Arc::new(qdrant)), Providers::default())
	}

	pub fn with_parts(cfg: Config, stores: Stores, providers: Providers) -> Self {
		let identifiers = IdentifierIndexHandle::new(
			Duration::from_secs(cfg.search.fuzzy.refresh_ttl_secs),
			Duration::from_millis(cfg.storage.postgres.timeout_ms),
		);

		Self { cfg, stores, providers, identifiers }
	}

	pub(crate) fn catalog_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.storage.postgres.timeout_ms)
	}

	pub(crate) fn vector_timeout(&self) -> Duration {
		Duration::from_millis(self.cfg.storage.qdrant.timeout_ms)
	}
}

/// Runs a catalog call under `limit`; an elapsed deadline is a storage error.
pub(crate) async fn bounded_catalog<T>(
	limit: Duration,
	call: BoxFuture<'_, Result<T>>,
) -> Result<T> {
	match tokio::time::timeout(limit, call).await {
		Ok(result) => result,
		Err(_) => Err(Error::Storage {
			message: format!("Catalog call timed out after {} ms.", limit.as_millis()),
		}),
	}
}

/// Runs a vector store call under `limit`; an elapsed deadline is a Qdrant error.
pub(crate) async fn bounded_vectors<T>(
	limit: Duration,
	call: BoxFuture<'_, Result<T>>,
) -> Result<T> {
	match tokio::time::timeout(limit, call).await {
		Ok(result) => result,
		Err(_) => Err(Error::Qdrant {
			message: format!("Vector store call timed out after {} ms.", limit.as_millis()),
		}),
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, text).await?) })
	}
}
impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(generation::generate(cfg, prompt).await?) })
	}
}
