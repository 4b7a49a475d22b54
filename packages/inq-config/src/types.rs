use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub embedding: Embedding,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub admin_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Bounds pool acquisition and every catalog call made by the service.
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	/// Empty means the provider is called without an Authorization header.
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Embedding batch scheduling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Embedding {
	pub concurrency: u32,
	pub max_retries: u32,
	pub base_delay_ms: u64,
}
impl Default for Embedding {
	fn default() -> Self {
		Self { concurrency: 3, max_retries: 3, base_delay_ms: 300 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub top_k: u32,
	/// Keyword provider limit as a multiple of `top_k`.
	pub keyword_limit_factor: u32,
	/// Fused list cut as a multiple of `top_k`, applied before reranking.
	pub fused_limit_factor: u32,
	pub rrf_k: u32,
	pub fuzzy: SearchFuzzy,
	pub rerank: SearchRerank,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			top_k: 8,
			keyword_limit_factor: 2,
			fused_limit_factor: 2,
			rrf_k: 60,
			fuzzy: SearchFuzzy::default(),
			rerank: SearchRerank::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchFuzzy {
	pub max_distance: u32,
	pub refresh_ttl_secs: u64,
	pub background_refresh: bool,
}
impl Default for SearchFuzzy {
	fn default() -> Self {
		Self { max_distance: 2, refresh_ttl_secs: 600, background_refresh: false }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchRerank {
	pub enabled: bool,
	pub top_n: u32,
}
impl Default for SearchRerank {
	fn default() -> Self {
		Self { enabled: true, top_n: 12 }
	}
}
