use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use inq_domain::{
	fusion::{self, Candidate, Provenance},
	identifier::IdentifierMatch,
	query_intent::{self, Filters, ParsedQuery},
};

use crate::{
	Error, InqService, Result, bounded_catalog, bounded_vectors,
	embedding_batch::{self, BatchOptions, EmbedOutcome},
	rerank::{self, RerankOutcome, RerankedResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
	SerialExact,
	SerialFuzzy,
	Hybrid,
}
impl SearchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SerialExact => "serial-exact",
			Self::SerialFuzzy => "serial-fuzzy",
			Self::Hybrid => "hybrid",
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub q: String,
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fused_score: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relevance_score: Option<f64>,
	pub asset: Value,
}
impl From<RerankedResult> for SearchResult {
	fn from(result: RerankedResult) -> Self {
		Self {
			id: result.id,
			fused_score: Some(result.fused_score),
			relevance_score: result.relevance_score,
			asset: result.payload,
		}
	}
}

/// The classifier's view of a hybrid query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedEcho {
	pub text: String,
	pub filters: Filters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub mode: SearchMode,
	pub query: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parsed: Option<ParsedEcho>,
	pub results: Vec<SearchResult>,
	pub suggestions: Vec<IdentifierMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestRequest {
	pub token: String,
	pub top_k: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
	pub token: String,
	pub suggestions: Vec<IdentifierMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
	pub texts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedResponse {
	pub dimensions: u32,
	pub outcomes: Vec<EmbedOutcome>,
}

impl InqService {
	/// Classifies the query and answers from exactly one path: an exact identifier hit, fuzzy
	/// identifier suggestions, or fused and reranked semantic plus keyword results.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let query = req.q.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "q must be non-empty.".to_string() });
		}

		let top_k = self.resolve_top_k(req.top_k)?;
		let trace_id = Uuid::new_v4();
		let parsed = query_intent::classify(&query);

		if let Some(identifier) = parsed.candidate_identifier.as_deref() {
			let exact = bounded_catalog(
				self.catalog_timeout(),
				self.stores.catalog.find_by_identifier(identifier),
			)
			.await?;

			if let Some(asset) = exact {
				tracing::info!(
					%trace_id,
					mode = SearchMode::SerialExact.as_str(),
					"Search answered."
				);

				let result = SearchResult {
					id: asset.id.to_string(),
					fused_score: None,
					relevance_score: None,
					asset: asset.to_payload()?,
				};

				return Ok(SearchResponse {
					trace_id,
					mode: SearchMode::SerialExact,
					query,
					parsed: None,
					results: vec![result],
					suggestions: Vec::new(),
				});
			}

			let suggestions = self.lookup_identifier(identifier, top_k).await?;

			tracing::info!(
				%trace_id,
				mode = SearchMode::SerialFuzzy.as_str(),
				suggestions = suggestions.len(),
				"Search answered."
			);

			return Ok(SearchResponse {
				trace_id,
				mode: SearchMode::SerialFuzzy,
				query,
				parsed: None,
				results: Vec::new(),
				suggestions,
			});
		}

		let results = self.hybrid(&parsed, top_k).await?;

		tracing::info!(
			%trace_id,
			mode = SearchMode::Hybrid.as_str(),
			results = results.len(),
			"Search answered."
		);

		Ok(SearchResponse {
			trace_id,
			mode: SearchMode::Hybrid,
			query,
			parsed: Some(ParsedEcho { text: parsed.normalized_text, filters: parsed.filters }),
			results,
			suggestions: Vec::new(),
		})
	}

	pub async fn suggest_identifiers(&self, req: SuggestRequest) -> Result<SuggestResponse> {
		let token = req.token.trim().to_string();

		if token.is_empty() {
			return Err(Error::InvalidRequest { message: "token must be non-empty.".to_string() });
		}

		let top_k = self.resolve_top_k(req.top_k)?;
		let suggestions = self.lookup_identifier(&token, top_k).await?;

		Ok(SuggestResponse { token, suggestions })
	}

	/// Embeds texts through the batcher with the configured pool size and retry policy.
	pub async fn embed_texts(&self, req: EmbedRequest) -> Result<EmbedResponse> {
		if req.texts.is_empty() {
			return Err(Error::InvalidRequest { message: "texts must be non-empty.".to_string() });
		}

		let opts = BatchOptions::from_config(&self.cfg);
		let outcomes = embedding_batch::embed_batch(
			self.providers.embedding.as_ref(),
			&self.cfg.providers.embedding,
			&req.texts,
			&opts,
		)
		.await;

		Ok(EmbedResponse { dimensions: self.cfg.providers.embedding.dimensions, outcomes })
	}

	async fn lookup_identifier(&self, token: &str, top_k: u32) -> Result<Vec<IdentifierMatch>> {
		let index = self.identifiers.ensure_fresh(self.stores.catalog.as_ref()).await?;

		Ok(index.lookup(token, self.cfg.search.fuzzy.max_distance, top_k as usize))
	}

	async fn hybrid(&self, parsed: &ParsedQuery, top_k: u32) -> Result<Vec<SearchResult>> {
		let search_cfg = &self.cfg.search;
		let keyword_limit = top_k.saturating_mul(search_cfg.keyword_limit_factor);
		// Joined, not raced: a failing side never cancels the other.
		let (semantic, keyword) = tokio::join!(
			self.semantic_candidates(parsed, top_k),
			self.keyword_candidates(parsed, keyword_limit),
		);
		let lists = [semantic?, keyword?];
		let mut fused = fusion::fuse(&lists, search_cfg.rrf_k);

		fused.truncate(top_k.saturating_mul(search_cfg.fused_limit_factor) as usize);

		let ranked = if search_cfg.rerank.enabled {
			let outcome = rerank::rerank(
				self.providers.generation.as_ref(),
				&self.cfg.providers.llm,
				&parsed.normalized_text,
				fused,
				search_cfg.rerank.top_n as usize,
			)
			.await;

			if let RerankOutcome::Degraded { reason, .. } = &outcome {
				tracing::warn!(reason = %reason, "Reranker degraded. Using fused order.");
			}

			outcome.into_results()
		} else {
			fused.into_iter().map(RerankedResult::from).collect()
		};

		Ok(ranked.into_iter().take(top_k as usize).map(SearchResult::from).collect())
	}

	/// Vector hits hydrated from the catalog, in vector-store order.
	///
	/// A query embedding that fails after retries yields no semantic candidates.
	async fn semantic_candidates(
		&self,
		parsed: &ParsedQuery,
		top_k: u32,
	) -> Result<Vec<Candidate>> {
		let opts = BatchOptions { concurrency: 1, ..BatchOptions::from_config(&self.cfg) };
		let texts = [parsed.normalized_text.clone()];
		let outcome = embedding_batch::embed_batch(
			self.providers.embedding.as_ref(),
			&self.cfg.providers.embedding,
			&texts,
			&opts,
		)
		.await
		.into_iter()
		.next();
		let Some(vector) = outcome.and_then(EmbedOutcome::into_vector) else {
			tracing::warn!("Query embedding failed. Skipping semantic search.");

			return Ok(Vec::new());
		};
		let hits = bounded_vectors(
			self.vector_timeout(),
			self.stores.vectors.search(vector, &parsed.filters, top_k),
		)
		.await?;

		if hits.is_empty() {
			return Ok(Vec::new());
		}

		let ids = hits.iter().map(|hit| hit.asset_id).collect::<Vec<_>>();
		let rows =
			bounded_catalog(self.catalog_timeout(), self.stores.catalog.fetch_by_ids(&ids)).await?;
		let mut assets = rows
			.into_iter()
			.map(|asset| (asset.id, asset))
			.collect::<HashMap<_, _>>();
		let mut candidates = Vec::with_capacity(hits.len());

		for hit in hits {
			let Some(asset) = assets.remove(&hit.asset_id) else {
				continue;
			};

			candidates.push(Candidate {
				id: asset.id.to_string(),
				score: hit.score,
				provenance: Provenance::Semantic,
				payload: asset.to_payload()?,
			});
		}

		Ok(candidates)
	}

	async fn keyword_candidates(&self, parsed: &ParsedQuery, limit: u32) -> Result<Vec<Candidate>> {
		let assets = bounded_catalog(
			self.catalog_timeout(),
			self.stores.catalog.keyword_search(&parsed.normalized_text, &parsed.filters, limit),
		)
		.await?;
		let mut candidates = Vec::with_capacity(assets.len());

		for (rank, asset) in assets.into_iter().enumerate() {
			candidates.push(Candidate {
				id: asset.id.to_string(),
				score: 1.0 / (rank as f32 + 1.0),
				provenance: Provenance::Keyword,
				payload: asset.to_payload()?,
			});
		}

		Ok(candidates)
	}

	fn resolve_top_k(&self, requested: Option<u32>) -> Result<u32> {
		let top_k = requested.unwrap_or(self.cfg.search.top_k);

		if top_k == 0 {
			return Err(Error::InvalidRequest {
				message: "top_k must be greater than zero.".to_string(),
			});
		}

		Ok(top_k)
	}
}
