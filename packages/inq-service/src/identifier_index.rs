//! Shared fuzzy identifier index with lazy build and TTL refresh.
//!
//! Readers clone an `Arc` to the current snapshot and never hold the lock while matching.
//! Rebuilds publish a new snapshot with one write; a failed rebuild leaves the old one serving.
//! While one caller rebuilds, the others keep reading the previous snapshot.

use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use parking_lot::RwLock;
use serde::Serialize;

use inq_domain::identifier::IdentifierIndex;

use crate::{CatalogStore, InqService, Result, bounded_catalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
	/// Distinct normalized identifiers in the new snapshot.
	pub identifiers: usize,
}

#[derive(Clone)]
struct Snapshot {
	index: Arc<IdentifierIndex>,
	// Last build attempt, successful or not.
	checked_at: Instant,
}

pub struct IdentifierIndexHandle {
	ttl: Duration,
	snapshot_timeout: Duration,
	current: RwLock<Option<Snapshot>>,
	refresh_gate: tokio::sync::Mutex<()>,
}
impl IdentifierIndexHandle {
	pub fn new(ttl: Duration, snapshot_timeout: Duration) -> Self {
		Self {
			ttl,
			snapshot_timeout,
			current: RwLock::new(None),
			refresh_gate: tokio::sync::Mutex::new(()),
		}
	}

	pub fn current(&self) -> Option<Arc<IdentifierIndex>> {
		self.current.read().as_ref().map(|snapshot| snapshot.index.clone())
	}

	/// Returns a usable index, building on first use and rebuilding once per TTL window.
	///
	/// Only a failed first build is an error; later failures keep serving the previous snapshot
	/// until the next window. Callers arriving during a rebuild get the previous snapshot
	/// without waiting; only the first build makes them wait.
	pub async fn ensure_fresh(&self, catalog: &dyn CatalogStore) -> Result<Arc<IdentifierIndex>> {
		if let Some(index) = self.fresh() {
			return Ok(index);
		}

		let _gate = match self.refresh_gate.try_lock() {
			Ok(gate) => gate,
			Err(_) => {
				if let Some(stale) = self.current() {
					return Ok(stale);
				}

				self.refresh_gate.lock().await
			},
		};

		// Another caller may have refreshed while this one waited.
		if let Some(index) = self.fresh() {
			return Ok(index);
		}

		match self.rebuild(catalog).await {
			Ok(index) => Ok(index),
			Err(err) => {
				let mut current = self.current.write();
				let Some(snapshot) = current.as_mut() else {
					return Err(err);
				};

				tracing::warn!(
					error = %err,
					"Identifier index refresh failed. Keeping previous index."
				);

				snapshot.checked_at = Instant::now();

				Ok(snapshot.index.clone())
			},
		}
	}

	/// Rebuilds now, regardless of age. On failure the previous snapshot stays in place.
	pub async fn refresh(&self, catalog: &dyn CatalogStore) -> Result<RefreshReport> {
		let _gate = self.refresh_gate.lock().await;
		let index = self.rebuild(catalog).await.inspect_err(|err| {
			tracing::warn!(
				error = %err,
				"Identifier index refresh failed. Keeping previous index."
			);
		})?;

		Ok(RefreshReport { identifiers: index.len() })
	}

	fn fresh(&self) -> Option<Arc<IdentifierIndex>> {
		self.current
			.read()
			.as_ref()
			.filter(|snapshot| snapshot.checked_at.elapsed() < self.ttl)
			.map(|snapshot| snapshot.index.clone())
	}

	async fn rebuild(&self, catalog: &dyn CatalogStore) -> Result<Arc<IdentifierIndex>> {
		let records = bounded_catalog(self.snapshot_timeout, catalog.identifier_snapshot()).await?;
		let index = Arc::new(IdentifierIndex::build(records));

		*self.current.write() = Some(Snapshot { index: index.clone(), checked_at: Instant::now() });

		tracing::info!(identifiers = index.len(), "Identifier index refreshed.");

		Ok(index)
	}
}

impl InqService {
	/// Forces an identifier index rebuild. Used by the admin surface and the background timer.
	pub async fn refresh_identifier_index(&self) -> Result<RefreshReport> {
		self.identifiers.refresh(self.stores.catalog.as_ref()).await
	}
}
