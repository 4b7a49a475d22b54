use std::sync::Arc;

use inq_service::InqService;
use inq_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<InqService>,
}
impl AppState {
	pub async fn new(config: inq_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;

		Ok(Self::from_service(InqService::new(config, db, qdrant)))
	}

	pub fn from_service(service: InqService) -> Self {
		Self { service: Arc::new(service) }
	}
}
