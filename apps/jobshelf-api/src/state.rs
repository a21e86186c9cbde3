use std::sync::Arc;

use jobshelf_service::JobShelfService;
use jobshelf_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<JobShelfService>,
}
impl AppState {
	pub async fn new(config: jobshelf_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;
		let service = JobShelfService::new(config, Arc::new(db));

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: JobShelfService) -> Self {
		Self { service: Arc::new(service) }
	}
}
