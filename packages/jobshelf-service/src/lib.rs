pub mod category;
pub mod recommend;
pub mod search;
pub mod stores;
pub mod time_serde;
pub mod trending;
pub mod videos;

mod error;

pub use category::CategoryMatch;
pub use error::{Error, Result};
pub use jobshelf_providers::video::Video;
pub use recommend::{BookItem, SearchStage, StageContext, StageOutcome};
pub use search::SearchResponse;
pub use trending::{RefreshOutcome, TrendingCache, TrendingEntry, TrendingSnapshot};

use std::{future::Future, pin::Pin, sync::Arc};

use jobshelf_config::{
	CatalogProviderConfig, Config, EmbeddingProviderConfig, VideoProviderConfig,
};
use jobshelf_domain::trending::JobGroup;
use jobshelf_providers::{
	catalog::{self, CatalogItem, CatalogQuery},
	embedding, video,
};
use jobshelf_storage::{db::Db, models::CategoryRow};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait CatalogProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		query: &'a CatalogQuery,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>>;

	fn list_by_category<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		category_id: i64,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>>;
}

pub trait VideoProvider
where
	Self: Send + Sync,
{
	fn search_videos<'a>(
		&'a self,
		cfg: &'a VideoProviderConfig,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Vec<Video>>>;
}

/// Vector-indexed taxonomy categories.
pub trait CategoryIndex
where
	Self: Send + Sync,
{
	/// Up to `limit` categories ordered by ascending distance to `vec`.
	fn nearest<'a>(&'a self, vec: &'a [f32], limit: u32) -> BoxFuture<'a, Result<Vec<CategoryRow>>>;
}

/// Raw per-classification posting counts for the trending panel.
pub trait TrendingSource
where
	Self: Send + Sync,
{
	fn recent_groups(&self, window: u32) -> BoxFuture<'_, Result<Vec<JobGroup>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub catalog: Arc<dyn CatalogProvider>,
	pub video: Arc<dyn VideoProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		catalog: Arc<dyn CatalogProvider>,
		video: Arc<dyn VideoProvider>,
	) -> Self {
		Self { embedding, catalog, video }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), catalog: provider.clone(), video: provider }
	}
}

pub struct JobShelfService {
	pub cfg: Config,
	pub providers: Providers,
	pub categories: Arc<dyn CategoryIndex>,
	pub trending: Arc<TrendingCache>,
}
impl JobShelfService {
	pub fn new(cfg: Config, db: Arc<Db>) -> Self {
		let trending = Arc::new(TrendingCache::new(db.clone(), &cfg.trending));

		Self { cfg, providers: Providers::default(), categories: db, trending }
	}

	pub fn with_parts(
		cfg: Config,
		providers: Providers,
		categories: Arc<dyn CategoryIndex>,
		trending: Arc<TrendingCache>,
	) -> Self {
		Self { cfg, providers, categories, trending }
	}

	/// Cached trending entries, refreshed first when the cache is empty or stale.
	pub async fn trending(&self) -> TrendingSnapshot {
		self.trending.get_cached().await
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl CatalogProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		query: &'a CatalogQuery,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move { Ok(catalog::search(cfg, query).await?) })
	}

	fn list_by_category<'a>(
		&'a self,
		cfg: &'a CatalogProviderConfig,
		category_id: i64,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move { Ok(catalog::list_by_category(cfg, category_id, max_results).await?) })
	}
}

impl VideoProvider for DefaultProviders {
	fn search_videos<'a>(
		&'a self,
		cfg: &'a VideoProviderConfig,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Vec<Video>>> {
		Box::pin(async move { Ok(video::search_videos(cfg, keyword).await?) })
	}
}
