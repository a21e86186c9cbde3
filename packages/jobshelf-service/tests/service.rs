use std::{
	collections::VecDeque,
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use serde_json::Map;
use time::{Duration, OffsetDateTime};
use tokio::sync::Notify;

use jobshelf_config::{
	CatalogProviderConfig, Config, EmbeddingProviderConfig, Postgres, Providers as ProviderConfigs,
	Search, Service, Storage, Trending, VideoProviderConfig,
};
use jobshelf_domain::trending::JobGroup;
use jobshelf_providers::{
	catalog::{CatalogItem, CatalogQuery},
	video::Video,
};
use jobshelf_service::{
	BoxFuture, CatalogProvider, CategoryIndex, EmbeddingProvider, Error, JobShelfService,
	Providers, RefreshOutcome, Result, TrendingCache, TrendingSource, VideoProvider,
	search::{REASON_CATEGORY_ID_UNPARSED, REASON_CATEGORY_RESOLUTION_FAILED, REASON_NO_CATEGORY_MATCH},
};
use jobshelf_storage::models::CategoryRow;

const DIMENSIONS: u32 = 4;

#[derive(Default)]
struct FakeEmbedding {
	calls: AtomicUsize,
	fail: bool,
	wrong_dimensions: bool,
}
impl FakeEmbedding {
	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for FakeEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = if self.wrong_dimensions { cfg.dimensions as usize + 1 } else { cfg.dimensions as usize };
		let fail = self.fail;

		Box::pin(async move {
			if fail {
				return Err(Error::Provider { message: "embedding service unavailable".to_string() });
			}

			Ok(vec![vec![0.5; dim]; texts.len()])
		})
	}
}

#[derive(Default)]
struct FakeIndex {
	rows: Vec<CategoryRow>,
	calls: AtomicUsize,
	limits: Mutex<Vec<u32>>,
}
impl FakeIndex {
	fn with_category(cid: &str, path: &str) -> Self {
		Self {
			rows: vec![
				CategoryRow { cid: cid.to_string(), full_path: path.to_string() },
				CategoryRow { cid: "999".to_string(), full_path: "국내도서/기타".to_string() },
			],
			..Default::default()
		}
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl CategoryIndex for FakeIndex {
	fn nearest<'a>(&'a self, _vec: &'a [f32], limit: u32) -> BoxFuture<'a, Result<Vec<CategoryRow>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.limits.lock().expect("limits lock poisoned").push(limit);

		let rows = self.rows.clone();

		Box::pin(async move { Ok(rows) })
	}
}

#[derive(Default)]
struct FakeCatalog {
	search_batches: Mutex<VecDeque<Result<Vec<CatalogItem>>>>,
	bestsellers: Vec<CatalogItem>,
	queries: Mutex<Vec<CatalogQuery>>,
	listed: Mutex<Vec<i64>>,
}
impl FakeCatalog {
	fn scripted(batches: Vec<Result<Vec<CatalogItem>>>) -> Self {
		Self { search_batches: Mutex::new(batches.into()), ..Default::default() }
	}

	fn queries(&self) -> Vec<CatalogQuery> {
		self.queries.lock().expect("queries lock poisoned").clone()
	}

	fn listed(&self) -> Vec<i64> {
		self.listed.lock().expect("listed lock poisoned").clone()
	}
}
impl CatalogProvider for FakeCatalog {
	fn search<'a>(
		&'a self,
		_cfg: &'a CatalogProviderConfig,
		query: &'a CatalogQuery,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		self.queries.lock().expect("queries lock poisoned").push(query.clone());

		let batch =
			self.search_batches.lock().expect("batches lock poisoned").pop_front().unwrap_or(Ok(Vec::new()));

		Box::pin(async move { batch })
	}

	fn list_by_category<'a>(
		&'a self,
		_cfg: &'a CatalogProviderConfig,
		category_id: i64,
		max_results: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		self.listed.lock().expect("listed lock poisoned").push(category_id);

		let items = self.bestsellers.iter().take(max_results as usize + 2).cloned().collect();

		Box::pin(async move { Ok(items) })
	}
}

#[derive(Default)]
struct FakeVideo {
	calls: AtomicUsize,
}
impl VideoProvider for FakeVideo {
	fn search_videos<'a>(
		&'a self,
		_cfg: &'a VideoProviderConfig,
		keyword: &'a str,
	) -> BoxFuture<'a, Result<Vec<Video>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let video = Video {
			id: "v1".to_string(),
			title: format!("{keyword} 직업 소개"),
			channel_title: "커리어".to_string(),
			thumbnail: None,
			description: String::new(),
			published_at: None,
			url: "https://www.youtube.com/watch?v=v1".to_string(),
		};

		Box::pin(async move { Ok(vec![video]) })
	}
}

#[derive(Default)]
struct StaticSource {
	calls: AtomicUsize,
	fail: AtomicBool,
}
impl StaticSource {
	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TrendingSource for StaticSource {
	fn recent_groups(&self, _window: u32) -> BoxFuture<'_, Result<Vec<JobGroup>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let fail = self.fail.load(Ordering::SeqCst);

		Box::pin(async move {
			if fail {
				return Err(Error::Storage { message: "connection reset".to_string() });
			}

			Ok(vec![group("상담원", "A1", 10), group("요양보호사 돌봄", "B2", 10), group("조리사", "C3", 3)])
		})
	}
}

#[derive(Default)]
struct BlockingSource {
	calls: AtomicUsize,
	entered: Notify,
	release: Notify,
}
impl TrendingSource for BlockingSource {
	fn recent_groups(&self, _window: u32) -> BoxFuture<'_, Result<Vec<JobGroup>>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.entered.notify_one();
			self.release.notified().await;

			Ok(vec![group("상담원", "A1", 4)])
		})
	}
}

struct Harness {
	service: JobShelfService,
	embedding: Arc<FakeEmbedding>,
	index: Arc<FakeIndex>,
	catalog: Arc<FakeCatalog>,
	video: Arc<FakeVideo>,
}

fn group(name: &str, code: &str, raw_count: i64) -> JobGroup {
	JobGroup { job_name: name.to_string(), job_code: code.to_string(), raw_count }
}

fn item(id: i64, title: &str) -> CatalogItem {
	CatalogItem { item_id: id, title: title.to_string(), ..Default::default() }
}

fn items(ids: impl IntoIterator<Item = i64>) -> Vec<CatalogItem> {
	ids.into_iter().map(|id| item(id, &format!("book {id}"))).collect()
}

fn ids(service_books: &[jobshelf_service::BookItem]) -> Vec<i64> {
	service_books.iter().map(|book| book.item_id).collect()
}

fn video_config() -> VideoProviderConfig {
	VideoProviderConfig {
		api_base: "http://127.0.0.1:1".to_string(),
		api_key: "video-key".to_string(),
		path: "/youtube/v3/search".to_string(),
		max_results: 6,
		query_suffix: "직업 취업 교육 가이드".to_string(),
		region_code: "KR".to_string(),
		relevance_language: "ko".to_string(),
		timeout_ms: 1_000,
	}
}

fn test_config(video: Option<VideoProviderConfig>) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		providers: ProviderConfigs {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "key".to_string(),
				path: "/embeddings".to_string(),
				model: "test-embedding".to_string(),
				dimensions: DIMENSIONS,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			catalog: CatalogProviderConfig {
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "ttb".to_string(),
				search_path: "/ttb/api/ItemSearch.aspx".to_string(),
				list_path: "/ttb/api/ItemList.aspx".to_string(),
				search_target: "Book".to_string(),
				cover: "Big".to_string(),
				version: "20131101".to_string(),
				timeout_ms: 1_000,
			},
			video,
		},
		search: Search::default(),
		trending: Trending::default(),
	}
}

fn harness(embedding: FakeEmbedding, index: FakeIndex, catalog: FakeCatalog) -> Harness {
	let cfg = test_config(Some(video_config()));
	let embedding = Arc::new(embedding);
	let index = Arc::new(index);
	let catalog = Arc::new(catalog);
	let video = Arc::new(FakeVideo::default());
	let trending = Arc::new(TrendingCache::new(Arc::new(StaticSource::default()), &cfg.trending));
	let providers = Providers::new(embedding.clone(), catalog.clone(), video.clone());
	let service = JobShelfService::with_parts(cfg, providers, index.clone(), trending);

	Harness { service, embedding, index, catalog, video }
}

fn counseling_index() -> FakeIndex {
	FakeIndex::with_category("100", "국내도서/사회과학/심리학")
}

#[tokio::test]
async fn full_first_stage_returns_after_one_search() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![Ok(items(1..=12))]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(response.category_id, Some(100));
	assert_eq!(response.category_path.as_deref(), Some("국내도서/사회과학/심리학"));
	assert_eq!(ids(&response.books), (1..=10).collect::<Vec<_>>());
	assert_eq!(response.reason, None);
	assert_eq!(h.catalog.queries().len(), 1);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn stages_merge_unique_items_in_first_found_order() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![Ok(items([1, 2])), Ok(items([2, 3])), Ok(items([3, 1, 4]))]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(ids(&response.books), vec![1, 2, 3, 4]);
	assert_eq!(h.catalog.queries().len(), 3);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn full_leaf_hint_stage_skips_broad_search() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![Ok(items(1..=6)), Ok(items(5..=12)), Ok(items(20..=30))]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(ids(&response.books), (1..=10).collect::<Vec<_>>());
	assert_eq!(h.catalog.queries().len(), 2);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn merged_stages_are_capped_after_broad_search() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![Ok(items(1..=4)), Ok(items(5..=8)), Ok(items(9..=15))]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(ids(&response.books), (1..=10).collect::<Vec<_>>());
	assert_eq!(h.catalog.queries().len(), 3);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn huge_ttl_does_not_overflow_snapshot() {
	let trending = Trending { interval_secs: 1_000_000_000_000, ..Default::default() };
	let cache = TrendingCache::new(Arc::new(StaticSource::default()), &trending);
	let snapshot = cache.get_cached().await;

	assert_eq!(snapshot.entries.len(), 3);
	assert!(snapshot.last_updated.is_some());
	assert_eq!(snapshot.next_update, None);
}

#[tokio::test]
async fn stage_queries_are_refined_and_widened() {
	let h = harness(
		FakeEmbedding::default(),
		FakeIndex::with_category("200", "국내도서/경제경영/마케팅"),
		FakeCatalog::scripted(vec![Ok(items([1]))]),
	);

	h.service.resolve_and_search("상담원 등 관련 분야").await;

	let queries = h.catalog.queries();

	assert_eq!(queries.len(), 3);
	assert_eq!(queries[0].query, "상담원");
	assert_eq!(queries[0].category_id, Some(200));
	assert_eq!(queries[1].query, "상담원 마케팅");
	assert_eq!(queries[1].category_id, None);
	assert_eq!(queries[2].query, "상담원");
	assert_eq!(queries[2].category_id, None);
	assert!(queries.iter().all(|query| query.max_results == 10));
	assert_eq!(*h.index.limits.lock().expect("limits lock poisoned"), vec![5]);
}

#[tokio::test]
async fn empty_stages_fall_back_to_bestsellers_once() {
	let mut bestsellers = vec![item(0, ""), item(5, "  ")];

	bestsellers.extend(items(10..30));

	let catalog = FakeCatalog { bestsellers, ..Default::default() };
	let h = harness(FakeEmbedding::default(), counseling_index(), catalog);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(h.catalog.queries().len(), 3);
	assert_eq!(h.catalog.listed(), vec![100]);
	assert_eq!(response.books.len(), 10);
	assert_eq!(response.books[0].item_id, 0);
	assert_eq!(response.books[1].item_id, 5);
}

#[tokio::test]
async fn malformed_items_are_filtered_before_returning() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![Ok(vec![item(1, "상담의 기술"), item(2, "  "), item(0, "no id")])]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(ids(&response.books), vec![1]);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn failing_stage_contributes_nothing() {
	let h = harness(
		FakeEmbedding::default(),
		counseling_index(),
		FakeCatalog::scripted(vec![
			Err(Error::Provider { message: "timeout".to_string() }),
			Ok(items([7])),
		]),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(ids(&response.books), vec![7]);
	assert_eq!(h.catalog.queries().len(), 3);
}

#[tokio::test]
async fn blank_keyword_makes_no_external_calls() {
	let h = harness(FakeEmbedding::default(), counseling_index(), FakeCatalog::default());
	let response = h.service.resolve_and_search("   ").await;

	assert_eq!(response.category_id, None);
	assert!(response.books.is_empty());
	assert_eq!(response.reason, None);
	assert_eq!(h.embedding.count(), 0);
	assert_eq!(h.index.count(), 0);
	assert!(h.catalog.queries().is_empty());
}

#[tokio::test]
async fn empty_index_reports_no_category_match() {
	let h = harness(FakeEmbedding::default(), FakeIndex::default(), FakeCatalog::default());
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(response.category_id, None);
	assert_eq!(response.reason.as_deref(), Some(REASON_NO_CATEGORY_MATCH));
	assert!(h.catalog.queries().is_empty());
}

#[tokio::test]
async fn embedding_failure_reports_resolution_failure() {
	let embedding = FakeEmbedding { fail: true, ..Default::default() };
	let h = harness(embedding, counseling_index(), FakeCatalog::default());
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(response.reason.as_deref(), Some(REASON_CATEGORY_RESOLUTION_FAILED));
	assert_eq!(h.index.count(), 0);
	assert!(h.catalog.queries().is_empty());
}

#[tokio::test]
async fn wrong_vector_length_is_a_provider_error() {
	let embedding = FakeEmbedding { wrong_dimensions: true, ..Default::default() };
	let h = harness(embedding, counseling_index(), FakeCatalog::default());
	let err = h.service.resolve_category("상담원").await.expect_err("Expected a dimension error.");

	assert!(matches!(err, Error::Provider { .. }));
	assert_eq!(h.index.count(), 0);
}

#[tokio::test]
async fn unparseable_category_id_searches_unscoped_without_fallback() {
	let h = harness(
		FakeEmbedding::default(),
		FakeIndex::with_category("abc", "국내도서/사회과학/심리학"),
		FakeCatalog::default(),
	);
	let response = h.service.resolve_and_search("상담원").await;

	assert_eq!(response.category_id, None);
	assert_eq!(response.reason.as_deref(), Some(REASON_CATEGORY_ID_UNPARSED));
	assert!(response.books.is_empty());
	assert_eq!(h.catalog.queries()[0].category_id, None);
	assert!(h.catalog.listed().is_empty());
}

#[tokio::test]
async fn videos_require_configuration_and_keyword() {
	let h = harness(FakeEmbedding::default(), counseling_index(), FakeCatalog::default());

	assert!(h.service.suggest_videos("  ").await.is_empty());
	assert_eq!(h.video.calls.load(Ordering::SeqCst), 0);

	let videos = h.service.suggest_videos("상담원").await;

	assert_eq!(videos.len(), 1);
	assert_eq!(videos[0].title, "상담원 직업 소개");

	let video = Arc::new(FakeVideo::default());
	let cfg = test_config(None);
	let trending = Arc::new(TrendingCache::new(Arc::new(StaticSource::default()), &cfg.trending));
	let providers =
		Providers::new(Arc::new(FakeEmbedding::default()), Arc::new(FakeCatalog::default()), video.clone());
	let service =
		JobShelfService::with_parts(cfg, providers, Arc::new(FakeIndex::default()), trending);

	assert!(service.suggest_videos("상담원").await.is_empty());
	assert_eq!(video.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn refresh_applies_weights_and_ranks() {
	let source = Arc::new(StaticSource::default());
	let cache = TrendingCache::new(source.clone(), &Trending::default());
	let outcome = cache.refresh().await;
	let snapshot = cache.snapshot();

	assert_eq!(outcome, RefreshOutcome::Refreshed { entries: 3 });

	let ranked: Vec<(u32, &str, f64)> = snapshot
		.entries
		.iter()
		.map(|entry| (entry.rank, entry.job_name.as_str(), entry.weighted_count))
		.collect();

	assert_eq!(ranked, vec![(1, "상담원", 10.0), (2, "요양보호사 돌봄", 5.0), (3, "조리사", 3.0)]);
	assert_eq!(snapshot.entries[1].raw_count, 10);

	let last_updated = snapshot.last_updated.expect("Expected a refresh timestamp.");

	assert_eq!(snapshot.next_update, Some(last_updated + Duration::seconds(600)));
}

#[tokio::test]
async fn concurrent_refresh_runs_one_aggregation() {
	let source = Arc::new(BlockingSource::default());
	let cache = Arc::new(TrendingCache::new(source.clone(), &Trending::default()));
	let first = tokio::spawn({
		let cache = cache.clone();

		async move { cache.refresh().await }
	});

	source.entered.notified().await;

	assert!(cache.is_refreshing());
	assert_eq!(cache.refresh().await, RefreshOutcome::Skipped);
	assert_eq!(cache.refresh().await, RefreshOutcome::Skipped);

	source.release.notify_one();

	let outcome = first.await.expect("Refresh task panicked.");

	assert_eq!(outcome, RefreshOutcome::Refreshed { entries: 1 });
	assert_eq!(source.calls.load(Ordering::SeqCst), 1);
	assert!(!cache.is_refreshing());
}

#[tokio::test]
async fn stale_cache_refreshes_exactly_once() {
	let source = Arc::new(StaticSource::default());
	let cache = TrendingCache::new(source.clone(), &Trending::default());
	let first = cache.get_cached().await;

	assert_eq!(source.count(), 1);
	assert_eq!(first.entries.len(), 3);

	let last_updated = first.last_updated.expect("Expected a refresh timestamp.");

	cache.get_cached_at(last_updated + Duration::seconds(30)).await;

	assert_eq!(source.count(), 1);

	let stale_at = OffsetDateTime::now_utc() + cache.ttl() + Duration::seconds(1);
	let refreshed = cache.get_cached_at(stale_at).await;

	assert_eq!(source.count(), 2);
	assert!(refreshed.last_updated >= Some(last_updated));
}

#[tokio::test]
async fn failed_refresh_keeps_previous_snapshot() {
	let source = Arc::new(StaticSource::default());
	let cache = TrendingCache::new(source.clone(), &Trending::default());

	cache.refresh().await;

	let before = cache.snapshot();

	source.fail.store(true, Ordering::SeqCst);

	assert_eq!(cache.refresh().await, RefreshOutcome::Failed);
	assert_eq!(cache.snapshot(), before);
	assert!(!cache.is_refreshing());
}
