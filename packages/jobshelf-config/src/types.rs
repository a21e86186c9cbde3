use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub trending: Trending,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub catalog: CatalogProviderConfig,
	/// Optional. Video suggestions are disabled when absent.
	pub video: Option<VideoProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Book catalog API. `api_key` is sent as the `ttbkey` query parameter.
#[derive(Debug, Deserialize)]
pub struct CatalogProviderConfig {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_catalog_search_path")]
	pub search_path: String,
	#[serde(default = "default_catalog_list_path")]
	pub list_path: String,
	#[serde(default = "default_catalog_search_target")]
	pub search_target: String,
	#[serde(default = "default_catalog_cover")]
	pub cover: String,
	#[serde(default = "default_catalog_version")]
	pub version: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct VideoProviderConfig {
	pub api_base: String,
	pub api_key: String,
	#[serde(default = "default_video_path")]
	pub path: String,
	#[serde(default = "default_video_max_results")]
	pub max_results: u32,
	/// Appended to the keyword so results lean towards career guidance content.
	#[serde(default = "default_video_query_suffix")]
	pub query_suffix: String,
	#[serde(default = "default_video_region_code")]
	pub region_code: String,
	#[serde(default = "default_video_relevance_language")]
	pub relevance_language: String,
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub max_results: u32,
	pub category_candidates: u32,
	pub max_query_tokens: u32,
	pub stopwords: Vec<String>,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			max_results: 10,
			category_candidates: 5,
			max_query_tokens: 2,
			stopwords: ["및", "등", "관련", "분야", "수리원", "종사자"]
				.into_iter()
				.map(str::to_string)
				.collect(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Trending {
	pub interval_secs: u64,
	pub window: u32,
	pub top_n: u32,
	pub weights: Vec<TrendingWeight>,
}
impl Default for Trending {
	fn default() -> Self {
		Self {
			interval_secs: 600,
			window: 100,
			top_n: 3,
			weights: vec![TrendingWeight { pattern: "요양보호사".to_string(), weight: 0.5 }],
		}
	}
}

/// Multiplier applied to the count of every job name containing `pattern`, case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendingWeight {
	pub pattern: String,
	pub weight: f64,
}

fn default_catalog_search_path() -> String {
	"/ttb/api/ItemSearch.aspx".to_string()
}

fn default_catalog_list_path() -> String {
	"/ttb/api/ItemList.aspx".to_string()
}

fn default_catalog_search_target() -> String {
	"Book".to_string()
}

fn default_catalog_cover() -> String {
	"Big".to_string()
}

fn default_catalog_version() -> String {
	"20131101".to_string()
}

fn default_video_path() -> String {
	"/youtube/v3/search".to_string()
}

fn default_video_max_results() -> u32 {
	6
}

fn default_video_query_suffix() -> String {
	"직업 취업 교육 가이드".to_string()
}

fn default_video_region_code() -> String {
	"KR".to_string()
}

fn default_video_relevance_language() -> String {
	"ko".to_string()
}
