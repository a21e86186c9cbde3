mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	CatalogProviderConfig, Config, EmbeddingProviderConfig, Postgres, Providers, Search, Service,
	Storage, Trending, TrendingWeight, VideoProviderConfig,
};

use std::{fs, path::Path};

pub const MAX_SEARCH_RESULTS: u32 = 10;
pub const MAX_TRENDING_INTERVAL_SECS: u64 = 86_400;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("catalog", &cfg.providers.catalog.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}
	for (label, timeout_ms) in [
		("providers.embedding.timeout_ms", cfg.providers.embedding.timeout_ms),
		("providers.catalog.timeout_ms", cfg.providers.catalog.timeout_ms),
	] {
		if timeout_ms == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if let Some(video) = cfg.providers.video.as_ref() {
		if video.max_results == 0 {
			return Err(Error::Validation {
				message: "providers.video.max_results must be greater than zero.".to_string(),
			});
		}
		if video.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.video.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	if cfg.search.max_results == 0 {
		return Err(Error::Validation {
			message: "search.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_results > MAX_SEARCH_RESULTS {
		return Err(Error::Validation {
			message: format!("search.max_results must be at most {MAX_SEARCH_RESULTS}."),
		});
	}
	if cfg.search.category_candidates == 0 {
		return Err(Error::Validation {
			message: "search.category_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_query_tokens == 0 {
		return Err(Error::Validation {
			message: "search.max_query_tokens must be greater than zero.".to_string(),
		});
	}
	if cfg.trending.interval_secs == 0 {
		return Err(Error::Validation {
			message: "trending.interval_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.trending.interval_secs > MAX_TRENDING_INTERVAL_SECS {
		return Err(Error::Validation {
			message: format!(
				"trending.interval_secs must be at most {MAX_TRENDING_INTERVAL_SECS}."
			),
		});
	}
	if cfg.trending.window == 0 {
		return Err(Error::Validation {
			message: "trending.window must be greater than zero.".to_string(),
		});
	}
	if cfg.trending.top_n == 0 {
		return Err(Error::Validation {
			message: "trending.top_n must be greater than zero.".to_string(),
		});
	}

	for rule in &cfg.trending.weights {
		if rule.pattern.trim().is_empty() {
			return Err(Error::Validation {
				message: "trending.weights.pattern must be non-empty.".to_string(),
			});
		}
		if !rule.weight.is_finite() {
			return Err(Error::Validation {
				message: "trending.weights.weight must be a finite number.".to_string(),
			});
		}
		if rule.weight < 0.0 {
			return Err(Error::Validation {
				message: "trending.weights.weight must be zero or greater.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.video.as_ref().map(|video| video.api_key.trim().is_empty()).unwrap_or(false) {
		cfg.providers.video = None;
	}

	cfg.search.stopwords = cfg
		.search
		.stopwords
		.iter()
		.map(|word| word.trim())
		.filter(|word| !word.is_empty())
		.map(str::to_string)
		.collect();

	for rule in &mut cfg.trending.weights {
		rule.pattern = rule.pattern.trim().to_string();
	}
}
