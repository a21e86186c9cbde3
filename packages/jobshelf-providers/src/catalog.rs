//! Book catalog client (item search and per-category bestseller listing).
//!
//! Both calls treat an unsuccessful status, an unparseable body, a service-reported
//! `errorMessage` and a missing `item` field as "no results". Only transport failures surface as
//! errors.

use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogItem {
	pub item_id: i64,
	pub title: String,
	pub author: String,
	pub description: String,
	pub cover: String,
	pub link: String,
	pub isbn: String,
	pub isbn13: String,
	pub price_sales: Option<i64>,
	pub price_standard: Option<i64>,
	pub best_rank: Option<i64>,
}
impl CatalogItem {
	/// Non-zero id and a title that is not blank.
	pub fn is_well_formed(&self) -> bool {
		self.item_id != 0 && !self.title.trim().is_empty()
	}

	/// Sale price, falling back to the list price. Zero counts as missing.
	pub fn base_price(&self) -> Option<i64> {
		self.price_sales.filter(|price| *price > 0).or(self.price_standard.filter(|price| *price > 0))
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogQuery {
	pub query: String,
	pub category_id: Option<i64>,
	pub max_results: u32,
}

pub async fn search(
	cfg: &jobshelf_config::CatalogProviderConfig,
	query: &CatalogQuery,
) -> Result<Vec<CatalogItem>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.search_path);
	let mut params = vec![
		("ttbkey", cfg.api_key.clone()),
		("Query", query.query.clone()),
		("QueryType", "ItemSearch".to_string()),
		("SearchTarget", cfg.search_target.clone()),
		("Sort", "Accuracy".to_string()),
		("MaxResults", query.max_results.to_string()),
		("start", "1".to_string()),
		("Cover", cfg.cover.clone()),
		("output", "js".to_string()),
		("Version", cfg.version.clone()),
	];

	if let Some(category_id) = query.category_id {
		params.push(("CategoryId", category_id.to_string()));
	}

	let res = client.get(url).query(&params).send().await?;

	read_items(res, "item search").await
}

pub async fn list_by_category(
	cfg: &jobshelf_config::CatalogProviderConfig,
	category_id: i64,
	max_results: u32,
) -> Result<Vec<CatalogItem>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.list_path);
	let params = [
		("ttbkey", cfg.api_key.clone()),
		("QueryType", "Bestseller".to_string()),
		("CategoryId", category_id.to_string()),
		("MaxResults", max_results.to_string()),
		("start", "1".to_string()),
		("Cover", cfg.cover.clone()),
		("SearchTarget", cfg.search_target.clone()),
		("output", "js".to_string()),
		("Version", cfg.version.clone()),
	];
	let res = client.get(url).query(&params).send().await?;

	read_items(res, "bestseller listing").await
}

async fn read_items(res: Response, label: &str) -> Result<Vec<CatalogItem>> {
	let status = res.status();

	if !status.is_success() {
		tracing::warn!(%status, label, "Catalog request returned an unsuccessful status.");

		return Ok(Vec::new());
	}

	let body = res.text().await?;

	Ok(parse_items(&body, label))
}

pub fn parse_items(body: &str, label: &str) -> Vec<CatalogItem> {
	// The `js` output format occasionally ends with a statement terminator.
	let trimmed = body.trim().trim_end_matches(';');
	let json: Value = match serde_json::from_str(trimmed) {
		Ok(json) => json,
		Err(err) => {
			tracing::warn!(error = %err, label, "Catalog response is not valid JSON.");

			return Vec::new();
		},
	};

	if let Some(message) = json.get("errorMessage").filter(|value| !value.is_null()) {
		tracing::warn!(%message, label, "Catalog service reported an error.");

		return Vec::new();
	}

	let Some(items) = json.get("item").and_then(Value::as_array) else {
		tracing::debug!(label, "Catalog response has no item field.");

		return Vec::new();
	};
	let mut parsed = Vec::with_capacity(items.len());

	for item in items {
		match CatalogItem::deserialize(item) {
			Ok(item) => parsed.push(item),
			Err(err) => {
				tracing::warn!(error = %err, label, "Skipping malformed catalog item.");
			},
		}
	}

	parsed
}
