//! Progressive book search for a resolved category.
//!
//! Item-search stages run in a fixed order and widen the query step by step:
//! category-scoped, then with the category leaf label as a hint, then unscoped. Results are merged
//! by item id in first-found order. When nothing well-formed survives, the category's bestseller
//! list is used once as a fallback.

use std::time::Instant;

use serde::Serialize;

use jobshelf_config::Search;
use jobshelf_domain::{merge, query};
use jobshelf_providers::catalog::{CatalogItem, CatalogQuery};

use crate::{CategoryMatch, JobShelfService};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
	CategoryScoped,
	LeafHint,
	Broad,
	BestsellerFallback,
}
impl SearchStage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::CategoryScoped => "category_scoped",
			Self::LeafHint => "leaf_hint",
			Self::Broad => "broad",
			Self::BestsellerFallback => "bestseller_fallback",
		}
	}

	/// Whether a full result set ends the pipeline right after this stage.
	pub fn stops_when_full(self) -> bool {
		matches!(self, Self::CategoryScoped | Self::LeafHint)
	}
}

/// Inputs shared by every stage of one search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageContext {
	pub query: String,
	pub leaf: String,
	pub category_id: Option<i64>,
	pub max_results: u32,
}
impl StageContext {
	pub fn new(keyword: &str, category: &CategoryMatch, cfg: &Search) -> Self {
		Self {
			query: query::refine(keyword, &cfg.stopwords, cfg.max_query_tokens as usize),
			leaf: query::leaf_label(&category.path).to_string(),
			category_id: category.category_id,
			max_results: cfg.max_results,
		}
	}

	pub fn limit(&self) -> usize {
		self.max_results as usize
	}

	/// Item-search stages in execution order, each with its catalog request.
	pub fn item_search_plan(&self) -> [(SearchStage, CatalogQuery); 3] {
		[
			(SearchStage::CategoryScoped, self.request(self.query.clone(), self.category_id)),
			(SearchStage::LeafHint, self.request(query::with_hint(&self.query, &self.leaf), None)),
			(SearchStage::Broad, self.request(self.query.clone(), None)),
		]
	}

	fn request(&self, query: String, category_id: Option<i64>) -> CatalogQuery {
		CatalogQuery { query, category_id, max_results: self.max_results }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageOutcome {
	pub added: usize,
	pub should_stop: bool,
}

/// Merges one stage's batch into `accumulated` and decides whether the pipeline can stop.
pub fn apply_stage(
	stage: SearchStage,
	accumulated: &mut Vec<CatalogItem>,
	batch: Vec<CatalogItem>,
	ctx: &StageContext,
) -> StageOutcome {
	let added = merge::merge_unique_by(accumulated, batch, |item| item.item_id);
	let should_stop = stage.stops_when_full() && accumulated.len() >= ctx.limit();

	StageOutcome { added, should_stop }
}

/// Outward book shape with a display price.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BookItem {
	pub item_id: i64,
	pub title: String,
	pub author: String,
	pub description: String,
	pub cover: String,
	pub link: String,
	pub isbn: String,
	pub isbn13: String,
	pub price: Option<String>,
	pub best_rank: Option<i64>,
}
impl From<CatalogItem> for BookItem {
	fn from(item: CatalogItem) -> Self {
		let price = item.base_price().map(format_price);

		Self {
			item_id: item.item_id,
			title: item.title,
			author: item.author,
			description: item.description,
			cover: item.cover,
			link: item.link,
			isbn: item.isbn,
			isbn13: item.isbn13,
			price,
			best_rank: item.best_rank,
		}
	}
}

/// `12000` becomes `"12,000원"`.
pub fn format_price(amount: i64) -> String {
	let digits = amount.unsigned_abs().to_string();
	let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);

	if amount < 0 {
		grouped.push('-');
	}

	for (i, ch) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			grouped.push(',');
		}

		grouped.push(ch);
	}

	grouped.push('원');

	grouped
}

impl JobShelfService {
	/// Up to `search.max_results` books for `keyword` within `category`, unique by item id.
	///
	/// Stage failures are logged and contribute nothing.
	pub async fn find_items(&self, category: &CategoryMatch, keyword: &str) -> Vec<CatalogItem> {
		let ctx = StageContext::new(keyword, category, &self.cfg.search);
		let mut accumulated = Vec::new();

		for (stage, request) in ctx.item_search_plan() {
			let started = Instant::now();
			let catalog_cfg = &self.cfg.providers.catalog;
			let batch = match self.providers.catalog.search(catalog_cfg, &request).await {
				Ok(batch) => batch,
				Err(err) => {
					tracing::warn!(
						stage = stage.as_str(),
						error = %err,
						"Search stage failed. Continuing."
					);

					Vec::new()
				},
			};
			let outcome = apply_stage(stage, &mut accumulated, batch, &ctx);

			tracing::info!(
				stage = stage.as_str(),
				query = %request.query,
				added = outcome.added,
				total = accumulated.len(),
				elapsed_ms = started.elapsed().as_millis() as u64,
				"Search stage finished."
			);

			if outcome.should_stop {
				accumulated.truncate(ctx.limit());

				return accumulated;
			}
		}

		accumulated.retain(CatalogItem::is_well_formed);

		if !accumulated.is_empty() {
			accumulated.truncate(ctx.limit());

			return accumulated;
		}

		self.bestseller_fallback(&ctx).await
	}

	async fn bestseller_fallback(&self, ctx: &StageContext) -> Vec<CatalogItem> {
		let stage = SearchStage::BestsellerFallback;
		let Some(category_id) = ctx.category_id else {
			tracing::warn!(
				stage = stage.as_str(),
				"No usable category identifier. Skipping bestseller fallback."
			);

			return Vec::new();
		};
		let mut items = match self
			.providers
			.catalog
			.list_by_category(&self.cfg.providers.catalog, category_id, ctx.max_results)
			.await
		{
			Ok(items) => items,
			Err(err) => {
				tracing::warn!(
					stage = stage.as_str(),
					category_id,
					error = %err,
					"Bestseller fallback failed."
				);

				return Vec::new();
			},
		};

		items.truncate(ctx.limit());

		tracing::info!(
			stage = stage.as_str(),
			category_id,
			total = items.len(),
			"Bestseller fallback used."
		);

		items
	}
}
