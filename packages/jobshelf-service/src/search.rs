use std::time::Instant;

use serde::Serialize;

use crate::{BookItem, JobShelfService};

pub const REASON_NO_CATEGORY_MATCH: &str = "no_category_match";
pub const REASON_CATEGORY_RESOLUTION_FAILED: &str = "category_resolution_failed";
pub const REASON_CATEGORY_ID_UNPARSED: &str = "category_id_unparsed";

#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
	pub category_id: Option<i64>,
	pub category_path: Option<String>,
	pub books: Vec<BookItem>,
	/// Set when no category-backed result could be produced.
	pub reason: Option<String>,
	pub elapsed_ms: u64,
}
impl SearchResponse {
	fn empty(reason: Option<&str>, started: Instant) -> Self {
		Self {
			category_id: None,
			category_path: None,
			books: Vec::new(),
			reason: reason.map(str::to_string),
			elapsed_ms: started.elapsed().as_millis() as u64,
		}
	}
}

impl JobShelfService {
	/// Resolves the keyword's category and runs the progressive book search within it.
	///
	/// Never fails. Upstream failures are logged and reported through `reason`.
	pub async fn resolve_and_search(&self, keyword: &str) -> SearchResponse {
		let started = Instant::now();
		let keyword = keyword.trim();

		if keyword.is_empty() {
			return SearchResponse::empty(None, started);
		}

		let category = match self.resolve_category(keyword).await {
			Ok(Some(category)) => category,
			Ok(None) => {
				tracing::info!(keyword, "No category matched the keyword.");

				return SearchResponse::empty(Some(REASON_NO_CATEGORY_MATCH), started);
			},
			Err(err) => {
				tracing::error!(keyword, error = %err, "Category resolution failed.");

				return SearchResponse::empty(Some(REASON_CATEGORY_RESOLUTION_FAILED), started);
			},
		};
		let resolve_ms = started.elapsed().as_millis() as u64;

		tracing::info!(
			keyword,
			category_id = category.category_id,
			category_path = %category.path,
			elapsed_ms = resolve_ms,
			"Category resolved."
		);

		let search_started = Instant::now();
		let books: Vec<BookItem> =
			self.find_items(&category, keyword).await.into_iter().map(BookItem::from).collect();

		tracing::info!(
			keyword,
			count = books.len(),
			elapsed_ms = search_started.elapsed().as_millis() as u64,
			"Book search finished."
		);

		let reason = category.category_id.is_none().then(|| REASON_CATEGORY_ID_UNPARSED.to_string());

		SearchResponse {
			category_id: category.category_id,
			category_path: Some(category.path),
			books,
			reason,
			elapsed_ms: started.elapsed().as_millis() as u64,
		}
	}
}
