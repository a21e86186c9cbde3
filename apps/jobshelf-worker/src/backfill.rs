use jobshelf_config::EmbeddingProviderConfig;
use jobshelf_service::{BoxFuture, EmbeddingProvider};
use jobshelf_storage::{db::Db, models::CategoryRow, queries};

use crate::Result;

const PROGRESS_EVERY: usize = 100;

/// Category rows that still need a vector, and the place to put one.
pub trait CategoryStore
where
	Self: Send + Sync,
{
	fn missing(&self) -> BoxFuture<'_, Result<Vec<CategoryRow>>>;

	fn store<'a>(&'a self, cid: &'a str, vec: &'a [f32]) -> BoxFuture<'a, Result<u64>>;
}

impl CategoryStore for Db {
	fn missing(&self) -> BoxFuture<'_, Result<Vec<CategoryRow>>> {
		Box::pin(async move { Ok(queries::categories_missing_embedding(self).await?) })
	}

	fn store<'a>(&'a self, cid: &'a str, vec: &'a [f32]) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(queries::set_category_embedding(self, cid, vec).await?) })
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackfillReport {
	pub total: usize,
	pub updated: usize,
	pub skipped: usize,
	pub failed: usize,
}

/// Embeds the path of every category without a vector and stores the result.
///
/// Listing failures abort the run. A failure on a single row is logged and the run continues.
pub async fn backfill_categories(
	store: &dyn CategoryStore,
	embedding: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
) -> Result<BackfillReport> {
	let rows = store.missing().await?;
	let mut report = BackfillReport { total: rows.len(), ..Default::default() };

	tracing::info!(total = report.total, "Categories without an embedding loaded.");

	for (index, row) in rows.iter().enumerate() {
		match embed_row(store, embedding, cfg, row).await {
			Ok(true) => report.updated += 1,
			Ok(false) => {
				tracing::warn!(
					cid = %row.cid,
					path = %row.full_path,
					"Embedding provider returned no vector. Skipping."
				);

				report.skipped += 1;
			},
			Err(err) => {
				tracing::error!(
					cid = %row.cid,
					error = %err,
					"Failed to backfill category embedding."
				);

				report.failed += 1;
			},
		}

		let done = index + 1;

		if done % PROGRESS_EVERY == 0 {
			tracing::info!(done, total = report.total, "Backfill progress.");
		}
	}

	Ok(report)
}

async fn embed_row(
	store: &dyn CategoryStore,
	embedding: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	row: &CategoryRow,
) -> Result<bool> {
	let texts = vec![row.full_path.clone()];
	let vectors = embedding.embed(cfg, &texts).await?;
	let Some(vector) = vectors.into_iter().next().filter(|vector| !vector.is_empty()) else {
		return Ok(false);
	};

	store.store(&row.cid, &vector).await?;

	Ok(true)
}
