use serde::Serialize;

use jobshelf_storage::models::CategoryRow;

use crate::{Error, JobShelfService, Result};

/// Closest taxonomy category for a keyword.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryMatch {
	/// Integer form of `raw_id`. `None` when the stored identifier is not an integer.
	pub category_id: Option<i64>,
	pub raw_id: String,
	pub path: String,
}
impl CategoryMatch {
	pub fn from_row(row: CategoryRow) -> Self {
		let category_id = match row.cid.trim().parse::<i64>() {
			Ok(id) => Some(id),
			Err(err) => {
				tracing::warn!(
					raw_id = %row.cid,
					error = %err,
					"Category identifier is not an integer. Continuing without a category filter."
				);

				None
			},
		};

		Self { category_id, raw_id: row.cid, path: row.full_path }
	}
}

impl JobShelfService {
	/// Embeds a keyword. Blank input never reaches the provider and yields `None`.
	pub async fn embed_keyword(&self, keyword: &str) -> Result<Option<Vec<f32>>> {
		let keyword = keyword.trim();

		if keyword.is_empty() {
			return Ok(None);
		}

		let cfg = &self.cfg.providers.embedding;
		let texts = vec![keyword.to_string()];
		let mut vectors = self.providers.embedding.embed(cfg, &texts).await?;

		if vectors.is_empty() {
			return Err(Error::Provider {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		}

		let vector = vectors.swap_remove(0);

		if vector.len() != cfg.dimensions as usize {
			return Err(Error::Provider {
				message: format!(
					"Embedding dimension mismatch: expected {}, got {}.",
					cfg.dimensions,
					vector.len()
				),
			});
		}

		Ok(Some(vector))
	}

	/// Nearest category for `keyword`, or `None` for blank input and an empty index.
	pub async fn resolve_category(&self, keyword: &str) -> Result<Option<CategoryMatch>> {
		let Some(vector) = self.embed_keyword(keyword).await? else {
			return Ok(None);
		};
		let rows = self.categories.nearest(&vector, self.cfg.search.category_candidates).await?;

		Ok(rows.into_iter().next().map(CategoryMatch::from_row))
	}
}
