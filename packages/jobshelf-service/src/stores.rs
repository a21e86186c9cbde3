//! Postgres-backed implementations of the service's store seams.

use jobshelf_domain::trending::JobGroup;
use jobshelf_storage::{db::Db, models::CategoryRow, queries};

use crate::{BoxFuture, CategoryIndex, Result, TrendingSource};

impl CategoryIndex for Db {
	fn nearest<'a>(&'a self, vec: &'a [f32], limit: u32) -> BoxFuture<'a, Result<Vec<CategoryRow>>> {
		Box::pin(async move { Ok(queries::nearest_categories(self, vec, i64::from(limit)).await?) })
	}
}

impl TrendingSource for Db {
	fn recent_groups(&self, window: u32) -> BoxFuture<'_, Result<Vec<JobGroup>>> {
		Box::pin(async move {
			let rows = queries::recent_job_groups(self, i64::from(window)).await?;

			Ok(rows
				.into_iter()
				.map(|row| JobGroup {
					job_name: row.job_name,
					job_code: row.job_code,
					raw_count: row.raw_count,
				})
				.collect())
		})
	}
}
