use crate::{
	Error, Result,
	db::Db,
	models::{CategoryRow, JobGroupRow},
};

/// Nearest categories by L2 distance (`<->`) to `vec`, closest first.
pub async fn nearest_categories(db: &Db, vec: &[f32], limit: i64) -> Result<Vec<CategoryRow>> {
	if limit <= 0 {
		return Err(Error::InvalidArgument("limit must be greater than zero.".to_string()));
	}

	let vec_text = vector_to_pg(vec);
	let rows = sqlx::query_as::<_, CategoryRow>(
		"\
SELECT cid::text AS cid, full_path
FROM aladin_category_embedding2
WHERE embedding IS NOT NULL
ORDER BY embedding <-> $1::text::vector
LIMIT $2",
	)
	.bind(vec_text.as_str())
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Postings per classification among the `window` most recently processed postings that carry a
/// company, a title and a classification code.
pub async fn recent_job_groups(db: &Db, window: i64) -> Result<Vec<JobGroupRow>> {
	if window <= 0 {
		return Err(Error::InvalidArgument("window must be greater than zero.".to_string()));
	}

	let rows = sqlx::query_as::<_, JobGroupRow>(
		"\
SELECT
	c.job_name,
	c.rcrit_jssfc_cmmn_code_se::text AS job_code,
	COUNT(*)::bigint AS raw_count
FROM (
	SELECT rcrit_jssfc_cmmn_code_se
	FROM public.job_total_info
	WHERE company IS NOT NULL
		AND job_title IS NOT NULL
		AND rcrit_jssfc_cmmn_code_se IS NOT NULL
	ORDER BY eventprocessedutctime DESC
	LIMIT $1
) recent
JOIN public.job_classification c
	ON recent.rcrit_jssfc_cmmn_code_se = c.rcrit_jssfc_cmmn_code_se
WHERE c.job_name IS NOT NULL
GROUP BY c.job_name, c.rcrit_jssfc_cmmn_code_se",
	)
	.bind(window)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn categories_missing_embedding(db: &Db) -> Result<Vec<CategoryRow>> {
	let rows = sqlx::query_as::<_, CategoryRow>(
		"\
SELECT cid::text AS cid, full_path
FROM aladin_category_embedding2
WHERE embedding IS NULL
ORDER BY cid",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Returns the number of updated rows.
pub async fn set_category_embedding(db: &Db, cid: &str, vec: &[f32]) -> Result<u64> {
	let vec_text = vector_to_pg(vec);
	let result = sqlx::query(
		"\
UPDATE aladin_category_embedding2
SET embedding = $1::text::vector
WHERE cid::text = $2",
	)
	.bind(vec_text.as_str())
	.bind(cid)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

/// pgvector text literal, e.g. `[0.1,0.2]`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}
