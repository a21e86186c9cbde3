/// Row of the category embedding table. The identifier is read as text so a malformed value can
/// still be reported by the caller instead of failing the whole query.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
	pub cid: String,
	pub full_path: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobGroupRow {
	pub job_name: String,
	pub job_code: String,
	pub raw_count: i64,
}
