//! Search phrase shaping for the external catalog.

/// Reduces raw user input to a short catalog query.
///
/// Characters outside Hangul syllables, ASCII letters, ASCII digits and whitespace become spaces.
/// The remaining tokens are filtered against `stopwords` and the first `max_tokens` are joined by a
/// single space. When nothing survives, the raw input is returned unmodified.
pub fn refine(raw: &str, stopwords: &[String], max_tokens: usize) -> String {
	let cleaned: String =
		raw.chars().map(|ch| if is_allowed(ch) { ch } else { ' ' }).collect();
	let tokens: Vec<&str> = cleaned
		.split_whitespace()
		.filter(|token| !stopwords.iter().any(|word| word == token))
		.take(max_tokens)
		.collect();

	if tokens.is_empty() {
		return raw.to_string();
	}

	tokens.join(" ")
}

/// Last segment of a hierarchical category path such as `"국내도서/경제경영/마케팅"`.
pub fn leaf_label(path: &str) -> &str {
	path.split(|ch: char| ch == '/' || ch.is_whitespace())
		.filter(|part| !part.is_empty())
		.last()
		.unwrap_or("")
}

/// Joins the refined query with a category hint, trimming when either side is empty.
pub fn with_hint(query: &str, hint: &str) -> String {
	format!("{query} {hint}").trim().to_string()
}

fn is_allowed(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || ch.is_whitespace() || ('가'..='힣').contains(&ch)
}
