use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Video {
	pub id: String,
	pub title: String,
	pub channel_title: String,
	pub thumbnail: Option<String>,
	pub description: String,
	pub published_at: Option<String>,
	pub url: String,
}

pub async fn search_videos(
	cfg: &jobshelf_config::VideoProviderConfig,
	keyword: &str,
) -> Result<Vec<Video>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let query = format!("{keyword} {}", cfg.query_suffix).trim().to_string();
	let params = [
		("part", "snippet".to_string()),
		("q", query),
		("type", "video".to_string()),
		("maxResults", cfg.max_results.to_string()),
		("order", "relevance".to_string()),
		("regionCode", cfg.region_code.clone()),
		("relevanceLanguage", cfg.relevance_language.clone()),
		("key", cfg.api_key.clone()),
	];
	let res = client.get(url).query(&params).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_video_response(json)
}

fn parse_video_response(json: Value) -> Result<Vec<Video>> {
	if let Some(error) = json.get("error") {
		return Err(Error::InvalidResponse {
			message: format!("Video search reported an error: {error}"),
		});
	}

	let Some(items) = json.get("items").and_then(Value::as_array) else {
		return Ok(Vec::new());
	};
	let mut videos = Vec::with_capacity(items.len());

	for item in items {
		let Some(id) = item.pointer("/id/videoId").and_then(Value::as_str) else {
			continue;
		};
		let snippet = item.get("snippet");
		let text = |field: &str| {
			snippet
				.and_then(|snippet| snippet.get(field))
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string()
		};
		let thumbnail = snippet
			.and_then(|snippet| {
				snippet
					.pointer("/thumbnails/medium/url")
					.or_else(|| snippet.pointer("/thumbnails/default/url"))
			})
			.and_then(Value::as_str)
			.map(str::to_string);
		let published_at = snippet
			.and_then(|snippet| snippet.get("publishedAt"))
			.and_then(Value::as_str)
			.map(str::to_string);

		videos.push(Video {
			id: id.to_string(),
			title: text("title"),
			channel_title: text("channelTitle"),
			thumbnail,
			description: text("description"),
			published_at,
			url: format!("{WATCH_URL_BASE}{id}"),
		});
	}

	Ok(videos)
}
