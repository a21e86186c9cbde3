use jobshelf_providers::video::Video;

use crate::JobShelfService;

impl JobShelfService {
	/// Career videos for `keyword`. Disabled or failing lookups yield an empty list.
	pub async fn suggest_videos(&self, keyword: &str) -> Vec<Video> {
		let keyword = keyword.trim();

		if keyword.is_empty() {
			return Vec::new();
		}

		let Some(cfg) = self.cfg.providers.video.as_ref().filter(|cfg| !cfg.api_key.trim().is_empty())
		else {
			tracing::warn!("Video provider is not configured. Returning no videos.");

			return Vec::new();
		};

		match self.providers.video.search_videos(cfg, keyword).await {
			Ok(videos) => {
				tracing::info!(keyword, count = videos.len(), "Video search finished.");

				videos
			},
			Err(err) => {
				tracing::warn!(keyword, error = %err, "Video search failed. Returning no videos.");

				Vec::new()
			},
		}
	}
}
