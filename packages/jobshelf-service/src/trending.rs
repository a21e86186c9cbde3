//! Cached "hot jobs" ranking.
//!
//! One snapshot is kept in memory and replaced wholesale by each successful refresh. Refreshes
//! never overlap: a refresh requested while another one is running returns immediately.

use std::{
	sync::{
		Arc, PoisonError, RwLock,
		atomic::{AtomicBool, Ordering},
	},
	time::Instant,
};

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use jobshelf_config::Trending;
use jobshelf_domain::trending::{self, WeightRule};

use crate::TrendingSource;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendingEntry {
	pub rank: u32,
	pub job_name: String,
	pub weighted_count: f64,
	pub raw_count: i64,
	pub job_code: String,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendingSnapshot {
	pub entries: Vec<TrendingEntry>,
	#[serde(with = "crate::time_serde::option")]
	pub last_updated: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde::option")]
	pub next_update: Option<OffsetDateTime>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	Refreshed { entries: usize },
	/// Another refresh was already running.
	Skipped,
	/// The aggregation failed. The previous snapshot is kept.
	Failed,
}

#[derive(Default)]
struct CachedState {
	entries: Vec<TrendingEntry>,
	last_updated: Option<OffsetDateTime>,
}

pub struct TrendingCache {
	source: Arc<dyn TrendingSource>,
	rules: Vec<WeightRule>,
	window: u32,
	top_n: usize,
	ttl: Duration,
	state: RwLock<CachedState>,
	refreshing: AtomicBool,
}
impl TrendingCache {
	pub fn new(source: Arc<dyn TrendingSource>, cfg: &Trending) -> Self {
		let rules = cfg
			.weights
			.iter()
			.map(|rule| WeightRule { pattern: rule.pattern.clone(), weight: rule.weight })
			.collect();

		Self {
			source,
			rules,
			window: cfg.window,
			top_n: cfg.top_n as usize,
			ttl: Duration::seconds(i64::try_from(cfg.interval_secs).unwrap_or(i64::MAX)),
			state: RwLock::new(CachedState::default()),
			refreshing: AtomicBool::new(false),
		}
	}

	/// Time-to-live of a snapshot. Also the period of the refresh loop.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	pub fn is_refreshing(&self) -> bool {
		self.refreshing.load(Ordering::Acquire)
	}

	/// Re-runs the aggregation and replaces the snapshot.
	pub async fn refresh(&self) -> RefreshOutcome {
		let claimed =
			self.refreshing.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);

		if claimed.is_err() {
			tracing::debug!("Trending refresh already running. Skipping.");

			return RefreshOutcome::Skipped;
		}

		let _guard = RefreshGuard(&self.refreshing);
		let started = Instant::now();
		let groups = match self.source.recent_groups(self.window).await {
			Ok(groups) => groups,
			Err(err) => {
				tracing::error!(error = %err, "Trending refresh failed. Keeping the previous snapshot.");

				return RefreshOutcome::Failed;
			},
		};
		let now = OffsetDateTime::now_utc();
		let entries: Vec<TrendingEntry> = trending::rank_groups(groups, &self.rules, self.top_n)
			.into_iter()
			.map(|group| TrendingEntry {
				rank: group.rank,
				job_name: group.job_name,
				weighted_count: group.weighted_count,
				raw_count: group.raw_count,
				job_code: group.job_code,
				updated_at: now,
			})
			.collect();
		let count = entries.len();

		{
			let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

			state.entries = entries;
			state.last_updated = Some(now);
		}

		tracing::info!(
			entries = count,
			elapsed_ms = started.elapsed().as_millis() as u64,
			"Trending snapshot refreshed."
		);

		RefreshOutcome::Refreshed { entries: count }
	}

	/// Current snapshot without refreshing.
	pub fn snapshot(&self) -> TrendingSnapshot {
		let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

		TrendingSnapshot {
			entries: state.entries.clone(),
			last_updated: state.last_updated,
			next_update: state.last_updated.and_then(|at| at.checked_add(self.ttl)),
		}
	}

	pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
		let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

		match state.last_updated {
			Some(at) => now - at > self.ttl,
			None => true,
		}
	}

	pub async fn get_cached(&self) -> TrendingSnapshot {
		self.get_cached_at(OffsetDateTime::now_utc()).await
	}

	/// Snapshot as of `now`, refreshed once first when empty or older than the TTL.
	pub async fn get_cached_at(&self, now: OffsetDateTime) -> TrendingSnapshot {
		if self.is_stale_at(now) {
			self.refresh().await;
		}

		self.snapshot()
	}
}

struct RefreshGuard<'a>(&'a AtomicBool);
impl Drop for RefreshGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Refreshes `cache` every TTL period, starting one period from now.
pub fn spawn_refresh_loop(cache: Arc<TrendingCache>) -> JoinHandle<()> {
	let period = std::time::Duration::from_secs(cache.ttl().whole_seconds().max(1) as u64);

	tokio::spawn(async move {
		let now = tokio::time::Instant::now();
		let start = now.checked_add(period).unwrap_or(now);
		let mut ticker = tokio::time::interval_at(start, period);

		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			ticker.tick().await;

			let outcome = cache.refresh().await;

			tracing::debug!(?outcome, "Scheduled trending refresh finished.");
		}
	})
}
