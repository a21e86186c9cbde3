use std::cmp::Ordering;

use serde::Serialize;

/// Posting count for one job classification inside the aggregation window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobGroup {
	pub job_name: String,
	pub job_code: String,
	pub raw_count: i64,
}

/// Count multiplier for job names containing `pattern` (case-insensitive).
#[derive(Clone, Debug, PartialEq)]
pub struct WeightRule {
	pub pattern: String,
	pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedGroup {
	pub rank: u32,
	pub job_name: String,
	pub job_code: String,
	pub raw_count: i64,
	pub weighted_count: f64,
}

/// Weight of the first rule whose pattern occurs in `job_name`, or `1.0` when none matches.
pub fn weight_for(job_name: &str, rules: &[WeightRule]) -> f64 {
	let name = job_name.to_lowercase();

	rules
		.iter()
		.find(|rule| name.contains(rule.pattern.to_lowercase().as_str()))
		.map(|rule| rule.weight)
		.unwrap_or(1.0)
}

/// Applies the weight policy, orders the groups and keeps the top `top_n` with a positive
/// weighted count.
///
/// Ordering is weighted count descending, raw count descending, job name ascending and job code
/// ascending, so equal inputs always produce the same ranking.
pub fn rank_groups(groups: Vec<JobGroup>, rules: &[WeightRule], top_n: usize) -> Vec<RankedGroup> {
	let mut weighted: Vec<(f64, JobGroup)> = groups
		.into_iter()
		.map(|group| (group.raw_count as f64 * weight_for(&group.job_name, rules), group))
		.collect();

	weighted.sort_by(|(lhs_weighted, lhs), (rhs_weighted, rhs)| {
		rhs_weighted
			.partial_cmp(lhs_weighted)
			.unwrap_or(Ordering::Equal)
			.then_with(|| rhs.raw_count.cmp(&lhs.raw_count))
			.then_with(|| lhs.job_name.cmp(&rhs.job_name))
			.then_with(|| lhs.job_code.cmp(&rhs.job_code))
	});

	weighted
		.into_iter()
		.take(top_n)
		.filter(|(weighted_count, _)| *weighted_count > 0.0)
		.enumerate()
		.map(|(index, (weighted_count, group))| RankedGroup {
			rank: index as u32 + 1,
			job_name: group.job_name,
			job_code: group.job_code,
			raw_count: group.raw_count,
			weighted_count,
		})
		.collect()
}
