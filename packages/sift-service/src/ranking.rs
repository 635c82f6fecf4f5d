use std::cmp::Ordering;

use sift_storage::models::CandidateRow;

use crate::vector::{self, ParsedVector};

/// A candidate with its similarity to the query. The raw embedding has already been consumed.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
	pub item: CandidateRow,
	pub similarity: f32,
}

#[derive(Debug, Clone)]
pub struct Ranking {
	pub results: Vec<ScoredCandidate>,
	pub scanned: usize,
	pub invalid: usize,
}

/// Scores every candidate against `query`, then keeps the `top_k` best.
///
/// Candidates with unusable embeddings are not filtered; they score 0.0 and sink. The sort is
/// stable, so equal scores keep their input order.
pub fn rank_candidates(query: &[f32], candidates: Vec<CandidateRow>, top_k: usize) -> Ranking {
	let scanned = candidates.len();
	let mut invalid = 0_usize;
	let mut scored: Vec<ScoredCandidate> = candidates
		.into_iter()
		.map(|mut item| {
			let parsed = ParsedVector::parse(item.embedding.take().as_ref(), query.len());

			if !parsed.is_valid() {
				invalid += 1;
			}

			let similarity = vector::cosine_similarity(query, &parsed);

			ScoredCandidate { item, similarity }
		})
		.collect();

	scored.sort_by(|left, right| cmp_f32_desc(left.similarity, right.similarity));
	scored.truncate(top_k);

	Ranking { results: scored, scanned, invalid }
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
