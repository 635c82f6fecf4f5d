use serde_json::Value;

/// A stored embedding after the single parse step that precedes scoring.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedVector {
	Valid(Vec<f32>),
	/// Missing, malformed, empty, or of the wrong dimension. Scores as a zero vector.
	Invalid,
}
impl ParsedVector {
	/// Accepts a numeric JSON array, or a JSON string holding one. Never fails.
	pub fn parse(raw: Option<&Value>, expected_dim: usize) -> Self {
		let values = match raw {
			Some(value) if value.is_array() => numeric_array(value),
			Some(Value::String(text)) => serde_json::from_str::<Value>(text.trim())
				.ok()
				.and_then(|decoded| numeric_array(&decoded)),
			_ => None,
		};

		match values {
			Some(values) if values.len() == expected_dim => Self::Valid(values),
			_ => Self::Invalid,
		}
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, Self::Valid(_))
	}
}

/// Cosine similarity of `query` against a parsed candidate, always within 0.0-1.0.
pub fn cosine_similarity(query: &[f32], candidate: &ParsedVector) -> f32 {
	let ParsedVector::Valid(candidate) = candidate else { return 0.0 };

	if query.is_empty() || query.len() != candidate.len() {
		return 0.0;
	}

	let mut dot = 0.0_f64;
	let mut query_norm = 0.0_f64;
	let mut candidate_norm = 0.0_f64;

	for (q, c) in query.iter().zip(candidate.iter()) {
		let (q, c) = (f64::from(*q), f64::from(*c));

		dot += q * c;
		query_norm += q * q;
		candidate_norm += c * c;
	}

	if query_norm == 0.0 || candidate_norm == 0.0 {
		return 0.0;
	}

	let similarity = dot / (query_norm.sqrt() * candidate_norm.sqrt());

	if !similarity.is_finite() {
		return 0.0;
	}

	similarity.clamp(0.0, 1.0) as f32
}

fn numeric_array(value: &Value) -> Option<Vec<f32>> {
	let items = value.as_array()?;

	if items.is_empty() {
		return None;
	}

	items.iter().map(|item| item.as_f64().map(|number| number as f32)).collect()
}
