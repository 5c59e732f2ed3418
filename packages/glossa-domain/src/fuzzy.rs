use strsim::normalized_levenshtein;
use unicode_segmentation::UnicodeSegmentation;

pub fn tokenize(text: &str) -> Vec<String> {
	text.unicode_words().map(str::to_lowercase).collect()
}

/// Substring-aware similarity: the shorter string slid over every
/// equal-length window of the longer one, best normalized edit similarity
/// wins. "berry" against "strawberry" scores 1.0.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
	let (shorter, longer) =
		if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
	let shorter_len = shorter.chars().count();

	if shorter_len == 0 {
		return 0.0;
	}

	let longer_chars: Vec<char> = longer.chars().collect();
	let mut best = 0.0_f64;

	for start in 0..=longer_chars.len() - shorter_len {
		let window: String = longer_chars[start..start + shorter_len].iter().collect();
		let score = normalized_levenshtein(shorter, &window);

		if score > best {
			best = score;
		}
		if best >= 1.0 {
			break;
		}
	}

	best
}

/// Word-order-independent similarity: both sides tokenized, sorted, and
/// rejoined before comparison.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
	let mut a_tokens = tokenize(a);
	let mut b_tokens = tokenize(b);

	a_tokens.sort();
	b_tokens.sort();

	normalized_levenshtein(&a_tokens.join(" "), &b_tokens.join(" "))
}

/// Best token-level match between any token of `text` and the query, taking
/// the stronger of the substring-aware and order-independent ratios.
pub fn best_token_score(text: &str, query: &str) -> f64 {
	let query = query.to_lowercase();
	let mut best = 0.0_f64;

	for token in tokenize(text) {
		let score = partial_ratio(&token, &query).max(token_sort_ratio(&token, &query));

		if score > best {
			best = score;
		}
		if best >= 1.0 {
			break;
		}
	}

	best
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_ratio_finds_embedded_substring() {
		assert!((partial_ratio("berry", "strawberry") - 1.0).abs() < f64::EPSILON);
	}

	#[test]
	fn partial_ratio_of_empty_input_is_zero() {
		assert_eq!(partial_ratio("", "anything"), 0.0);
	}

	#[test]
	fn token_sort_ignores_word_order() {
		let forward = token_sort_ratio("red apple", "apple red");

		assert!((forward - 1.0).abs() < f64::EPSILON);
	}

	#[test]
	fn best_token_score_picks_the_closest_token() {
		let close = best_token_score("ripe granny smith apple", "aple");
		let far = best_token_score("wooden chair", "aple");

		assert!(close > 0.7);
		assert!(far < close);
	}
}
