//! Canonicalization and content fingerprinting for Markdown bodies.
//!
//! Normalization exists to absorb editor autoformatting noise (trailing
//! whitespace, EOL conventions, stray blank lines) so it never reads as a
//! semantic change. Fingerprints are SHA-256 over the normalized bytes.

use sha2::{Digest, Sha256};

use crate::frontmatter::strip_frontmatter;

/// Normalize Markdown body text into its canonical byte-stable form.
///
/// Applied in order:
/// 1. Strip a leading frontmatter block, if present.
/// 2. Normalize line endings to `\n`.
/// 3. Strip trailing whitespace on each line.
/// 4. Collapse runs of >= 2 blank lines to exactly one.
/// 5. Ensure the text ends with exactly one linefeed.
pub fn normalize(text: &str) -> String {
	let (_, body) = strip_frontmatter(text);

	let unified: String = body.replace("\r\n", "\n").replace('\r', "\n");

	let trimmed_lines: Vec<&str> = unified.lines().map(|line| line.trim_end()).collect();

	let mut collapsed = Vec::with_capacity(trimmed_lines.len());
	let mut blank_run = 0;
	for line in trimmed_lines {
		if line.is_empty() {
			blank_run += 1;
			if blank_run <= 1 {
				collapsed.push(line);
			}
		} else {
			blank_run = 0;
			collapsed.push(line);
		}
	}

	// Drop trailing blank lines entirely; they're reintroduced as the single
	// final linefeed below.
	while collapsed.last().is_some_and(|l| l.is_empty()) {
		collapsed.pop();
	}

	let mut out = collapsed.join("\n");
	out.push('\n');
	out
}

/// Idempotence holds by construction: `normalize` always produces text with
/// no trailing whitespace, no blank-line runs, and exactly one trailing
/// linefeed, so re-normalizing is a no-op.
pub fn fingerprint(text: &str) -> String {
	let normalized = normalize(text);
	let mut hasher = Sha256::new();
	hasher.update(normalized.as_bytes());
	hex::encode(hasher.finalize())
}

/// Fingerprint text that is already known to be normalized (e.g. text just
/// produced by `normalize`), skipping the redundant pass.
pub fn fingerprint_normalized(normalized_text: &str) -> String {
	let mut hasher = Sha256::new();
	hasher.update(normalized_text.as_bytes());
	hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_trailing_whitespace() {
		assert_eq!(normalize("hello   \nworld\t\n"), "hello\nworld\n");
	}

	#[test]
	fn normalizes_crlf() {
		assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
	}

	#[test]
	fn collapses_blank_line_runs() {
		assert_eq!(normalize("a\n\n\n\nb\n"), "a\n\nb\n");
	}

	#[test]
	fn ensures_single_trailing_linefeed() {
		assert_eq!(normalize("a\nb"), "a\nb\n");
		assert_eq!(normalize("a\nb\n\n\n"), "a\nb\n");
	}

	#[test]
	fn is_idempotent() {
		let once = normalize("hi   \n\n\n\nthere\n\n\n");
		let twice = normalize(&once);
		assert_eq!(once, twice);
	}

	#[test]
	fn strips_frontmatter_before_hashing() {
		let with_fm = "---\nid: P1\n---\nHi\n";
		let without_fm = "Hi\n";
		assert_eq!(fingerprint(with_fm), fingerprint(without_fm));
	}

	#[test]
	fn equal_fingerprints_for_equivalent_text() {
		assert_eq!(fingerprint("hi  \n\n\n"), fingerprint("hi\n"));
	}

	#[test]
	fn unequal_fingerprints_for_different_text() {
		assert_ne!(fingerprint("hi\n"), fingerprint("bye\n"));
	}
}

// vim: ts=4
