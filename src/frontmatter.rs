//! Frontmatter parsing: the small YAML-flavored header that carries a
//! tracked file's page identity.
//!
//! Delimited by a line containing exactly `---`, a payload in mapping
//! syntax, and a closing `---`. Recognized keys: `id` (required for tracked
//! files), `title` (optional).

use gray_matter::{engine::YAML, Matter};
use serde::{Deserialize, Serialize};

/// Parsed frontmatter payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Frontmatter {
	pub id: Option<String>,
	pub title: Option<String>,
}

/// Split `content` into its frontmatter (if any) and body.
///
/// A file that doesn't start with `---` has no frontmatter at all: the
/// whole input is the body. A file that starts with `---` but never finds a
/// closing delimiter is treated the same way, since the header is then
/// malformed rather than absent.
pub fn strip_frontmatter(content: &str) -> (Option<Frontmatter>, &str) {
	if !content.starts_with("---") {
		return (None, content);
	}

	let rest = &content[3..];
	let Some(end_offset) = rest.find("\n---") else {
		return (None, content);
	};

	let block_end = 3 + end_offset + 4; // consume the closing "\n---"
	let frontmatter_block = &content[..3 + end_offset];
	// frontmatter_block is "---\n<payload>" (without the closing ---);
	// gray_matter wants the full "---\n...\n---\n" fenced block instead.
	let fenced = format!("{}\n---", frontmatter_block);

	let body_start = content[block_end..]
		.find('\n')
		.map(|i| block_end + i + 1)
		.unwrap_or(content.len());
	let body = &content[body_start..];

	let matter = Matter::<YAML>::new();
	match matter.parse::<Frontmatter>(&fenced) {
		Ok(parsed) => (Some(parsed.data.unwrap_or_default()), body),
		Err(_) => (None, body),
	}
}

/// Render a frontmatter header followed by `body`, used when writing a file
/// back to disk on pull/add.
pub fn render_frontmatter(fm: &Frontmatter, body: &str) -> String {
	let mut out = String::from("---\n");
	if let Some(id) = &fm.id {
		out.push_str(&format!("id: {}\n", id));
	}
	if let Some(title) = &fm.title {
		out.push_str(&format!("title: {}\n", yaml_scalar(title)));
	}
	out.push_str("---\n");
	out.push_str(body);
	out
}

fn yaml_scalar(s: &str) -> String {
	if s.chars().any(|c| matches!(c, ':' | '#' | '\'' | '"')) {
		format!("\"{}\"", s.replace('"', "\\\""))
	} else {
		s.to_string()
	}
}

/// The PageId a tracked file's frontmatter claims, if any.
pub fn frontmatter_id(content: &str) -> Option<String> {
	strip_frontmatter(content).0.and_then(|fm| fm.id)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn no_frontmatter_returns_whole_body() {
		let (fm, body) = strip_frontmatter("Hi\n");
		assert!(fm.is_none());
		assert_eq!(body, "Hi\n");
	}

	#[test]
	fn parses_id_and_title() {
		let content = "---\nid: P1\ntitle: Intro\n---\nHi\n";
		let (fm, body) = strip_frontmatter(content);
		let fm = fm.unwrap();
		assert_eq!(fm.id.as_deref(), Some("P1"));
		assert_eq!(fm.title.as_deref(), Some("Intro"));
		assert_eq!(body, "Hi\n");
	}

	#[test]
	fn unclosed_header_is_treated_as_no_frontmatter() {
		let content = "---\nid: P1\nHi\n";
		let (fm, body) = strip_frontmatter(content);
		assert!(fm.is_none());
		assert_eq!(body, content);
	}

	#[test]
	fn render_then_strip_round_trips_id() {
		let fm = Frontmatter { id: Some("P2".into()), title: Some("Guide".into()) };
		let rendered = render_frontmatter(&fm, "# Guide\n");
		let (parsed, body) = strip_frontmatter(&rendered);
		assert_eq!(parsed.unwrap().id.as_deref(), Some("P2"));
		assert_eq!(body, "# Guide\n");
	}

	#[test]
	fn frontmatter_id_helper() {
		assert_eq!(frontmatter_id("---\nid: P1\n---\nHi\n"), Some("P1".to_string()));
		assert_eq!(frontmatter_id("Hi\n"), None);
	}
}

// vim: ts=4
