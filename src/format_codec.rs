//! `FormatCodec`: translation between Markdown (frontmatter already
//! stripped) and the remote wiki's storage format.
//!
//! The remote storage format and its exact macro catalog are an external
//! collaborator's concern (see module docs on `RemoteStore`); this module
//! ships one concrete, best-effort implementation so the contract has at
//! least one testable side. Recognized constructs: paragraphs, headings,
//! emphasis/strong, inline code, fenced code blocks (with language), bullet
//! and ordered lists, links, and task list items. Anything wrapped in
//! `::: name ... :::` is threaded through both directions as an opaque
//! block, untouched.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Pure, deterministic translation between Markdown and wiki storage text.
pub trait FormatCodec: Send + Sync {
	fn markdown_to_storage(&self, md_text: &str) -> String;
	fn storage_to_markdown(&self, storage_text: &str) -> String;
}

/// Default `FormatCodec`, built on `pulldown-cmark` for the Markdown side.
pub struct MarkdownStorageCodec;

impl FormatCodec for MarkdownStorageCodec {
	fn markdown_to_storage(&self, md_text: &str) -> String {
		let (opaque_stripped, placeholders) = extract_opaque_blocks(md_text);

		let mut options = Options::empty();
		options.insert(Options::ENABLE_STRIKETHROUGH);
		options.insert(Options::ENABLE_TABLES);
		options.insert(Options::ENABLE_TASKLISTS);

		let parser = Parser::new_ext(&opaque_stripped, options);
		let mut out = String::new();
		let mut list_stack: Vec<bool> = Vec::new(); // true = ordered

		for event in parser {
			match event {
				Event::Start(Tag::Paragraph) => out.push_str("<p>"),
				Event::End(TagEnd::Paragraph) => out.push_str("</p>\n"),
				Event::Start(Tag::Heading { level, .. }) => {
					out.push_str(&format!("<{}>", heading_tag(level)))
				}
				Event::End(TagEnd::Heading(level)) => {
					out.push_str(&format!("</{}>\n", heading_tag(level)))
				}
				Event::Start(Tag::Emphasis) => out.push_str("<em>"),
				Event::End(TagEnd::Emphasis) => out.push_str("</em>"),
				Event::Start(Tag::Strong) => out.push_str("<strong>"),
				Event::End(TagEnd::Strong) => out.push_str("</strong>"),
				Event::Start(Tag::CodeBlock(kind)) => {
					let lang = match &kind {
						pulldown_cmark::CodeBlockKind::Fenced(lang) if !lang.is_empty() => {
							format!(" language=\"{}\"", lang)
						}
						_ => String::new(),
					};
					out.push_str(&format!("<pre{}><code>", lang));
				}
				Event::End(TagEnd::CodeBlock) => out.push_str("</code></pre>\n"),
				Event::Start(Tag::List(start)) => {
					list_stack.push(start.is_some());
					out.push_str(if start.is_some() { "<ol>" } else { "<ul>" });
				}
				Event::End(TagEnd::List(_)) => {
					let ordered = list_stack.pop().unwrap_or(false);
					out.push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
				}
				Event::Start(Tag::Item) => out.push_str("<li>"),
				Event::End(TagEnd::Item) => out.push_str("</li>"),
				Event::Start(Tag::Link { dest_url, .. }) => {
					out.push_str(&format!("<a href=\"{}\">", dest_url))
				}
				Event::End(TagEnd::Link) => out.push_str("</a>"),
				Event::Code(text) => out.push_str(&format!("<code>{}</code>", text)),
				Event::Text(text) => out.push_str(&escape_html(&text)),
				Event::SoftBreak | Event::HardBreak => out.push('\n'),
				Event::TaskListMarker(checked) => {
					out.push_str(if checked { "[x] " } else { "[ ] " })
				}
				_ => {}
			}
		}

		restore_opaque_blocks(out, &placeholders)
	}

	fn storage_to_markdown(&self, storage_text: &str) -> String {
		let (stripped, placeholders) = extract_opaque_blocks(storage_text);
		let md = storage_html_to_markdown(&stripped);
		restore_opaque_blocks(md, &placeholders)
	}
}

fn heading_tag(level: HeadingLevel) -> &'static str {
	match level {
		HeadingLevel::H1 => "h1",
		HeadingLevel::H2 => "h2",
		HeadingLevel::H3 => "h3",
		HeadingLevel::H4 => "h4",
		HeadingLevel::H5 => "h5",
		HeadingLevel::H6 => "h6",
	}
}

fn escape_html(s: &str) -> String {
	s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape_html(s: &str) -> String {
	s.replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// Very small, line-oriented storage-to-markdown pass. The storage format is
/// our own XHTML-ish subset (see `markdown_to_storage`), not general HTML,
/// so a full parser isn't required: each recognized element is opened and
/// closed on predictable boundaries.
fn storage_html_to_markdown(storage: &str) -> String {
	let mut out = String::new();
	let mut rest = storage;

	while !rest.is_empty() {
		if let Some(body) = strip_tag(rest, "p") {
			out.push_str(&unescape_html(body.0));
			out.push_str("\n\n");
			rest = body.1;
		} else if let Some((level, body, remainder)) = strip_heading(rest) {
			out.push_str(&"#".repeat(level));
			out.push(' ');
			out.push_str(&unescape_html(body));
			out.push_str("\n\n");
			rest = remainder;
		} else if let Some(body) = strip_tag(rest, "pre") {
			let inner = body.0.trim_start_matches("<code>").trim_end_matches("</code>");
			out.push_str("```\n");
			out.push_str(&unescape_html(inner));
			out.push_str("\n```\n\n");
			rest = body.1;
		} else if rest.starts_with('\n') {
			rest = &rest[1..];
		} else {
			// Unrecognized byte: copy it through verbatim rather than drop it,
			// so unknown content never silently disappears.
			let mut chars = rest.chars();
			if let Some(c) = chars.next() {
				out.push(c);
			}
			rest = chars.as_str();
		}
	}

	while out.ends_with('\n') {
		out.pop();
	}
	out.push('\n');
	out
}

fn strip_tag<'a>(input: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
	let open = format!("<{}>", tag);
	let close = format!("</{}>", tag);
	if let Some(rest) = input.strip_prefix(&open) {
		if let Some(end) = rest.find(&close) {
			let body = &rest[..end];
			let remainder = &rest[end + close.len()..];
			return Some((body, remainder));
		}
	}
	None
}

fn strip_heading(input: &str) -> Option<(usize, &str, &str)> {
	for level in 1..=6 {
		let open = format!("<h{}>", level);
		let close = format!("</h{}>", level);
		if let Some(rest) = input.strip_prefix(&open) {
			if let Some(end) = rest.find(&close) {
				let body = &rest[..end];
				let remainder = &rest[end + close.len()..];
				return Some((level, body, remainder));
			}
		}
	}
	None
}

/// Replace every `::: name ... :::` block with a placeholder token so the
/// parse pass never touches it, then hand back the originals for
/// restoration after translation.
fn extract_opaque_blocks(text: &str) -> (String, Vec<String>) {
	let mut placeholders = Vec::new();
	let mut out = String::new();
	let mut rest = text;

	while let Some(start) = rest.find(":::") {
		let (before, after_start) = rest.split_at(start);
		let Some(rel_end) = after_start[3..].find(":::") else {
			out.push_str(rest);
			rest = "";
			break;
		};
		let block_end = 3 + rel_end + 3;
		let block = &after_start[..block_end];

		out.push_str(before);
		let token = format!("\u{0}OPAQUE{}\u{0}", placeholders.len());
		out.push_str(&token);
		placeholders.push(block.to_string());

		rest = &after_start[block_end..];
	}
	out.push_str(rest);

	(out, placeholders)
}

fn restore_opaque_blocks(mut text: String, placeholders: &[String]) -> String {
	for (i, block) in placeholders.iter().enumerate() {
		let token = format!("\u{0}OPAQUE{}\u{0}", i);
		text = text.replace(&token, block);
	}
	text
}


// vim: ts=4
