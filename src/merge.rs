//! Three-way merge of ancestor/local/remote text.
//!
//! Diffs each side against the ancestor with `similar`'s line-level Myers
//! algorithm, then walks the ancestor line by line classifying each run as
//! unchanged, changed on one side, or changed on both (conflicting).

use similar::{ChangeTag, TextDiff};

use crate::fingerprint::normalize;

/// Result of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
	/// No conflict regions; `text` is the merged content.
	Clean(String),
	/// `n >= 1` unresolved regions; `text` contains conflict markers.
	Conflicted(String, usize),
}

const CONFLICT_START: &str = "<<<<<<< LOCAL";
const CONFLICT_SEP: &str = "=======";
const CONFLICT_END: &str = ">>>>>>> REMOTE";

/// Merge ancestor (`base`), local (`local`) and remote (`remote`) text.
///
/// All three inputs are normalized first so the merge never manufactures a
/// conflict out of pure formatting drift; edge cases (missing base,
/// identical sides) are checked before running the line-level algorithm.
pub fn merge(base: Option<&str>, local: &str, remote: &str) -> MergeResult {
	let local_n = normalize(local);
	let remote_n = normalize(remote);

	if local_n == remote_n {
		return MergeResult::Clean(local_n);
	}

	let Some(base) = base else {
		return MergeResult::Conflicted(conflict_block(&local_n, &remote_n), 1);
	};
	let base_n = normalize(base);

	if local_n == base_n {
		return MergeResult::Clean(remote_n);
	}
	if remote_n == base_n {
		return MergeResult::Clean(local_n);
	}

	three_way_merge(&base_n, &local_n, &remote_n)
}

fn conflict_block(local: &str, remote: &str) -> String {
	format!(
		"{}\n{}\n{}\n{}\n{}\n",
		CONFLICT_START,
		local.trim_end_matches('\n'),
		CONFLICT_SEP,
		remote.trim_end_matches('\n'),
		CONFLICT_END,
	)
}

/// One ancestor-relative operation: a run of ancestor lines was either kept,
/// replaced on one side, or replaced differently on both sides. Pure
/// insertions (no ancestor lines consumed) are folded into the same shape
/// with an empty `base` slice.
#[derive(Debug)]
enum Op<'a> {
	Keep(Vec<&'a str>),
	TakeLocal(Vec<&'a str>),
	TakeRemote(Vec<&'a str>),
	Conflict(Vec<&'a str>, Vec<&'a str>),
}

fn three_way_merge(base: &str, local: &str, remote: &str) -> MergeResult {
	let base_lines: Vec<&str> = base.lines().collect();
	let local_lines: Vec<&str> = local.lines().collect();
	let remote_lines: Vec<&str> = remote.lines().collect();

	let local_ops = align(&base_lines, &local_lines);
	let remote_ops = align(&base_lines, &remote_lines);

	let ops = reconcile(&local_ops, &remote_ops);

	let mut out = String::new();
	let mut conflicts = 0;
	for op in ops {
		match op {
			Op::Keep(lines) | Op::TakeLocal(lines) | Op::TakeRemote(lines) => {
				for l in lines {
					out.push_str(l);
					out.push('\n');
				}
			}
			Op::Conflict(local_lines, remote_lines) => {
				conflicts += 1;
				out.push_str(CONFLICT_START);
				out.push('\n');
				for l in local_lines {
					out.push_str(l);
					out.push('\n');
				}
				out.push_str(CONFLICT_SEP);
				out.push('\n');
				for l in remote_lines {
					out.push_str(l);
					out.push('\n');
				}
				out.push_str(CONFLICT_END);
				out.push('\n');
			}
		}
	}

	if conflicts == 0 {
		MergeResult::Clean(out)
	} else {
		MergeResult::Conflicted(out, conflicts)
	}
}

/// Per-ancestor-line-index classification of a single side: was this
/// ancestor line kept, and what (if anything) was inserted immediately
/// before it.
struct SideEdit<'a> {
	/// `kept[i]` is `Some(line)` if ancestor line `i` survives unchanged on
	/// this side, `None` if it was deleted/changed.
	kept: Vec<Option<&'a str>>,
	/// `inserted[i]` holds lines this side inserted immediately before
	/// ancestor line `i` (or, at index `base.len()`, at the end).
	inserted: Vec<Vec<&'a str>>,
}

fn align<'a>(base: &[&'a str], side: &[&'a str]) -> SideEdit<'a> {
	let diff = TextDiff::from_slices(base, side);
	let mut kept = vec![None; base.len()];
	let mut inserted = vec![Vec::new(); base.len() + 1];
	let mut base_idx = 0;

	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Equal => {
				kept[base_idx] = Some(change.value());
				base_idx += 1;
			}
			ChangeTag::Delete => {
				base_idx += 1;
			}
			ChangeTag::Insert => {
				inserted[base_idx].push(change.value());
			}
		}
	}

	SideEdit { kept, inserted }
}

fn reconcile<'a>(local: &SideEdit<'a>, remote: &SideEdit<'a>) -> Vec<Op<'a>> {
	let n = local.kept.len();
	let mut ops = Vec::new();

	for i in 0..=n {
		let l_ins = &local.inserted[i];
		let r_ins = &remote.inserted[i];
		if !l_ins.is_empty() || !r_ins.is_empty() {
			if l_ins == r_ins {
				ops.push(Op::Keep(l_ins.clone()));
			} else if r_ins.is_empty() {
				ops.push(Op::TakeLocal(l_ins.clone()));
			} else if l_ins.is_empty() {
				ops.push(Op::TakeRemote(r_ins.clone()));
			} else {
				ops.push(Op::Conflict(l_ins.clone(), r_ins.clone()));
			}
		}

		if i == n {
			break;
		}

		match (local.kept[i], remote.kept[i]) {
			(Some(line), Some(_)) => ops.push(Op::Keep(vec![line])),
			(Some(_), None) => ops.push(Op::TakeRemote(vec![])),
			(None, Some(_)) => ops.push(Op::TakeLocal(vec![])),
			(None, None) => {}
		}
	}

	ops
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_sides_are_clean_without_base() {
		assert_eq!(merge(None, "same\n", "same\n"), MergeResult::Clean("same\n".to_string()));
	}

	#[test]
	fn missing_base_with_divergent_sides_conflicts_once() {
		match merge(None, "Hi local\n", "Hi remote\n") {
			MergeResult::Conflicted(text, n) => {
				assert_eq!(n, 1);
				assert!(text.contains(CONFLICT_START));
				assert!(text.contains("Hi local"));
				assert!(text.contains("Hi remote"));
			}
			other => panic!("expected Conflicted, got {:?}", other),
		}
	}

	#[test]
	fn local_equals_base_takes_remote() {
		let base = "x\n";
		assert_eq!(merge(Some(base), base, "y\n"), MergeResult::Clean("y\n".to_string()));
	}

	#[test]
	fn remote_equals_base_takes_local() {
		let base = "x\n";
		assert_eq!(merge(Some(base), "y\n", base), MergeResult::Clean("y\n".to_string()));
	}

	#[test]
	fn scenario_4_single_conflict_region() {
		let base = "Hi\n";
		let result = merge(Some(base), "Hi local\n", "Hi remote\n");
		match result {
			MergeResult::Conflicted(text, n) => {
				assert_eq!(n, 1);
				let expected = "<<<<<<< LOCAL\nHi local\n=======\nHi remote\n>>>>>>> REMOTE\n";
				assert_eq!(text, expected);
			}
			other => panic!("expected Conflicted, got {:?}", other),
		}
	}

	#[test]
	fn disjoint_inserts_are_clean() {
		let base = "a\nb\nc\n";
		let local = "a\nLOCAL\nb\nc\n";
		let remote = "a\nb\nc\nREMOTE\n";
		match merge(Some(base), local, remote) {
			MergeResult::Clean(text) => {
				assert!(text.contains("LOCAL"));
				assert!(text.contains("REMOTE"));
			}
			other => panic!("expected Clean, got {:?}", other),
		}
	}

	#[test]
	fn identical_edit_on_both_sides_is_clean() {
		let base = "a\nb\nc\n";
		let edited = "a\nB\nc\n";
		assert_eq!(merge(Some(base), edited, edited), MergeResult::Clean(edited.to_string()));
	}

	#[test]
	fn non_overlapping_edits_merge_cleanly() {
		let base = "a\nb\nc\nd\n";
		let local = "A\nb\nc\nd\n";
		let remote = "a\nb\nc\nD\n";
		match merge(Some(base), local, remote) {
			MergeResult::Clean(text) => assert_eq!(text, "A\nb\nc\nD\n"),
			other => panic!("expected Clean, got {:?}", other),
		}
	}
}

// vim: ts=4
