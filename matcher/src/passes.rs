//! Passes run over the groups once the tree walk is done.

use explain_core::ast::Span;
use explain_core::{MatchGroup, MatchResult};
use tracing::debug;

use crate::error::{MatchError, Result};
use crate::help;

/// Splits `span` into the pieces not covered by any of `holes`.
///
/// Holes are expected to lie inside `span`; empty pieces are dropped.
pub(crate) fn split_around(span: Span, holes: &[Span]) -> Vec<Span> {
    let mut holes = holes.to_vec();
    holes.sort();
    let mut pieces = Vec::new();
    let mut pos = span.start;
    for hole in holes {
        if hole.start > pos {
            pieces.push(Span::new(pos, hole.start.min(span.end)));
        }
        pos = pos.max(hole.end);
    }
    if pos < span.end {
        pieces.push(Span::new(pos, span.end));
    }
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

/// Coalesces results of a group that carry the same explanation and have
/// nothing from any group between them.
///
/// Unknown results are never coalesced. Running the pass twice gives the
/// same groups as running it once.
pub fn merge_adjacent(groups: &mut [MatchGroup]) {
    for group in groups.iter_mut() {
        group.results.sort_by_key(|r| (r.start, r.end));
    }

    let mut order: Vec<(usize, usize, usize)> = Vec::new();
    for (g, group) in groups.iter().enumerate() {
        for (r, result) in group.results.iter().enumerate() {
            order.push((result.start, g, r));
        }
    }
    order.sort();
    let mut rank = vec![Vec::new(); groups.len()];
    for (g, group) in groups.iter().enumerate() {
        rank[g] = vec![0; group.results.len()];
    }
    for (position, &(_, g, r)) in order.iter().enumerate() {
        rank[g][r] = position;
    }

    for (g, group) in groups.iter_mut().enumerate() {
        let before = group.results.len();
        let mut merged: Vec<MatchResult> = Vec::with_capacity(before);
        let mut last_rank = 0;
        for (r, result) in group.results.drain(..).enumerate() {
            if let Some(previous) = merged.last_mut() {
                if result.text.is_some() && previous.text == result.text && rank[g][r] == last_rank + 1 {
                    previous.end = previous.end.max(result.end);
                    last_rank = rank[g][r];
                    continue;
                }
            }
            last_rank = rank[g][r];
            merged.push(result);
        }
        if merged.len() != before {
            debug!(group = %group.name, before, after = merged.len(), "merged adjacent results");
        }
        group.results = merged;
    }
}

/// Fills every byte range no group covers with an unknown result in the
/// shell group.
///
/// A `#` found at or past `tree_end` in the trailing gap starts a comment
/// that runs to the end of the input.
pub fn mark_unparsed_unknown(groups: &mut [MatchGroup], source: &str, tree_end: usize) {
    if groups.is_empty() {
        return;
    }
    let mut covered: Vec<Span> = groups
        .iter()
        .flat_map(|g| g.results.iter().map(MatchResult::span))
        .collect();
    covered.sort();

    let mut gaps = Vec::new();
    let mut pos = 0;
    for span in covered {
        if span.start > pos {
            gaps.push(Span::new(pos, span.start));
        }
        pos = pos.max(span.end);
    }
    if pos < source.len() {
        gaps.push(Span::new(pos, source.len()));
    }

    let shell = &mut groups[0];
    for gap in gaps {
        if gap.end == source.len() {
            if let Some(comment) = comment_start(source, gap, tree_end) {
                if comment > gap.start {
                    shell.results.push(MatchResult::unknown(gap.start, comment));
                }
                shell
                    .results
                    .push(MatchResult::new(comment, source.len(), Some(help::COMMENT.to_string())));
                continue;
            }
        }
        shell.results.push(MatchResult::unknown(gap.start, gap.end));
    }
    shell.results.sort_by_key(|r| (r.start, r.end));
}

fn comment_start(source: &str, gap: Span, tree_end: usize) -> Option<usize> {
    let text = source.get(gap.start..gap.end)?;
    text.char_indices()
        .map(|(i, c)| (gap.start + i, c))
        .find(|&(at, c)| c == '#' && at >= tree_end)
        .map(|(at, _)| at)
}

/// Copies the covered slice of `source` into every result.
///
/// # Errors
///
/// Returns [`MatchError::OutOfBounds`] for a span past the end of `source`
/// or one that does not fall on character boundaries.
pub fn fill_matched(groups: &mut [MatchGroup], source: &str) -> Result<()> {
    for result in groups.iter_mut().flat_map(|g| g.results.iter_mut()) {
        let slice = source
            .get(result.start..result.end)
            .ok_or(MatchError::OutOfBounds {
                start: result.start,
                end: result.end,
                len: source.len(),
            })?;
        result.matched = slice.to_string();
    }
    Ok(())
}

/// Verifies that no byte is covered by two results, across all groups.
///
/// # Errors
///
/// Returns [`MatchError::Overlap`] naming the first offending pair.
pub fn check_overlaps(groups: &[MatchGroup]) -> Result<()> {
    let mut spans: Vec<Span> = groups
        .iter()
        .flat_map(|g| g.results.iter().map(MatchResult::span))
        .filter(|span| !span.is_empty())
        .collect();
    spans.sort();
    for pair in spans.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(MatchError::Overlap {
                first: pair[0],
                second: pair[1],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(start: usize, end: usize, text: Option<&str>) -> MatchResult {
        MatchResult::new(start, end, text.map(str::to_string))
    }

    fn group(name: &str, results: Vec<MatchResult>) -> MatchGroup {
        let mut group = MatchGroup::new(name);
        group.results = results;
        group
    }

    #[test]
    fn test_split_around() {
        let span = Span::new(0, 10);
        assert_eq!(split_around(span, &[]), [span]);
        assert_eq!(
            split_around(span, &[Span::new(2, 4), Span::new(6, 10)]),
            [Span::new(0, 2), Span::new(4, 6)]
        );
        assert!(split_around(span, &[span]).is_empty());
    }

    #[test]
    fn test_merge_adjacent_is_idempotent() {
        let mut groups = vec![
            MatchGroup::shell(),
            group(
                "command0",
                vec![
                    result(0, 3, Some("bar")),
                    result(4, 5, Some("-x")),
                    result(5, 6, Some("-x")),
                    result(7, 8, None),
                    result(8, 9, None),
                ],
            ),
        ];
        merge_adjacent(&mut groups);
        let once = groups.clone();
        merge_adjacent(&mut groups);
        assert_eq!(groups, once);

        let spans: Vec<_> = groups[1].results.iter().map(MatchResult::span).collect();
        assert_eq!(
            spans,
            [Span::new(0, 3), Span::new(4, 6), Span::new(7, 8), Span::new(8, 9)]
        );
    }

    #[test]
    fn test_merge_skips_results_separated_by_another_group() {
        let mut groups = vec![
            MatchGroup::shell(),
            group("command0", vec![result(0, 4, Some("-exec")), result(8, 10, Some("-exec"))]),
            group("command1", vec![result(5, 7, Some("ls"))]),
        ];
        merge_adjacent(&mut groups);
        assert_eq!(groups[1].results.len(), 2);
    }

    #[test]
    fn test_mark_unparsed_unknown_and_comment() {
        let source = "echo hi # note";
        let mut groups = vec![
            MatchGroup::shell(),
            group("command0", vec![result(0, 4, Some("echo")), result(5, 7, None)]),
        ];
        mark_unparsed_unknown(&mut groups, source, 7);
        let shell: Vec<_> = groups[0].results.iter().map(|r| (r.span(), r.is_unknown())).collect();
        assert_eq!(
            shell,
            [
                (Span::new(4, 5), true),
                (Span::new(7, 8), true),
                (Span::new(8, 14), false)
            ]
        );
        assert_eq!(groups[0].results[2].text.as_deref(), Some(help::COMMENT));
    }

    #[test]
    fn test_hash_inside_tree_is_not_a_comment() {
        let source = "echo a#b";
        let mut groups = vec![MatchGroup::shell(), group("command0", vec![result(0, 4, Some("echo"))])];
        mark_unparsed_unknown(&mut groups, source, 8);
        assert_eq!(groups[0].results, [result(4, 8, None)]);
    }

    #[test]
    fn test_check_overlaps() {
        let good = vec![group("a", vec![result(0, 2, None)]), group("b", vec![result(2, 4, None)])];
        assert!(check_overlaps(&good).is_ok());

        let bad = vec![group("a", vec![result(0, 3, None)]), group("b", vec![result(2, 4, None)])];
        assert!(matches!(
            check_overlaps(&bad),
            Err(MatchError::Overlap { first, second }) if first == Span::new(0, 3) && second == Span::new(2, 4)
        ));
    }

    #[test]
    fn test_fill_matched_rejects_out_of_bounds() {
        let mut groups = vec![group("a", vec![result(0, 3, None)])];
        fill_matched(&mut groups, "ls -l").unwrap();
        assert_eq!(groups[0].results[0].matched, "ls ");

        let mut groups = vec![group("a", vec![result(3, 9, None)])];
        assert!(matches!(
            fill_matched(&mut groups, "ls -l"),
            Err(MatchError::OutOfBounds { len: 5, .. })
        ));
    }
}
