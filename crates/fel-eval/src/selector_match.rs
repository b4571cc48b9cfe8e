use fel_parser::ast::CssCombinator;

use crate::css::{CssSelectorPartValue, CssSelectorValue};
use crate::value::HtmlValue;

/// Whether a single rendered node satisfies one non-combinator selector
/// part (source: `data.HTMLNode.HasSelectorPartMatch`). Class matching is
/// substring containment, exactly as the original does with
/// `strings.Contains` -- not an exact class-list match.
fn part_matches(node: &HtmlValue, part: &CssSelectorPartValue) -> bool {
    match part {
        CssSelectorPartValue::Class(name) => node.class_attribute().is_some_and(|classes| classes.contains(name.as_str())),
        CssSelectorPartValue::Id(name) => match node {
            HtmlValue::Element { attributes, .. } => attributes.iter().any(|(n, v)| n.as_ref() == "id" && v == name),
            _ => false,
        },
        CssSelectorPartValue::Tag(name) => node.tag_name() == Some(name.as_str()),
        // Attribute/pseudo/at-keyword/number selectors aren't matched
        // against the rendered tree for dead-CSS pruning purposes; treat
        // them as always-satisfied so a rule survives rather than being
        // dropped on a part kind the pruner can't evaluate.
        _ => true,
    }
}

/// True if `selector` matches somewhere at or below `root` (spec.md §9's
/// corrected walk): search the tree depth-first, and for every candidate
/// node that satisfies the selector's last (rightmost) part, verify every
/// remaining part leftward also matches **the same node**, stepping the
/// selector index down one per non-combinator part.
///
/// The inner walk must decrement its index since it scans a compound
/// selector's parts right-to-left starting from the second-to-last one; an
/// incrementing walk here would run past index 0 on any selector with more
/// than one compound part.
pub fn has_match_recursive(root: &HtmlValue, selector: &CssSelectorValue) -> bool {
    let Some(last) = selector.last() else { return false };
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if part_matches(node, last) && matches_remaining_parts(node, selector) {
            return true;
        }
        for child in node.children().iter().rev() {
            stack.push(child);
        }
    }
    false
}

/// Walks the selector's parts right-to-left starting just before the last
/// one, requiring the *same* node to satisfy every compound part (i.e. every
/// part not separated from its neighbor by a combinator). A combinator part
/// stops the compound-part check; full combinator-aware ancestor/sibling
/// matching is out of scope for the pruning pass, which only needs to
/// decide whether a rule is reachable at all.
fn matches_remaining_parts(node: &HtmlValue, selector: &CssSelectorValue) -> bool {
    if selector.len() <= 1 {
        return true;
    }
    let mut i = selector.len() as isize - 2;
    while i >= 0 {
        match &selector[i as usize] {
            CssSelectorPartValue::Combinator(_) => break,
            part => {
                if !part_matches(node, part) {
                    return false;
                }
            }
        }
        i -= 1;
    }
    true
}

/// True if `selector` contains only a lone `Ancestor`/`Child`/etc.
/// combinator with no surrounding parts -- malformed input the parser
/// would only produce from a dangling combinator; never matches.
pub fn is_degenerate(selector: &CssSelectorValue) -> bool {
    selector.iter().all(|p| matches!(p, CssSelectorPartValue::Combinator(CssCombinator::Ancestor)))
}
