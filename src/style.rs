//! Style cascade resolution.
//!
//! `compute_style_tree` is a pure function of (document, stylesheet):
//! it resolves, for every element and every style property, the winning
//! declaration plus the full ordered trail of losing declarations.
//! Rules that mutate the tree or the stylesheet must recompute; nothing
//! is cached across mutations.

use std::collections::HashMap;

use crate::ast::{Document, Element, NodeId};
use crate::css::{Stylesheet, parse_declarations};

/// Selector weight: (id-count, class-count, type-count).
/// Field order gives the CSS comparison for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub tags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One compound selector: `rect`, `#id`, `.a.b`, `*`, or a mix.
#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.ids.is_empty() && self.classes.is_empty()
    }

    fn matches(&self, elem: &ElemInfo) -> bool {
        if let Some(ref tag) = self.tag
            && tag != "*"
            && *tag != elem.tag
        {
            return false;
        }
        if self.ids.iter().any(|id| elem.id.as_deref() != Some(id)) {
            return false;
        }
        self.classes
            .iter()
            .all(|c| elem.classes.iter().any(|e| e == c))
    }
}

/// A parsed complex selector: compounds joined by descendant/child
/// combinators. Only the subset the optimizer targets; anything else
/// fails to parse and the rule is skipped for cascade purposes.
#[derive(Debug, Clone)]
pub struct Selector {
    parts: Vec<(Option<Combinator>, Compound)>,
}

impl Selector {
    pub fn parse(text: &str) -> Option<Selector> {
        let mut parts: Vec<(Option<Combinator>, Compound)> = Vec::new();
        let mut current = Compound::default();
        let mut pending: Option<Combinator> = None;
        let mut first = true;

        let mut chars = text.chars().peekable();
        while let Some(&c) = chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    chars.next();
                    if !current.is_empty() {
                        parts.push((if first { None } else { pending }, current));
                        current = Compound::default();
                        first = false;
                        pending = Some(Combinator::Descendant);
                    }
                }
                '>' => {
                    chars.next();
                    if !current.is_empty() {
                        parts.push((if first { None } else { pending }, current));
                        current = Compound::default();
                        first = false;
                    } else if parts.is_empty() {
                        return None;
                    }
                    pending = Some(Combinator::Child);
                }
                '*' => {
                    chars.next();
                    if current.tag.is_some() {
                        return None;
                    }
                    current.tag = Some("*".to_string());
                }
                '#' => {
                    chars.next();
                    let name = take_ident(&mut chars)?;
                    current.ids.push(name);
                }
                '.' => {
                    chars.next();
                    let name = take_ident(&mut chars)?;
                    current.classes.push(name);
                }
                c if is_ident_char(c) => {
                    if !current.is_empty() {
                        return None;
                    }
                    current.tag = Some(take_ident(&mut chars)?);
                }
                // attribute selectors, pseudo-classes, sibling
                // combinators: unsupported, skip the whole selector
                _ => return None,
            }
        }
        if !current.is_empty() {
            parts.push((if first { None } else { pending }, current));
        }
        if parts.is_empty() {
            return None;
        }
        Some(Selector { parts })
    }

    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::default();
        for (_, comp) in &self.parts {
            spec.ids += comp.ids.len() as u32;
            spec.classes += comp.classes.len() as u32;
            if comp.tag.as_deref().is_some_and(|t| t != "*") {
                spec.tags += 1;
            }
        }
        spec
    }

    /// Match against an element given its ancestor chain
    /// (`chain.last()` is the element itself).
    fn matches(&self, chain: &[ElemInfo]) -> bool {
        fn rec(
            parts: &[(Option<Combinator>, Compound)],
            idx: usize,
            chain: &[ElemInfo],
            pos: usize,
        ) -> bool {
            if idx == 0 {
                return true;
            }
            match parts[idx].0.unwrap_or(Combinator::Descendant) {
                Combinator::Child => {
                    pos > 0
                        && parts[idx - 1].1.matches(&chain[pos - 1])
                        && rec(parts, idx - 1, chain, pos - 1)
                }
                Combinator::Descendant => (0..pos).rev().any(|k| {
                    parts[idx - 1].1.matches(&chain[k]) && rec(parts, idx - 1, chain, k)
                }),
            }
        }

        let Some(last) = chain.last() else {
            return false;
        };
        let idx = self.parts.len() - 1;
        self.parts[idx].1.matches(last) && rec(&self.parts, idx, chain, chain.len() - 1)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<String> {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if is_ident_char(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Where a winning (or losing) declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOrigin {
    /// Presentation attribute (`fill="red"`), lowest priority.
    Attr,
    /// A matched `<style>` rule.
    StyleTag,
    /// The element's own `style` attribute.
    Inline,
    /// Computed value inherited from the nearest ancestor.
    Inherit,
}

/// A losing declaration in the override trail.
#[derive(Debug, Clone, PartialEq)]
pub struct OverriddenDecl {
    pub origin: StyleOrigin,
    pub selector: Option<String>,
    pub specificity: Option<Specificity>,
    pub important: bool,
    pub value: String,
}

/// The resolved value of one property on one element.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleEntry {
    pub value: String,
    pub origin: StyleOrigin,
    pub selector: Option<String>,
    pub specificity: Option<Specificity>,
    pub important: bool,
    /// Every losing declaration, most-specific-losing first, so callers
    /// can ask "is this property ever set by anything else".
    pub overridden: Vec<OverriddenDecl>,
}

/// Per-node style snapshots, keyed by element handle.
pub type StyleTree = HashMap<NodeId, HashMap<String, StyleEntry>>;

/// SVG presentation attributes the cascade treats as style properties,
/// with their CSS inheritance flag.
const PRESENTATION_ATTRS: &[(&str, bool)] = &[
    ("clip-path", false),
    ("clip-rule", true),
    ("color", true),
    ("color-interpolation", true),
    ("color-interpolation-filters", false),
    ("cursor", true),
    ("direction", true),
    ("display", false),
    ("dominant-baseline", false),
    ("fill", true),
    ("fill-opacity", true),
    ("fill-rule", true),
    ("filter", false),
    ("flood-color", false),
    ("flood-opacity", false),
    ("font-family", true),
    ("font-size", true),
    ("font-stretch", true),
    ("font-style", true),
    ("font-variant", true),
    ("font-weight", true),
    ("letter-spacing", true),
    ("lighting-color", false),
    ("marker-end", true),
    ("marker-mid", true),
    ("marker-start", true),
    ("mask", false),
    ("opacity", false),
    ("overflow", false),
    ("paint-order", true),
    ("pointer-events", true),
    ("shape-rendering", true),
    ("stop-color", false),
    ("stop-opacity", false),
    ("stroke", true),
    ("stroke-dasharray", true),
    ("stroke-dashoffset", true),
    ("stroke-linecap", true),
    ("stroke-linejoin", true),
    ("stroke-miterlimit", true),
    ("stroke-opacity", true),
    ("stroke-width", true),
    ("text-anchor", true),
    ("text-decoration", false),
    ("text-rendering", true),
    ("transform", false),
    ("vector-effect", false),
    ("visibility", true),
    ("word-spacing", true),
    ("writing-mode", true),
];

/// Is `name` a presentation attribute? Returns its inheritance flag.
pub fn presentation_attr(name: &str) -> Option<bool> {
    PRESENTATION_ATTRS
        .binary_search_by(|(n, _)| n.cmp(&name))
        .ok()
        .map(|i| PRESENTATION_ATTRS[i].1)
}

pub fn is_inheritable(name: &str) -> bool {
    presentation_attr(name).unwrap_or(false)
}

struct ElemInfo {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
}

impl ElemInfo {
    fn of(elem: &Element) -> ElemInfo {
        ElemInfo {
            tag: elem.name.local.clone(),
            id: elem.get_attr("id").map(|s| s.to_string()),
            classes: elem
                .get_attr("class")
                .map(|c| c.split_whitespace().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

struct MatchRule<'a> {
    selector: Selector,
    text: &'a str,
    specificity: Specificity,
    order: usize,
    declarations: &'a [crate::css::Declaration],
}

#[derive(Debug)]
struct Candidate<'a> {
    origin: StyleOrigin,
    important: bool,
    specificity: Option<Specificity>,
    order: (usize, usize),
    selector: Option<&'a str>,
    value: String,
}

impl Candidate<'_> {
    // Cascade priority: presentation attribute, then style-tag rules,
    // then inline style; important declarations outrank non-important
    // ones but still respect specificity among themselves.
    fn rank(&self) -> u8 {
        match (self.origin, self.important) {
            (StyleOrigin::Attr, _) => 0,
            (StyleOrigin::StyleTag, false) => 1,
            (StyleOrigin::Inline, false) => 2,
            (StyleOrigin::StyleTag, true) => 3,
            (StyleOrigin::Inline, true) => 4,
            (StyleOrigin::Inherit, _) => 0,
        }
    }
}

/// Compute the full style snapshot for every element.
pub fn compute_style_tree(doc: &Document, stylesheet: Option<&Stylesheet>) -> StyleTree {
    let mut match_rules: Vec<MatchRule> = Vec::new();
    if let Some(sheet) = stylesheet {
        let mut order = 0usize;
        for rule in sheet.rules() {
            for sel_text in &rule.selectors {
                if let Some(selector) = Selector::parse(sel_text) {
                    match_rules.push(MatchRule {
                        specificity: selector.specificity(),
                        selector,
                        text: sel_text,
                        order,
                        declarations: &rule.declarations,
                    });
                }
                order += 1;
            }
        }
    }

    let mut tree = StyleTree::new();
    let mut chain = Vec::new();
    visit(&doc.root, &match_rules, &mut chain, &HashMap::new(), &mut tree);
    tree
}

fn visit(
    elem: &Element,
    rules: &[MatchRule],
    chain: &mut Vec<ElemInfo>,
    parent: &HashMap<String, StyleEntry>,
    tree: &mut StyleTree,
) {
    chain.push(ElemInfo::of(elem));

    let mut candidates: HashMap<String, Vec<Candidate>> = HashMap::new();

    // Presentation attributes: zero-specificity lowest origin.
    for (i, attr) in elem.attributes.iter().enumerate() {
        if attr.name.prefix.is_none() && presentation_attr(&attr.name.local).is_some() {
            candidates
                .entry(attr.name.local.clone())
                .or_default()
                .push(Candidate {
                    origin: StyleOrigin::Attr,
                    important: false,
                    specificity: None,
                    order: (i, 0),
                    selector: None,
                    value: attr.value.clone(),
                });
        }
    }

    // Matched style-tag rules.
    for rule in rules {
        if !rule.selector.matches(chain) {
            continue;
        }
        for (di, decl) in rule.declarations.iter().enumerate() {
            candidates
                .entry(decl.property.clone())
                .or_default()
                .push(Candidate {
                    origin: StyleOrigin::StyleTag,
                    important: decl.important,
                    specificity: Some(rule.specificity),
                    order: (rule.order, di),
                    selector: Some(rule.text),
                    value: decl.value.clone(),
                });
        }
    }

    // Inline style attribute.
    if let Some(style) = elem.get_attr("style") {
        for (di, decl) in parse_declarations(style).into_iter().enumerate() {
            candidates
                .entry(decl.property.clone())
                .or_default()
                .push(Candidate {
                    origin: StyleOrigin::Inline,
                    important: decl.important,
                    specificity: None,
                    order: (usize::MAX, di),
                    selector: None,
                    value: decl.value,
                });
        }
    }

    let mut resolved: HashMap<String, StyleEntry> = HashMap::new();
    for (property, mut list) in candidates {
        list.sort_by_key(|c| (c.rank(), c.specificity.unwrap_or_default(), c.order));
        let Some(winner) = list.pop() else { continue };
        let overridden = list
            .into_iter()
            .rev()
            .map(|c| OverriddenDecl {
                origin: c.origin,
                selector: c.selector.map(|s| s.to_string()),
                specificity: c.specificity,
                important: c.important,
                value: c.value,
            })
            .collect();
        resolved.insert(
            property,
            StyleEntry {
                value: winner.value,
                origin: winner.origin,
                selector: winner.selector.map(|s| s.to_string()),
                specificity: winner.specificity,
                important: winner.important,
                overridden,
            },
        );
    }

    // Inheritance fills properties the node does not set itself.
    for (property, entry) in parent {
        if is_inheritable(property) && !resolved.contains_key(property) {
            resolved.insert(
                property.clone(),
                StyleEntry {
                    value: entry.value.clone(),
                    origin: StyleOrigin::Inherit,
                    selector: None,
                    specificity: None,
                    important: false,
                    overridden: Vec::new(),
                },
            );
        }
    }

    for child in elem.child_elements() {
        visit(child, rules, chain, &resolved, tree);
    }
    tree.insert(elem.id, resolved);

    chain.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parse_stylesheet;
    use crate::parse::parse_svg;

    fn styles_for<'a>(tree: &'a StyleTree, doc: &Document, tag: &str) -> &'a HashMap<String, StyleEntry> {
        let mut id = None;
        doc.for_each_element(|e| {
            if e.is(tag) {
                id = Some(e.id);
            }
        });
        &tree[&id.unwrap()]
    }

    #[test]
    fn test_specificity_order() {
        let id = Selector::parse("#a").unwrap().specificity();
        let class = Selector::parse(".a.b").unwrap().specificity();
        let tag = Selector::parse("rect").unwrap().specificity();
        assert!(id > class);
        assert!(class > tag);
        assert_eq!(class, Specificity { ids: 0, classes: 2, tags: 0 });
    }

    #[test]
    fn test_selector_parse_unsupported() {
        assert!(Selector::parse("a:hover").is_none());
        assert!(Selector::parse("text[id^=red]").is_none());
        assert!(Selector::parse("a + b").is_none());
        assert!(Selector::parse("g > rect").is_some());
        assert!(Selector::parse("* .a").is_some());
    }

    #[test]
    fn test_descendant_and_child_matching() {
        let doc = parse_svg(r#"<svg><g class="outer"><g><rect class="r"/></g></g></svg>"#).unwrap();
        let sheet = parse_stylesheet(
            ".outer .r{fill:red}.outer > .r{stroke:blue}svg rect{opacity:0.5}",
        )
        .unwrap();
        let tree = compute_style_tree(&doc, Some(&sheet));
        let rect = styles_for(&tree, &doc, "rect");
        // descendant matches through the intermediate <g>
        assert_eq!(rect["fill"].value, "red");
        // child combinator does not
        assert!(!rect.contains_key("stroke"));
        assert_eq!(rect["opacity"].value, "0.5");
    }

    #[test]
    fn test_cascade_order_and_trail() {
        let doc = parse_svg(r#"<svg><rect class="a" fill="red" style="fill:blue"/></svg>"#).unwrap();
        let sheet = parse_stylesheet(".a{fill:green}").unwrap();
        let tree = compute_style_tree(&doc, Some(&sheet));
        let entry = &styles_for(&tree, &doc, "rect")["fill"];
        assert_eq!(entry.value, "blue");
        assert_eq!(entry.origin, StyleOrigin::Inline);
        // trail is most-specific-losing first
        assert_eq!(entry.overridden.len(), 2);
        assert_eq!(entry.overridden[0].origin, StyleOrigin::StyleTag);
        assert_eq!(entry.overridden[0].value, "green");
        assert_eq!(entry.overridden[1].origin, StyleOrigin::Attr);
        assert_eq!(entry.overridden[1].value, "red");
    }

    #[test]
    fn test_important_beats_inline() {
        let doc = parse_svg(r#"<svg><rect class="a" style="fill:blue"/></svg>"#).unwrap();
        let sheet = parse_stylesheet(".a{fill:green!important}").unwrap();
        let tree = compute_style_tree(&doc, Some(&sheet));
        let entry = &styles_for(&tree, &doc, "rect")["fill"];
        assert_eq!(entry.value, "green");
        assert!(entry.important);
    }

    #[test]
    fn test_important_respects_specificity() {
        let doc = parse_svg(r#"<svg><rect id="x" class="a"/></svg>"#).unwrap();
        let sheet =
            parse_stylesheet("#x{fill:red!important}.a{fill:green!important}").unwrap();
        let tree = compute_style_tree(&doc, Some(&sheet));
        assert_eq!(styles_for(&tree, &doc, "rect")["fill"].value, "red");
    }

    #[test]
    fn test_source_order_tie_break() {
        let doc = parse_svg(r#"<svg><rect class="a"/></svg>"#).unwrap();
        let sheet = parse_stylesheet(".a{fill:red}.a{fill:green}").unwrap();
        let tree = compute_style_tree(&doc, Some(&sheet));
        let entry = &styles_for(&tree, &doc, "rect")["fill"];
        assert_eq!(entry.value, "green");
        assert_eq!(entry.overridden[0].value, "red");
    }

    #[test]
    fn test_inheritance() {
        let doc = parse_svg(r#"<svg><g fill="red" opacity="0.5"><rect/></g></svg>"#).unwrap();
        let tree = compute_style_tree(&doc, None);
        let rect = styles_for(&tree, &doc, "rect");
        assert_eq!(rect["fill"].origin, StyleOrigin::Inherit);
        assert_eq!(rect["fill"].value, "red");
        // opacity does not inherit
        assert!(!rect.contains_key("opacity"));
    }

    #[test]
    fn test_presentation_attr_table_is_sorted() {
        for pair in PRESENTATION_ATTRS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }
}
