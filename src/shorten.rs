//! Identifier shortening: rewrite ids and class names to the shortest
//! names the alphabet allows, drop the ones nothing references, and
//! delete reference sites whose target does not exist.
//!
//! References are collected first, so names are assigned in reference
//! order and re-running the pass maps every name to itself.

use std::collections::{HashMap, HashSet};

use crate::ast::{Document, NodeId};
use crate::css::{Stylesheet, declarations_to_css, parse_declarations};

const HEAD_CHARS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TAIL_CHARS: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates `a`..`Z`, `aa`..`Z9`, `aaa`.. in order. The first
/// character is always a letter so names stay valid as XML ids and
/// CSS identifiers; later characters may be digits. Reserved names
/// are skipped.
pub struct ShortNameGen {
    index: usize,
    reserved: HashSet<String>,
}

impl ShortNameGen {
    pub fn new() -> Self {
        Self {
            index: 0,
            reserved: HashSet::new(),
        }
    }

    pub fn with_reserved(reserved: HashSet<String>) -> Self {
        Self { index: 0, reserved }
    }

    pub fn next_name(&mut self) -> String {
        loop {
            let name = encode(self.index);
            self.index += 1;
            if !self.reserved.contains(&name) {
                return name;
            }
        }
    }
}

impl Default for ShortNameGen {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(mut i: usize) -> String {
    // 52 one-char names, 52*62 two-char names, and so on
    let mut len = 1usize;
    let mut count = HEAD_CHARS.len();
    while i >= count {
        i -= count;
        count = count.saturating_mul(TAIL_CHARS.len());
        len += 1;
    }

    let tail_len = len - 1;
    let tail_space = TAIL_CHARS.len().pow(tail_len as u32);
    let mut out = String::with_capacity(len);
    out.push(HEAD_CHARS[i / tail_space] as char);

    let mut rest = i % tail_space;
    let mut tail = vec![0u8; tail_len];
    for slot in tail.iter_mut().rev() {
        *slot = TAIL_CHARS[rest % TAIL_CHARS.len()];
        rest /= TAIL_CHARS.len();
    }
    for b in tail {
        out.push(b as char);
    }
    out
}

/// Where one reference to an identifier lives, so the cleanup pass can
/// delete it if the target never materializes. Nodes are addressed by
/// id and re-resolved at mutation time.
enum RefSite {
    Selector,
    Attr { node: NodeId, name: String },
    StyleDecl { node: NodeId, property: String },
}

struct Record {
    short: String,
    referenced: bool,
    sites: Vec<RefSite>,
}

fn record_for<'r>(
    records: &'r mut HashMap<String, Record>,
    names: &mut ShortNameGen,
    name: &str,
) -> &'r mut Record {
    records.entry(name.to_string()).or_insert_with(|| Record {
        short: names.next_name(),
        referenced: false,
        sites: Vec::new(),
    })
}

/// Attributes whose value is a bare IRI (`#name`).
const IRI_ATTRS: &[&str] = &["href", "xlink:href"];

/// Attributes (and style properties) whose value may be a funcIRI
/// (`url(#name)`).
const FUNC_IRI_ATTRS: &[&str] = &[
    "clip-path",
    "color-profile",
    "cursor",
    "fill",
    "filter",
    "marker",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask",
    "stroke",
];

fn extract_func_iri(value: &str) -> Option<&str> {
    let inner = value.trim().strip_prefix("url(")?.strip_suffix(')')?;
    let inner = inner.trim();
    let inner = inner
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(inner);
    inner.strip_prefix('#')
}

/// Shorten all referenced ids and delete the rest.
///
/// Reference sites (ID selectors, IRI and funcIRI attributes, funcIRI
/// style declarations) are rewritten first; then id attributes are
/// renamed when a reference exists and removed when none does. Sites
/// whose target id never appears are deleted: the attribute is
/// removed, the style declaration is dropped, the selector is pruned
/// from its rule (empty rules disappear).
pub fn shorten_ids(doc: &mut Document, mut stylesheet: Option<&mut Stylesheet>) {
    let mut names = ShortNameGen::new();
    let mut records: HashMap<String, Record> = HashMap::new();

    if let Some(sheet) = stylesheet.as_deref_mut() {
        sheet.for_each_rule_mut(|rule| {
            for sel in &mut rule.selectors {
                *sel = rewrite_tokens(sel, '#', |name| {
                    let rec = record_for(&mut records, &mut names, name);
                    rec.sites.push(RefSite::Selector);
                    rec.short.clone()
                });
            }
        });
    }

    doc.for_each_element_mut(|elem| {
        let node = elem.id;
        for attr in &mut elem.attributes {
            let full = attr.name.full_name();
            if IRI_ATTRS.contains(&full.as_str()) {
                if let Some(name) = attr.value.strip_prefix('#') {
                    let name = name.to_string();
                    let rec = record_for(&mut records, &mut names, &name);
                    rec.sites.push(RefSite::Attr {
                        node,
                        name: full.clone(),
                    });
                    attr.value = format!("#{}", rec.short);
                }
            } else if FUNC_IRI_ATTRS.contains(&full.as_str()) {
                if let Some(name) = extract_func_iri(&attr.value) {
                    let name = name.to_string();
                    let rec = record_for(&mut records, &mut names, &name);
                    rec.sites.push(RefSite::Attr {
                        node,
                        name: full.clone(),
                    });
                    attr.value = format!("url(#{})", rec.short);
                }
            } else if full == "style" {
                let mut decls = parse_declarations(&attr.value);
                let mut changed = false;
                for decl in &mut decls {
                    if FUNC_IRI_ATTRS.contains(&decl.property.as_str())
                        && let Some(name) = extract_func_iri(&decl.value)
                    {
                        let name = name.to_string();
                        let rec = record_for(&mut records, &mut names, &name);
                        rec.sites.push(RefSite::StyleDecl {
                            node,
                            property: decl.property.clone(),
                        });
                        decl.value = format!("url(#{})", rec.short);
                        changed = true;
                    }
                }
                if changed {
                    attr.value = declarations_to_css(&decls);
                }
            }
        }
    });

    doc.for_each_element_mut(|elem| {
        if let Some(id_value) = elem.get_attr("id").map(|s| s.to_string()) {
            if let Some(rec) = records.get_mut(&id_value) {
                rec.referenced = true;
                elem.set_attr("id", rec.short.clone());
            } else {
                elem.remove_attr("id");
            }
        }
    });

    for rec in records.values().filter(|r| !r.referenced) {
        for site in &rec.sites {
            match site {
                RefSite::Attr { node, name } => {
                    if let Some(elem) = doc.element_mut(*node) {
                        elem.remove_attr(name);
                    }
                }
                RefSite::StyleDecl { node, property } => {
                    if let Some(elem) = doc.element_mut(*node)
                        && let Some(style) = elem.get_attr("style").map(|s| s.to_string())
                    {
                        let decls: Vec<_> = parse_declarations(&style)
                            .into_iter()
                            .filter(|d| d.property != *property)
                            .collect();
                        if decls.is_empty() {
                            elem.remove_attr("style");
                        } else {
                            elem.set_attr("style", declarations_to_css(&decls));
                        }
                    }
                }
                RefSite::Selector => {
                    if let Some(sheet) = stylesheet.as_deref_mut() {
                        remove_selector_token(sheet, '#', &rec.short);
                    }
                }
            }
        }
    }
}

/// Shorten class names referenced by class selectors and delete the
/// rest. Without a stylesheet no class can match anything, so every
/// class attribute is removed.
pub fn shorten_classes(doc: &mut Document, stylesheet: Option<&mut Stylesheet>) {
    let Some(sheet) = stylesheet else {
        doc.for_each_element_mut(|elem| elem.remove_attr("class"));
        return;
    };

    let mut names = ShortNameGen::new();
    let mut records: HashMap<String, Record> = HashMap::new();

    sheet.for_each_rule_mut(|rule| {
        for sel in &mut rule.selectors {
            *sel = rewrite_tokens(sel, '.', |name| {
                record_for(&mut records, &mut names, name).short.clone()
            });
        }
    });

    doc.for_each_element_mut(|elem| {
        if let Some(classes) = elem.get_attr("class").map(|s| s.to_string()) {
            let mut kept = Vec::new();
            for token in classes.split_whitespace() {
                if let Some(rec) = records.get_mut(token) {
                    rec.referenced = true;
                    kept.push(rec.short.clone());
                }
            }
            if kept.is_empty() {
                elem.remove_attr("class");
            } else {
                elem.set_attr("class", kept.join(" "));
            }
        }
    });

    for rec in records.values().filter(|r| !r.referenced) {
        remove_selector_token(sheet, '.', &rec.short);
    }
}

fn remove_selector_token(sheet: &mut Stylesheet, marker: char, short: &str) {
    sheet.retain_rules(|rule| {
        rule.selectors.retain(|sel| !has_token(sel, marker, short));
        !rule.selectors.is_empty()
    });
}

fn is_token_end(c: char) -> bool {
    matches!(c, ',' | '*' | '#' | '>' | '+' | '~' | ':' | '{' | '[' | '.') || c.is_whitespace()
}

/// Replace every `marker`-prefixed token in a selector, leaving the
/// marker and everything around the token untouched.
fn rewrite_tokens(text: &str, marker: char, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::new();
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        out.push_str(&rest[..=pos]);
        rest = &rest[pos + marker.len_utf8()..];
        let end = rest.find(is_token_end).unwrap_or(rest.len());
        if end > 0 {
            out.push_str(&f(&rest[..end]));
            rest = &rest[end..];
        }
    }
    out.push_str(rest);
    out
}

fn has_token(text: &str, marker: char, name: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        rest = &rest[pos + marker.len_utf8()..];
        if let Some(after) = rest.strip_prefix(name)
            && after.chars().next().is_none_or(is_token_end)
        {
            return true;
        }
    }
    false
}
