//! The optimization pipeline. Each rule is a pass over the document;
//! `optimize` runs them in dependency order: stylesheet consolidation
//! feeds the cascade, the cascade feeds attribute cleanup, and the
//! identifier passes run last so they see the final reference set.

use std::collections::HashSet;

use crate::Options;
use crate::ast::{Document, Element, Node, NodeId};
use crate::compute::compute_path;
use crate::css::{Stylesheet, declarations_to_css, parse_declarations, parse_stylesheet};
use crate::filter::shorten_filter;
use crate::path::{parse_path, stringify_path};
use crate::shorten::{shorten_classes, shorten_ids};
use crate::style::{StyleOrigin, StyleTree, compute_style_tree, is_inheritable, presentation_attr};

pub fn optimize(doc: &mut Document, options: &Options) {
    let (style_node, mut stylesheet) = match combine_style(doc) {
        Some((node, sheet)) => (Some(node), Some(sheet)),
        None => (None, None),
    };

    if options.minify_filters {
        shorten_filter(&mut doc.root);
    }

    if options.minify_styles {
        clean_style_attrs(doc, stylesheet.as_ref());
    }

    if options.minify_paths {
        compute_paths(doc, options);
    }

    if options.shorten_ids {
        shorten_ids(doc, stylesheet.as_mut());
    }

    if options.shorten_classes {
        shorten_classes(doc, stylesheet.as_mut());
    }

    write_style(doc, style_node, stylesheet);
    cleanup_whitespace(&mut doc.root);
}

/// Merge every `<style>` element into one stylesheet. The first style
/// element is kept as the output slot, the rest are removed. If the
/// combined text yields no parseable rules the style element goes too,
/// and the document is treated as having no stylesheet at all.
fn combine_style(doc: &mut Document) -> Option<(NodeId, Stylesheet)> {
    let mut nodes = Vec::new();
    doc.for_each_element(|elem| {
        if elem.is("style") {
            nodes.push(elem.id);
        }
    });

    let first = *nodes.first()?;

    let mut text = String::new();
    for &id in &nodes {
        if let Some(elem) = doc.element(id) {
            text.push_str(&elem.text_content());
        }
    }
    for &id in nodes.iter().skip(1) {
        doc.remove_element(id);
    }

    match parse_stylesheet(&text) {
        Some(sheet) => Some((first, sheet)),
        None => {
            log::warn!("stylesheet has no parseable rules, removing <style>");
            doc.remove_element(first);
            None
        }
    }
}

/// Write the final stylesheet back into its style element, or remove
/// the element when nothing is left.
fn write_style(doc: &mut Document, style_node: Option<NodeId>, stylesheet: Option<Stylesheet>) {
    let Some(id) = style_node else { return };
    let css = stylesheet.map(|s| s.to_css()).unwrap_or_default();
    if css.is_empty() {
        doc.remove_element(id);
    } else if let Some(elem) = doc.element_mut(id) {
        elem.children = vec![Node::Text(css)];
    }
}

/// Minify path data on every `<path>`. Paths whose `d` is missing,
/// unparseable, or draws nothing are removed.
fn compute_paths(doc: &mut Document, options: &Options) {
    compute_paths_in(&mut doc.root, options);
}

fn compute_paths_in(elem: &mut Element, options: &Options) {
    elem.children.retain_mut(|node| {
        let Node::Element(child) = node else {
            return true;
        };
        compute_paths_in(child, options);
        if !child.is("path") {
            return true;
        }
        let Some(d) = child.get_attr("d").map(|s| s.to_string()) else {
            return false;
        };
        match parse_path(&d) {
            Ok(segs) => {
                let segs = compute_path(segs, options.precision, options.simplify_tolerance);
                if segs.is_empty() {
                    false
                } else {
                    child.set_attr(
                        "d",
                        stringify_path(&segs, options.precision, options.angle_precision),
                    );
                    true
                }
            }
            Err(err) => {
                log::warn!("removing path with invalid data: {err}");
                false
            }
        }
    });
}

/// CSS-only properties worth keeping in a style attribute even though
/// they have no presentation-attribute form.
const CSS_ONLY_PROPS: &[&str] = &[
    "alignment-baseline",
    "animation",
    "baseline-shift",
    "font",
    "isolation",
    "mix-blend-mode",
    "text-overflow",
    "transform-origin",
    "transition",
    "white-space",
];

/// Per-attribute SVG initial values; an attribute set to its initial
/// value is removable when nothing else competes for the property.
fn is_default_value(attr: &str, value: &str) -> bool {
    let value = value.trim();
    match attr {
        "clip-rule" | "fill-rule" => value == "nonzero",
        "fill-opacity" | "stroke-opacity" | "stop-opacity" | "flood-opacity" | "opacity" => {
            value == "1"
        }
        "stroke-width" => value == "1",
        "stroke-miterlimit" => value == "4",
        "stroke-dasharray" => value == "none",
        "stroke-dashoffset" => value == "0",
        "stroke-linecap" => value == "butt",
        "stroke-linejoin" => value == "miter",
        "font-style" | "font-variant" => value == "normal",
        "font-weight" => value == "normal" || value == "400",
        "font-stretch" => value == "normal",
        "text-anchor" => value == "start",
        "visibility" => value == "visible",
        "letter-spacing" | "word-spacing" => value == "normal",
        "paint-order" => value == "normal",
        "vector-effect" => value == "none",
        _ => false,
    }
}

/// Clean inline styles and presentation attributes using the resolved
/// cascade: duplicate inline declarations collapse to the last one,
/// unknown properties are dropped, and a presentation attribute is
/// removed when a style rule or inline declaration wins the property
/// anyway, or when it restates the SVG initial value uncontested.
fn clean_style_attrs(doc: &mut Document, stylesheet: Option<&Stylesheet>) {
    let styles = compute_style_tree(doc, stylesheet);
    clean_element(&mut doc.root, None, &styles);
}

fn clean_element(elem: &mut Element, parent: Option<NodeId>, styles: &StyleTree) {
    if let Some(style) = elem.get_attr("style").map(|s| s.to_string()) {
        let mut seen = HashSet::new();
        let mut kept: Vec<_> = parse_declarations(&style)
            .into_iter()
            .rev()
            .filter(|decl| {
                seen.insert(decl.property.clone())
                    && (presentation_attr(&decl.property).is_some()
                        || CSS_ONLY_PROPS.contains(&decl.property.as_str()))
            })
            .collect();
        kept.reverse();
        if kept.is_empty() {
            elem.remove_attr("style");
        } else {
            elem.set_attr("style", declarations_to_css(&kept));
        }
    }

    let resolved = styles.get(&elem.id);
    elem.attributes.retain(|attr| {
        if attr.name.prefix.is_some() {
            return true;
        }
        let name = attr.name.local.as_str();
        if presentation_attr(name).is_none() {
            return true;
        }
        let Some(entry) = resolved.and_then(|map| map.get(name)) else {
            return true;
        };
        // a style rule or inline declaration wins the cascade, the
        // attribute can never take effect
        if matches!(entry.origin, StyleOrigin::StyleTag | StyleOrigin::Inline) {
            return false;
        }
        // uncontested restatement of the initial value; keep it if an
        // ancestor sets the property, since the attribute then resets
        // the inherited value
        if entry.origin == StyleOrigin::Attr
            && entry.overridden.is_empty()
            && is_default_value(name, &attr.value)
        {
            let ancestor_sets = is_inheritable(name)
                && parent
                    .and_then(|p| styles.get(&p))
                    .is_some_and(|map| map.contains_key(name));
            if !ancestor_sets {
                return false;
            }
        }
        true
    });

    let parent_id = elem.id;
    for child in elem.child_elements_mut() {
        clean_element(child, Some(parent_id), styles);
    }
}

/// Drop whitespace-only text nodes outside text content elements.
fn cleanup_whitespace(elem: &mut Element) {
    let is_text_element = matches!(
        elem.name.local.as_str(),
        "text" | "tspan" | "textPath" | "title" | "desc" | "style" | "script"
    );

    if !is_text_element {
        elem.children.retain(|child| match child {
            Node::Text(text) => !text.trim().is_empty(),
            _ => true,
        });
    }

    for child in elem.child_elements_mut() {
        cleanup_whitespace(child);
    }
}
