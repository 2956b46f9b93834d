//! Filter minification: drop filters that cannot render and strip
//! transfer-function attributes their `type` ignores.

use std::collections::HashSet;

use crate::ast::{Element, Node};

const FILTER_PRIMITIVES: &[&str] = &[
    "feBlend",
    "feColorMatrix",
    "feComponentTransfer",
    "feComposite",
    "feConvolveMatrix",
    "feDiffuseLighting",
    "feDisplacementMap",
    "feDropShadow",
    "feFlood",
    "feGaussianBlur",
    "feImage",
    "feMerge",
    "feMorphology",
    "feOffset",
    "feSpecularLighting",
    "feTile",
    "feTurbulence",
];

const TRANSFER_FUNCS: &[&str] = &["feFuncR", "feFuncG", "feFuncB", "feFuncA"];

const TRANSFER_ATTRS: &[&str] = &[
    "tableValues",
    "slope",
    "intercept",
    "amplitude",
    "exponent",
    "offset",
];

/// Attributes a transfer-function `type` actually reads.
fn attrs_for_type(t: &str) -> Option<&'static [&'static str]> {
    match t {
        "identity" => Some(&[]),
        "table" | "discrete" => Some(&["tableValues"]),
        "linear" => Some(&["slope", "intercept"]),
        "gamma" => Some(&["amplitude", "exponent", "offset"]),
        _ => None,
    }
}

/// Minify filter content under `elem`, recursively.
///
/// Removes filters and primitives with a non-positive declared region,
/// `<filter>` elements with no primitive children, duplicate transfer
/// functions inside `<feComponentTransfer>` (the last occurrence
/// wins), and transfer-function attributes that the effective `type`
/// never reads. A transfer function with no `type` and no animation
/// of `type` is removed outright.
pub fn shorten_filter(elem: &mut Element) {
    elem.children.retain_mut(|node| {
        let Node::Element(child) = node else {
            return true;
        };
        shorten_filter(child);
        keep_filter_element(child)
    });

    if elem.is("feComponentTransfer") {
        dedupe_transfer_funcs(elem);
    }
}

fn keep_filter_element(elem: &mut Element) -> bool {
    let name = elem.name.local.as_str();

    if name == "filter" || FILTER_PRIMITIVES.contains(&name) {
        if region_is_empty(elem) {
            return false;
        }
        if name == "filter"
            && !elem
                .child_elements()
                .any(|c| FILTER_PRIMITIVES.contains(&c.name.local.as_str()))
        {
            return false;
        }
    }

    if TRANSFER_FUNCS.contains(&name) {
        return prune_transfer_func(elem);
    }

    true
}

fn region_is_empty(elem: &Element) -> bool {
    for attr in ["width", "height"] {
        if let Some(value) = elem.get_attr(attr)
            && let Ok(n) = value.trim().trim_end_matches('%').parse::<f64>()
            && n <= 0.0
        {
            return true;
        }
    }
    false
}

fn prune_transfer_func(elem: &mut Element) -> bool {
    let type_attr = elem.get_attr("type").unwrap_or("").to_string();
    let animated = animated_type_values(elem);
    if type_attr.is_empty() && animated.is_empty() {
        return false;
    }

    // keep the union of what every effective type reads
    let mut removable: Vec<&str> = TRANSFER_ATTRS.to_vec();
    let mut retain_for = |t: &str| {
        if let Some(needed) = attrs_for_type(t) {
            removable.retain(|a| !needed.contains(a));
        }
    };
    retain_for(&type_attr);
    for value in &animated {
        retain_for(value);
    }

    for attr in removable {
        elem.remove_attr(attr);
    }
    true
}

/// `type` values a child animation element can set.
fn animated_type_values(elem: &Element) -> Vec<String> {
    let mut out = Vec::new();
    for child in elem.child_elements() {
        if (child.is("animate") || child.is("set"))
            && child.get_attr("attributeName") == Some("type")
        {
            if let Some(values) = child.get_attr("values") {
                out.extend(values.split(';').map(|v| v.trim().to_string()));
            }
            for attr in ["from", "to", "by"] {
                if let Some(value) = child.get_attr(attr) {
                    out.push(value.trim().to_string());
                }
            }
        }
    }
    out
}

fn dedupe_transfer_funcs(elem: &mut Element) {
    let mut seen = HashSet::new();
    for i in (0..elem.children.len()).rev() {
        let Node::Element(child) = &elem.children[i] else {
            continue;
        };
        let name = child.name.local.clone();
        if TRANSFER_FUNCS.contains(&name.as_str()) && !seen.insert(name) {
            elem.children.remove(i);
        }
    }
}
