use svgslim::{Options, minify, minify_with_options};

#[test]
fn strips_prolog_and_comments() {
    let svg = concat!(
        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
        r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg"><!-- made with love --><rect width="5" height="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(!out.contains("<?xml"));
    assert!(!out.contains("DOCTYPE"));
    assert!(!out.contains("<!--"));
    assert!(out.contains("<rect"));
}

#[test]
fn keep_flags_preserve_prolog() {
    let svg = r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"><!-- note --></svg>"#;
    let options = Options {
        remove_xml_declaration: false,
        remove_comments: false,
        ..Options::default()
    };
    let out = minify_with_options(svg, &options).unwrap();
    assert!(out.starts_with("<?xml"));
    assert!(out.contains("<!-- note -->"));
}

#[test]
fn path_normalization_end_to_end() {
    let out = minify(r#"<svg><path d="M0,0,0,0M100,100,110,200"/></svg>"#).unwrap();
    assert!(out.contains(r#"d="m0,0h0m100,100,10,100""#), "got: {out}");
}

#[test]
fn path_precision_is_configurable() {
    let svg = r#"<svg><path d="M0,0 L10.12345,0.6789"/></svg>"#;
    let two = minify(svg).unwrap();
    assert!(two.contains("10.12"), "got: {two}");
    let zero = minify_with_options(
        svg,
        &Options {
            precision: 0,
            ..Options::default()
        },
    )
    .unwrap();
    assert!(zero.contains(r#"d="m0,0,10,1""#), "got: {zero}");
}

#[test]
fn simplification_collapses_jitter() {
    let svg = r#"<svg><path d="M0,0 L10,0.01 20,0 30,0.01 40,0"/></svg>"#;
    let out = minify_with_options(
        svg,
        &Options {
            simplify_tolerance: 0.5,
            ..Options::default()
        },
    )
    .unwrap();
    assert!(out.contains(r#"d="m0,0h40""#), "got: {out}");
}

#[test]
fn overridden_presentation_attr_removed() {
    let svg = concat!(
        r#"<svg><style>rect{fill:blue}</style>"#,
        r#"<rect fill="red" width="5" height="5"/>"#,
        r#"<circle fill="red" r="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    // the rect attr loses to the rule; the circle attr matches nothing
    assert!(!out.contains(r#"<rect fill"#), "got: {out}");
    assert!(out.contains(r#"fill="red""#), "got: {out}");
}

#[test]
fn important_inline_beats_plain_rule_but_attr_still_loses() {
    let svg = concat!(
        r#"<svg><style>rect{fill:blue !important}</style>"#,
        r#"<rect fill="green" style="fill:red" width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(!out.contains("green"), "got: {out}");
    assert!(out.contains("fill:red"), "got: {out}");
}

#[test]
fn ids_shortened_and_unreferenced_ids_dropped() {
    let svg = concat!(
        r#"<svg><defs><linearGradient id="prettyGradient"/></defs>"#,
        r#"<rect fill="url(#prettyGradient)" width="5"/>"#,
        r#"<circle id="neverUsed" r="1"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(out.contains(r#"fill="url(#a)""#), "got: {out}");
    assert!(out.contains(r#"id="a""#), "got: {out}");
    assert!(!out.contains("prettyGradient"), "got: {out}");
    assert!(!out.contains("neverUsed"), "got: {out}");
}

#[test]
fn dangling_references_deleted() {
    let svg = concat!(
        r##"<svg><use href="#nothing"/>"##,
        r#"<rect style="mask:url(#missing);opacity:.5" width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(!out.contains("href"), "got: {out}");
    assert!(!out.contains("mask"), "got: {out}");
    assert!(out.contains("opacity:.5"), "got: {out}");
}

#[test]
fn classes_shortened_and_strays_dropped() {
    let svg = concat!(
        r#"<svg><style>.fancyBlue{fill:blue}.unusedRule{fill:green}</style>"#,
        r#"<rect class="fancyBlue" width="5"/>"#,
        r#"<rect class="thisIsBlue" width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(out.contains(r#"class="a""#), "got: {out}");
    assert!(out.contains(".a{fill:blue}"), "got: {out}");
    assert!(!out.contains("unusedRule"), "got: {out}");
    assert!(!out.contains("thisIsBlue"), "got: {out}");
    assert_eq!(out.matches("class=").count(), 1, "got: {out}");
}

#[test]
fn unreferenced_selector_pruned_from_selector_list() {
    let svg = concat!(
        r#"<svg><style>.thisIsRed{fill:red} .thisIsGreen,.thisIsRed{fill:green;stroke:red}</style>"#,
        r#"<rect class="thisIsRed" width="5"/><rect width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(out.contains(".a{fill:red}.a{fill:green;stroke:red}"), "got: {out}");
    assert!(!out.contains("thisIsGreen"), "got: {out}");
}

#[test]
fn unparseable_stylesheet_drops_style_and_all_classes() {
    let svg = concat!(
        r#"<svg><style>this is not css</style>"#,
        r#"<rect class="a" width="5"/><circle class="b c" r="1"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(!out.contains("<style"), "got: {out}");
    assert!(!out.contains("class"), "got: {out}");
    assert!(out.contains("<rect"), "got: {out}");
    assert!(out.contains("<circle"), "got: {out}");
}

#[test]
fn gamma_transfer_function_pruned() {
    let svg = concat!(
        r#"<svg><filter id="soft"><feComponentTransfer>"#,
        r#"<feFuncR type="gamma" amplitude="1" exponent="2" offset="0" slope="4" intercept="1" tableValues="0 1"/>"#,
        r#"</feComponentTransfer></filter>"#,
        r#"<rect filter="url(#soft)" width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    assert!(out.contains("amplitude"), "got: {out}");
    assert!(out.contains("exponent"), "got: {out}");
    assert!(out.contains("offset"), "got: {out}");
    assert!(!out.contains("slope"), "got: {out}");
    assert!(!out.contains("intercept"), "got: {out}");
    assert!(!out.contains("tableValues"), "got: {out}");
}

#[test]
fn broken_filter_removed_with_its_reference() {
    let svg = concat!(
        r#"<svg><filter id="empty" width="0"><feGaussianBlur stdDeviation="2"/></filter>"#,
        r#"<rect filter="url(#empty)" width="5"/></svg>"#
    );
    let out = minify(svg).unwrap();
    // the filter dies for its empty region, then the reference dangles
    assert!(!out.contains("filter"), "got: {out}");
}

#[test]
fn minify_is_idempotent() {
    let svg = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg">"#,
        r#"<style>.big{stroke-width:3}</style>"#,
        r#"<defs><clipPath id="frame"><rect width="10" height="10"/></clipPath></defs>"#,
        r#"<path class="big" clip-path="url(#frame)" d="M 100 100 L 200 100 C 210 110 220 120 230 130 z"/>"#,
        r#"</svg>"#
    );
    let once = minify(svg).unwrap();
    let twice = minify(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn invalid_xml_is_an_error() {
    assert!(minify("<svg><rect></svg>").is_err());
    assert!(minify("no markup here").is_err());
}

#[test]
fn attrs_sorted_with_xmlns_first() {
    let svg = r#"<svg viewBox="0 0 1 1" xmlns="http://www.w3.org/2000/svg" height="5"/>"#;
    let out = minify(svg).unwrap();
    let xmlns = out.find("xmlns").unwrap();
    let height = out.find("height").unwrap();
    let viewbox = out.find("viewBox").unwrap();
    assert!(xmlns < height && height < viewbox, "got: {out}");
}
