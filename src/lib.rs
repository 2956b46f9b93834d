//! svgslim is an SVG minifier. It parses an SVG document, minifies
//! path data, resolves the style cascade to delete attributes that can
//! never render, shortens referenced ids and class names, prunes
//! broken filters, and serializes the result back to compact XML.
//!
//! ```no_run
//! let slim = svgslim::minify(r#"<svg><path d="M 100 100 L 200 100"/></svg>"#)?;
//! # Ok::<(), svgslim::SlimError>(())
//! ```

mod ast;
mod compute;
mod css;
mod error;
mod filter;
mod parse;
mod path;
mod rules;
mod serialize;
mod shorten;
mod simplify;
mod style;

pub use ast::*;
pub use compute::*;
pub use css::*;
pub use error::*;
pub use filter::*;
pub use parse::*;
pub use path::*;
pub use rules::*;
pub use serialize::*;
pub use shorten::*;
pub use simplify::*;
pub use style::*;

/// Minification options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Decimal places kept in path coordinates.
    pub precision: u8,
    /// Decimal places kept in arc x-axis-rotation values.
    pub angle_precision: u8,
    /// Douglas-Peucker tolerance for straight-line runs; 0 disables
    /// simplification.
    pub simplify_tolerance: f64,
    /// Minify path data.
    pub minify_paths: bool,
    /// Remove broken filters and unused transfer-function attributes.
    pub minify_filters: bool,
    /// Resolve the cascade and delete overridden or default-valued
    /// presentation attributes.
    pub minify_styles: bool,
    /// Shorten referenced ids, remove the rest.
    pub shorten_ids: bool,
    /// Shorten referenced class names, remove the rest.
    pub shorten_classes: bool,
    /// Strip comments.
    pub remove_comments: bool,
    /// Strip the XML declaration.
    pub remove_xml_declaration: bool,
    /// Strip the doctype.
    pub remove_doctype: bool,
    /// Sort attributes (xmlns first) for better gzip behavior.
    pub sort_attrs: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            precision: 2,
            angle_precision: 2,
            simplify_tolerance: 0.0,
            minify_paths: true,
            minify_filters: true,
            minify_styles: true,
            shorten_ids: true,
            shorten_classes: true,
            remove_comments: true,
            remove_xml_declaration: true,
            remove_doctype: true,
            sort_attrs: true,
        }
    }
}

/// Minify an SVG string with default options.
pub fn minify(svg: &str) -> Result<String, SlimError> {
    minify_with_options(svg, &Options::default())
}

/// Minify an SVG string.
pub fn minify_with_options(svg: &str, options: &Options) -> Result<String, SlimError> {
    let mut doc = parse_svg(svg)?;
    optimize(&mut doc, options);
    Ok(serialize(&doc, options))
}
