use thiserror::Error;

/// Errors surfaced to the caller. Most per-node problems (bad path
/// data, unparseable stylesheets) are handled by dropping the node and
/// never reach here; what remains is document-level: the input is not
/// XML we can read, or I/O failed.
#[derive(Debug, Error)]
pub enum SlimError {
    #[error("malformed XML: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("not an SVG document: {0}")]
    InvalidSvg(String),

    #[error("bad path data: {0}")]
    InvalidPath(String),

    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
