//! SVG path data parsing and serialization.
//!
//! SVG path syntax: https://www.w3.org/TR/SVG/paths.html

use crate::error::SlimError;

/// The drawing-command kinds of SVG path data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegKind {
    /// M/m
    Move,
    /// L/l
    Line,
    /// H/h
    HLine,
    /// V/v
    VLine,
    /// C/c
    Cubic,
    /// S/s
    SmoothCubic,
    /// Q/q
    Quad,
    /// T/t
    SmoothQuad,
    /// A/a
    Arc,
    /// Z/z
    Close,
}

impl SegKind {
    pub fn from_letter(c: char) -> Option<SegKind> {
        match c.to_ascii_lowercase() {
            'm' => Some(SegKind::Move),
            'l' => Some(SegKind::Line),
            'h' => Some(SegKind::HLine),
            'v' => Some(SegKind::VLine),
            'c' => Some(SegKind::Cubic),
            's' => Some(SegKind::SmoothCubic),
            'q' => Some(SegKind::Quad),
            't' => Some(SegKind::SmoothQuad),
            'a' => Some(SegKind::Arc),
            'z' => Some(SegKind::Close),
            _ => None,
        }
    }

    pub fn letter(self, relative: bool) -> char {
        let c = match self {
            SegKind::Move => 'M',
            SegKind::Line => 'L',
            SegKind::HLine => 'H',
            SegKind::VLine => 'V',
            SegKind::Cubic => 'C',
            SegKind::SmoothCubic => 'S',
            SegKind::Quad => 'Q',
            SegKind::SmoothQuad => 'T',
            SegKind::Arc => 'A',
            SegKind::Close => 'Z',
        };
        if relative { c.to_ascii_lowercase() } else { c }
    }

    /// Number of arguments one command of this kind takes.
    pub fn arity(self) -> usize {
        match self {
            SegKind::Move | SegKind::Line | SegKind::SmoothQuad => 2,
            SegKind::HLine | SegKind::VLine => 1,
            SegKind::Cubic => 6,
            SegKind::SmoothCubic | SegKind::Quad => 4,
            SegKind::Arc => 7,
            SegKind::Close => 0,
        }
    }
}

/// One parsed path command.
///
/// `start` is the pen position *before* this segment executes; the
/// normalizer recomputes it whenever segments are converted or merged.
/// Arc flags are stored as 0.0/1.0 in `args[3]`/`args[4]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSeg {
    pub kind: SegKind,
    pub relative: bool,
    pub args: Vec<f64>,
    pub start: (f64, f64),
}

impl PathSeg {
    pub fn new(kind: SegKind, relative: bool, args: Vec<f64>) -> PathSeg {
        PathSeg {
            kind,
            relative,
            args,
            start: (0.0, 0.0),
        }
    }
}

/// Parse SVG path data into a command sequence.
pub fn parse_path(d: &str) -> Result<Vec<PathSeg>, SlimError> {
    let mut parser = PathParser::new(d);
    parser.parse()
}

/// Serialize a command sequence to the shortest valid path text.
///
/// `precision` rounds coordinates; `angle_precision` rounds the arc
/// x-axis-rotation. Command letters are omitted on implicit repetition
/// (with `M`→`L` / `m`→`l`), separators only where tokenization needs
/// them.
pub fn stringify_path(segs: &[PathSeg], precision: u8, angle_precision: u8) -> String {
    let mut out = String::new();
    let mut prev_letter: Option<char> = None;
    let mut prev_frac = false;

    for seg in segs {
        let letter = seg.kind.letter(seg.relative);

        if seg.kind == SegKind::Close {
            out.push('z');
            prev_letter = Some('z');
            prev_frac = false;
            continue;
        }

        // A moveto never repeats implicitly: extra pairs after M/m are
        // re-parsed as lineto. Only the M->L / m->l carryover is legal.
        let implicit = match prev_letter {
            None => false,
            Some(prev) => {
                (prev == letter && seg.kind != SegKind::Move)
                    || (prev == 'M' && letter == 'L')
                    || (prev == 'm' && letter == 'l')
            }
        };
        if !implicit {
            out.push(letter);
            prev_frac = false;
        }

        for (i, &arg) in seg.args.iter().enumerate() {
            let text = if seg.kind == SegKind::Arc && (i == 3 || i == 4) {
                if arg != 0.0 { "1".to_string() } else { "0".to_string() }
            } else if seg.kind == SegKind::Arc && i == 2 {
                format_number(arg, angle_precision)
            } else {
                format_number(arg, precision)
            };
            push_number(&mut out, &mut prev_frac, &text);
        }

        prev_letter = Some(letter);
    }

    out
}

/// Render an argument list exactly as the serializer would, used by the
/// normalizer to compare candidate encodings by text length.
pub(crate) fn args_text(args: &[f64], precision: u8) -> String {
    let mut out = String::new();
    let mut prev_frac = false;
    for &arg in args {
        let text = format_number(arg, precision);
        push_number(&mut out, &mut prev_frac, &text);
    }
    out
}

fn push_number(out: &mut String, prev_frac: &mut bool, text: &str) {
    let need_sep = match out.chars().last() {
        None => false,
        Some(c) if c.is_ascii_alphabetic() => false,
        Some(_) => {
            let first = text.chars().next().unwrap_or(' ');
            // a sign separates by itself; a leading dot separates when
            // the previous number already used its decimal point
            !(first == '-' || (first == '.' && *prev_frac))
        }
    };
    if need_sep {
        out.push(',');
    }
    out.push_str(text);
    *prev_frac = text.contains('.');
}

/// Format a number with the given precision, in its shortest form:
/// no trailing zeros, `.5` not `0.5`, `-0` is `0`, no explicit `+`.
pub fn format_number(n: f64, precision: u8) -> String {
    let factor = 10f64.powi(precision as i32);
    let rounded = (n * factor).round() / factor;

    if rounded == 0.0 {
        return "0".into();
    }
    if rounded.fract() == 0.0 {
        return format!("{:.0}", rounded);
    }

    // ryu emits the shortest text that round-trips
    let mut buf = ryu::Buffer::new();
    let s = buf.format(rounded);
    if let Some(stripped) = s.strip_prefix("0.") {
        format!(".{stripped}")
    } else if let Some(stripped) = s.strip_prefix("-0.") {
        format!("-.{stripped}")
    } else {
        s.to_string()
    }
}

struct PathParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(&mut self) -> Result<Vec<PathSeg>, SlimError> {
        let mut segs = Vec::new();
        let mut last_letter: Option<char> = None;

        self.skip_whitespace();

        while !self.is_eof() {
            let letter = if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                let c = self.next().unwrap();
                last_letter = Some(c);
                c
            } else {
                // Implicit repetition: after M the repeat is L, after m
                // it is l; Z takes no arguments so nothing can follow it
                // without a letter.
                match last_letter {
                    Some('M') => 'L',
                    Some('m') => 'l',
                    Some(c) if c.to_ascii_lowercase() == 'z' => {
                        return Err(SlimError::InvalidPath(
                            "Unexpected number after close".into(),
                        ));
                    }
                    Some(c) => c,
                    None => {
                        return Err(SlimError::InvalidPath("Expected command letter".into()));
                    }
                }
            };

            let kind = SegKind::from_letter(letter)
                .ok_or_else(|| SlimError::InvalidPath(format!("Unknown command: {}", letter)))?;
            let relative = letter.is_ascii_lowercase();

            let mut args = Vec::with_capacity(kind.arity());
            if kind == SegKind::Arc {
                args.push(self.parse_number()?);
                args.push(self.parse_number()?);
                args.push(self.parse_number()?);
                args.push(if self.parse_flag()? { 1.0 } else { 0.0 });
                args.push(if self.parse_flag()? { 1.0 } else { 0.0 });
                args.push(self.parse_number()?);
                args.push(self.parse_number()?);
            } else {
                for _ in 0..kind.arity() {
                    args.push(self.parse_number()?);
                }
            }

            segs.push(PathSeg::new(kind, relative, args));
            self.skip_whitespace_and_comma();
        }

        Ok(segs)
    }

    fn parse_number(&mut self) -> Result<f64, SlimError> {
        self.skip_whitespace_and_comma();

        let start = self.pos;

        if self.peek() == Some('-') || self.peek() == Some('+') {
            self.next();
        }

        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.next();
        }

        if self.peek() == Some('.') {
            self.next();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.next();
            }
        }

        if self.peek() == Some('e') || self.peek() == Some('E') {
            self.next();
            if self.peek() == Some('-') || self.peek() == Some('+') {
                self.next();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.next();
            }
        }

        let s = &self.input[start..self.pos];
        if s.is_empty() {
            return Err(SlimError::InvalidPath("Expected number".into()));
        }

        s.parse()
            .map_err(|_| SlimError::InvalidPath(format!("Invalid number: {}", s)))
    }

    fn parse_flag(&mut self) -> Result<bool, SlimError> {
        self.skip_whitespace_and_comma();
        match self.next() {
            Some('0') => Ok(false),
            Some('1') => Ok(true),
            Some(c) => Err(SlimError::InvalidPath(format!(
                "Expected flag (0 or 1), got: {}",
                c
            ))),
            None => Err(SlimError::InvalidPath("Expected flag".into())),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.next();
        }
    }

    fn skip_whitespace_and_comma(&mut self) {
        self.skip_whitespace();
        if self.peek() == Some(',') {
            self.next();
        }
        self.skip_whitespace();
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_path() {
        let segs = parse_path("M10 20 L30 40").unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].kind, SegKind::Move);
        assert_eq!(segs[0].args, vec![10.0, 20.0]);
    }

    #[test]
    fn test_parse_relative_path() {
        let segs = parse_path("m10,20 l30,40").unwrap();
        assert_eq!(segs.len(), 2);
        assert!(segs[0].relative);
    }

    #[test]
    fn test_parse_implicit_lineto() {
        let segs = parse_path("M10 20 30 40 50 60").unwrap();
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[1].kind, SegKind::Line);
        assert!(!segs[1].relative);
        assert_eq!(segs[2].args, vec![50.0, 60.0]);
    }

    #[test]
    fn test_parse_arc_flags() {
        let segs = parse_path("A 10 20 30 1 0 40 50").unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].args, vec![10.0, 20.0, 30.0, 1.0, 0.0, 40.0, 50.0]);
    }

    #[test]
    fn test_parse_close_then_move() {
        let segs = parse_path("M0 0 10 10zm5 5").unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[2].kind, SegKind::Close);
        assert_eq!(segs[3].kind, SegKind::Move);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_path("X10 20").is_err());
        assert!(parse_path("M10").is_err());
        assert!(parse_path("10 20").is_err());
        assert!(parse_path("M0 0z5").is_err());
        assert!(parse_path("A 10 20 30 2 0 40 50").is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0, 2), "0");
        assert_eq!(format_number(-0.0, 2), "0");
        assert_eq!(format_number(1.0, 2), "1");
        assert_eq!(format_number(1.50, 2), "1.5");
        assert_eq!(format_number(0.5, 2), ".5");
        assert_eq!(format_number(-0.5, 2), "-.5");
        assert_eq!(format_number(1.234, 2), "1.23");
        assert_eq!(format_number(1.235, 2), "1.24");
        assert_eq!(format_number(100.0, 0), "100");
    }

    #[test]
    fn test_stringify_implicit_lineto() {
        let segs = parse_path("M 10.00 20.00 L 30.00 40.00 Z").unwrap();
        assert_eq!(stringify_path(&segs, 0, 0), "M10,20,30,40z");
    }

    #[test]
    fn test_stringify_consecutive_moves_keep_letter() {
        let segs = parse_path("m10,10m10,10h5").unwrap();
        let text = stringify_path(&segs, 0, 0);
        assert_eq!(text, "m10,10m10,10h5");
        let back = parse_path(&text).unwrap();
        assert_eq!(back[1].kind, SegKind::Move);
    }

    #[test]
    fn test_stringify_separators() {
        let segs = parse_path("M 0.5 0.5 L -0.5 -0.5").unwrap();
        // `.5` after a fractional number and `-` need no separator
        assert_eq!(stringify_path(&segs, 1, 0), "M.5.5-.5-.5");
    }

    #[test]
    fn test_stringify_repeated_letter() {
        let segs = parse_path("M0 0h10 h20 h-5").unwrap();
        assert_eq!(stringify_path(&segs, 0, 0), "M0,0h10,20-5");
    }

    #[test]
    fn test_stringify_arc() {
        let segs = parse_path("a5.5 5.5 0 1 0 10 10").unwrap();
        assert_eq!(stringify_path(&segs, 1, 1), "a5.5,5.5,0,1,0,10,10");
    }

    #[test]
    fn test_roundtrip_reparses() {
        let segs = parse_path("M1.25 2.5 L3 4 H5 V6 C1 2 3 4 5 6 z").unwrap();
        let text = stringify_path(&segs, 2, 2);
        let reparsed = parse_path(&text).unwrap();
        assert_eq!(segs.len(), reparsed.len());
        for (a, b) in segs.iter().zip(&reparsed) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.args, b.args);
        }
    }
}
