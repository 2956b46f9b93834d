//! Path normalization: pick the shortest encoding for every command.
//!
//! Each command is re-emitted either absolute or relative, whichever
//! serializes shorter at the configured precision; axis-aligned line
//! commands collapse to H/V. Ties go to the relative form since a
//! leading `-` on a small delta often saves the separator too.

use crate::path::{PathSeg, SegKind, args_text, format_number};
use crate::simplify::douglas_peucker;

/// Add two coordinates without picking up binary-float noise.
///
/// The sum is rounded back to the wider of the two operands' printed
/// decimal widths, so `0.1 + 0.2` is `0.3` and stays `0.3` through a
/// whole chain of relative deltas. Falls back to plain addition when
/// either operand only prints in exponent form.
pub fn plus(a: f64, b: f64) -> f64 {
    match (decimal_places(a), decimal_places(b)) {
        (Some(da), Some(db)) => {
            let digits = da.max(db).min(12);
            let factor = 10f64.powi(digits as i32);
            ((a + b) * factor).round() / factor
        }
        _ => a + b,
    }
}

pub fn minus(a: f64, b: f64) -> f64 {
    plus(a, -b)
}

fn decimal_places(x: f64) -> Option<u32> {
    let mut buf = ryu::Buffer::new();
    let s = buf.format(x);
    if s.contains('e') || s.contains('E') {
        return None;
    }
    Some(s.split_once('.').map_or(0, |(_, frac)| frac.len() as u32))
}

/// Normalize a command sequence: fill in `start` positions, drop
/// no-op moves after a close, collapse axis-aligned lines to H/V and
/// choose absolute or relative per command by serialized length.
pub fn do_compute(segs: &[PathSeg], precision: u8) -> Vec<PathSeg> {
    let mut out = Vec::with_capacity(segs.len());
    let mut cur = (0.0, 0.0);
    let mut subpath_start = (0.0, 0.0);
    let mut prev_close = false;

    for seg in segs {
        match seg.kind {
            SegKind::Move => {
                let target = seg_endpoint(seg, cur);
                if prev_close && target == cur {
                    // the close already put the pen there
                    continue;
                }
                let rel = vec![minus(target.0, cur.0), minus(target.1, cur.1)];
                let abs = vec![target.0, target.1];
                out.push(choose(SegKind::Move, abs, rel, cur, precision));
                cur = target;
                subpath_start = target;
            }
            SegKind::Line => {
                let target = seg_endpoint(seg, cur);
                let next = if target.1 == cur.1 {
                    // horizontal, including the zero-length case
                    choose1(SegKind::HLine, target.0, minus(target.0, cur.0), cur, precision)
                } else if target.0 == cur.0 {
                    choose1(SegKind::VLine, target.1, minus(target.1, cur.1), cur, precision)
                } else {
                    let rel = vec![minus(target.0, cur.0), minus(target.1, cur.1)];
                    let abs = vec![target.0, target.1];
                    choose(SegKind::Line, abs, rel, cur, precision)
                };
                out.push(next);
                cur = target;
            }
            SegKind::HLine => {
                let target = seg_endpoint(seg, cur);
                out.push(choose1(
                    SegKind::HLine,
                    target.0,
                    minus(target.0, cur.0),
                    cur,
                    precision,
                ));
                cur = target;
            }
            SegKind::VLine => {
                let target = seg_endpoint(seg, cur);
                out.push(choose1(
                    SegKind::VLine,
                    target.1,
                    minus(target.1, cur.1),
                    cur,
                    precision,
                ));
                cur = target;
            }
            SegKind::Cubic | SegKind::SmoothCubic | SegKind::Quad | SegKind::SmoothQuad => {
                let abs = abs_pairs(seg, cur);
                let rel: Vec<f64> = abs
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| {
                        if i % 2 == 0 { minus(v, cur.0) } else { minus(v, cur.1) }
                    })
                    .collect();
                let target = (abs[abs.len() - 2], abs[abs.len() - 1]);
                out.push(choose(seg.kind, abs, rel, cur, precision));
                cur = target;
            }
            SegKind::Arc => {
                let target = seg_endpoint(seg, cur);
                let mut abs = seg.args.clone();
                abs[5] = target.0;
                abs[6] = target.1;
                let mut rel = seg.args.clone();
                rel[5] = minus(target.0, cur.0);
                rel[6] = minus(target.1, cur.1);
                out.push(choose(SegKind::Arc, abs, rel, cur, precision));
                cur = target;
            }
            SegKind::Close => {
                out.push(PathSeg {
                    kind: SegKind::Close,
                    relative: true,
                    args: Vec::new(),
                    start: cur,
                });
                cur = subpath_start;
            }
        }
        prev_close = seg.kind == SegKind::Close;
    }

    out
}

/// Full normalization entry point: normalize, optionally simplify line
/// runs with Douglas-Peucker (then normalize again so the surviving
/// points re-pick their shortest encodings), and strip trailing moves
/// that draw nothing.
pub fn compute_path(segs: Vec<PathSeg>, precision: u8, tolerance: f64) -> Vec<PathSeg> {
    let mut segs = do_compute(&segs, precision);
    if tolerance > 0.0 {
        segs = do_compute(&apply_douglas_peucker(&segs, tolerance), precision);
    }
    while segs.last().is_some_and(|s| s.kind == SegKind::Move) {
        segs.pop();
    }
    segs
}

/// Collapse consecutive line commands through the Douglas-Peucker
/// simplifier. Runs of L/H/V are gathered into absolute point chains
/// (starting at the pen position entering the run); curves, arcs,
/// moves and closes break a run and pass through unchanged. Run
/// endpoints are always preserved.
pub fn apply_douglas_peucker(segs: &[PathSeg], tolerance: f64) -> Vec<PathSeg> {
    if tolerance <= 0.0 {
        return segs.to_vec();
    }

    let mut out = Vec::with_capacity(segs.len());
    let mut cur = (0.0, 0.0);
    let mut subpath_start = (0.0, 0.0);
    let mut run: Vec<(f64, f64)> = Vec::new();

    for seg in segs {
        match seg.kind {
            SegKind::Line | SegKind::HLine | SegKind::VLine => {
                let target = seg_endpoint(seg, cur);
                if run.is_empty() {
                    run.push(cur);
                }
                run.push(target);
                cur = target;
            }
            SegKind::Close => {
                flush_run(&mut out, &mut run, tolerance);
                out.push(seg.clone());
                cur = subpath_start;
            }
            SegKind::Move => {
                flush_run(&mut out, &mut run, tolerance);
                let target = seg_endpoint(seg, cur);
                out.push(seg.clone());
                cur = target;
                subpath_start = target;
            }
            _ => {
                flush_run(&mut out, &mut run, tolerance);
                let target = seg_endpoint(seg, cur);
                out.push(seg.clone());
                cur = target;
            }
        }
    }
    flush_run(&mut out, &mut run, tolerance);

    out
}

fn flush_run(out: &mut Vec<PathSeg>, run: &mut Vec<(f64, f64)>, tolerance: f64) {
    if run.len() >= 2 {
        let kept = douglas_peucker(tolerance, run);
        let mut prev = kept[0];
        for &point in &kept[1..] {
            out.push(PathSeg {
                kind: SegKind::Line,
                relative: false,
                args: vec![point.0, point.1],
                start: prev,
            });
            prev = point;
        }
    }
    run.clear();
}

/// Absolute endpoint of a non-close segment starting at `cur`.
fn seg_endpoint(seg: &PathSeg, cur: (f64, f64)) -> (f64, f64) {
    match seg.kind {
        SegKind::HLine => {
            let x = if seg.relative { plus(cur.0, seg.args[0]) } else { seg.args[0] };
            (x, cur.1)
        }
        SegKind::VLine => {
            let y = if seg.relative { plus(cur.1, seg.args[0]) } else { seg.args[0] };
            (cur.0, y)
        }
        SegKind::Close => cur,
        _ => {
            let n = seg.args.len();
            if seg.relative {
                (plus(cur.0, seg.args[n - 2]), plus(cur.1, seg.args[n - 1]))
            } else {
                (seg.args[n - 2], seg.args[n - 1])
            }
        }
    }
}

fn abs_pairs(seg: &PathSeg, cur: (f64, f64)) -> Vec<f64> {
    if !seg.relative {
        return seg.args.clone();
    }
    seg.args
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            if i % 2 == 0 { plus(cur.0, v) } else { plus(cur.1, v) }
        })
        .collect()
}

fn choose(kind: SegKind, abs: Vec<f64>, rel: Vec<f64>, start: (f64, f64), precision: u8) -> PathSeg {
    let relative = args_text(&rel, precision).len() <= args_text(&abs, precision).len();
    PathSeg {
        kind,
        relative,
        args: if relative { rel } else { abs },
        start,
    }
}

fn choose1(kind: SegKind, abs: f64, rel: f64, start: (f64, f64), precision: u8) -> PathSeg {
    let relative = format_number(rel, precision).len() <= format_number(abs, precision).len();
    PathSeg {
        kind,
        relative,
        args: vec![if relative { rel } else { abs }],
        start,
    }
}
