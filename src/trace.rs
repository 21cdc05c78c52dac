// SPDX: CC0-1.0

//! Dense 1-D tracing of explicit functions.
//!
//! The independent variable is sampled across its bounds; each dependent
//! value either extends the current polyline, gets clipped against the
//! dependent axis's bounds, or (on a domain error) lifts the pen. The
//! output is device-space polyline segments ready for an anti-aliased
//! line drawer.

use crate::{
    eval::{eval, Bindings, Program},
    viewport::{linspace, Viewport},
    Axis, Number, Point,
};
use core::ops::Range;

/// One sample of the dependent expression; `None` is a gap marker.
type Sample = (Number, Option<Number>);

/// Trace `dependent = f(independent)` over the viewport.
pub fn trace_explicit(
    independent: Axis,
    prog: &Program,
    vp: &Viewport,
) -> Vec<Vec<Point<Number>>> {
    let dep_bounds = vp.bounds(independent.other()).clone();
    let samples = sample_function(independent, prog, vp);

    let mut segments: Vec<Vec<Point<Number>>> = Vec::new();
    let mut seg: Vec<Point<Number>> = Vec::new();
    let mut pen_down = false;
    let mut prev: Option<Sample> = None;

    for &(t, val) in &samples {
        match val {
            None => {
                // gap: lift the pen and flush whatever line was in progress
                flush(&mut segments, &mut seg);
                pen_down = false;
            }
            Some(v) => {
                let inside = dep_bounds.start <= v && v <= dep_bounds.end;
                if inside {
                    if !pen_down {
                        if let Some((pt, Some(pv))) = prev {
                            if !(dep_bounds.start <= pv && pv <= dep_bounds.end) {
                                // re-entry: pick up the trace exactly at the bound
                                let crossing = bound_intercept(pt, pv, t, v, pv, &dep_bounds);
                                seg.push(to_device(independent, crossing, vp));
                            }
                        }
                    }
                    seg.push(to_device(independent, (t, v), vp));
                    pen_down = true;
                } else if pen_down {
                    // exit: close the segment exactly at the bound
                    let (pt, pv) = match prev {
                        Some((pt, Some(pv))) => (pt, pv),
                        // pen can only be down right after an in-range sample
                        _ => unreachable!("pen down without a previous sample"),
                    };
                    let crossing = bound_intercept(pt, pv, t, v, v, &dep_bounds);
                    seg.push(to_device(independent, crossing, vp));
                    flush(&mut segments, &mut seg);
                    pen_down = false;
                }
            }
        }
        prev = Some((t, val));
    }
    flush(&mut segments, &mut seg);

    segments
}

/// Sample the dependent expression across the independent bounds, plus the
/// origin when it sits strictly inside the viewport and is not already a
/// sample point. Samples stay sorted by the independent coordinate.
fn sample_function(independent: Axis, prog: &Program, vp: &Viewport) -> Vec<Sample> {
    let n = vp.samples(independent);
    let mut stack = Vec::new();
    let mut eval_at =
        |t: Number| eval(prog, &Bindings::only(independent, t), &mut stack).ok();

    let mut samples: Vec<Sample> = linspace(vp.bounds(independent), n)
        .into_iter()
        .map(|t| (t, eval_at(t)))
        .collect();

    if vp.origin_inside() && !samples.iter().any(|&(t, _)| t == 0.0) {
        if let Some(v) = eval_at(0.0) {
            let at = samples.partition_point(|&(t, _)| t < 0.0);
            samples.insert(at, (0.0, Some(v)));
        }
    }

    samples
}

/// Linear interpolation of the crossing between the last sample and the
/// current one. `out_val` is whichever dependent value lies out of range;
/// it selects the bound that was crossed.
fn bound_intercept(
    t0: Number,
    v0: Number,
    t1: Number,
    v1: Number,
    out_val: Number,
    dep_bounds: &Range<Number>,
) -> (Number, Number) {
    let hit = if out_val > dep_bounds.end {
        dep_bounds.end
    } else {
        dep_bounds.start
    };
    let slope = (v1 - v0) / (t1 - t0);
    (t0 + (hit - v0) / slope, hit)
}

/// Orient an (independent, dependent) pair into graph space and project it.
fn to_device(independent: Axis, (t, v): (Number, Number), vp: &Viewport) -> Point<Number> {
    let graph = match independent {
        Axis::X => Point { x: t, y: v },
        Axis::Y => Point { x: v, y: t },
    };
    vp.graph_to_device(graph)
}

/// A polyline needs at least two points to draw.
fn flush(segments: &mut Vec<Vec<Point<Number>>>, seg: &mut Vec<Point<Number>>) {
    if seg.len() >= 2 {
        segments.push(core::mem::take(seg));
    } else {
        seg.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::normalize, relation::Relation, ScalarState};
    use core::num::NonZeroU16;

    fn viewport(res: u16, x: Range<Number>, y: Range<Number>) -> Viewport {
        let res = NonZeroU16::new(res).unwrap();
        Viewport::new(
            Point { x: res, y: res },
            Point { x: 0.0, y: 0.0 },
            x,
            y,
        )
        .unwrap()
    }

    fn traced(raw: &str, vp: &Viewport) -> Vec<Vec<Point<Number>>> {
        let rel =
            Relation::compile(normalize(raw, &ScalarState::default())).expect("compiles cleanly");
        let (independent, prog) = rel.trace_parts().expect("explicit form");
        trace_explicit(independent, prog, vp)
    }

    #[test]
    fn parabola_traces_as_one_unbroken_segment() {
        // y bounds wide enough that nothing clips; 21 samples straddle 0
        let vp = viewport(21, -10.0..10.0, -5.0..105.0);
        let segments = traced("y=x^2", &vp);
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.len(), 21);

        // device x strictly increasing; device y falls to the vertex at the
        // center sample and rises after it (device y grows downward)
        for pair in seg.windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
        for (i, pair) in seg.windows(2).enumerate() {
            if i < 10 {
                assert!(pair[0].y < pair[1].y, "descending before the vertex");
            } else {
                assert!(pair[0].y > pair[1].y, "ascending after the vertex");
            }
        }
    }

    #[test]
    fn origin_sample_is_inserted_between_grid_points() {
        // 20 samples over [-10, 10] skip x = 0; insertion brings it back
        let vp = viewport(20, -10.0..10.0, -5.0..105.0);
        let segments = traced("y=x^2", &vp);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 21);
        let vertex = vp.graph_to_device(Point { x: 0.0, y: 0.0 });
        assert!(segments[0]
            .iter()
            .any(|p| (p.x - vertex.x).abs() < 1e-9 && (p.y - vertex.y).abs() < 1e-9));
    }

    #[test]
    fn clipping_interpolates_the_bound_crossing() {
        // y = 2x leaves [-10, 10] at x = +/-5
        let vp = viewport(21, -10.0..10.0, -10.0..10.0);
        let segments = traced("y=2x", &vp);
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];

        let entry = vp.graph_to_device(Point { x: -5.0, y: -10.0 });
        let exit = vp.graph_to_device(Point { x: 5.0, y: 10.0 });
        let first = seg.first().unwrap();
        let last = seg.last().unwrap();
        assert!((first.x - entry.x).abs() < 1e-9 && (first.y - entry.y).abs() < 1e-9);
        assert!((last.x - exit.x).abs() < 1e-9 && (last.y - exit.y).abs() < 1e-9);
    }

    #[test]
    fn domain_errors_become_pen_lifts() {
        // sqrt is undefined left of 4: one segment, starting at x = 4
        let vp = viewport(21, -10.0..10.0, -10.0..10.0);
        let segments = traced("y=sqrt(x-4)", &vp);
        assert_eq!(segments.len(), 1);
        let first = segments[0].first().unwrap();
        let start = vp.graph_to_device(Point { x: 4.0, y: 0.0 });
        assert!((first.x - start.x).abs() < 1e-9);
    }

    #[test]
    fn asymptote_splits_the_trace() {
        // 1/x blows through both y bounds near zero; the even sample count
        // avoids landing on the pole itself
        let vp = viewport(100, -10.0..10.0, -5.0..5.0);
        let segments = traced("y=1/x", &vp);
        assert!(segments.len() >= 2, "got {} segments", segments.len());

        let height = 100.0;
        for seg in &segments {
            for p in seg {
                assert!(p.y >= -1e-9 && p.y <= height + 1e-9, "clipped to device: {p:?}");
            }
        }
    }

    #[test]
    fn sideways_parabola_traces_against_y() {
        let vp = viewport(21, -5.0..105.0, -10.0..10.0);
        let segments = traced("x=y^2", &vp);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 21);
    }
}
