// SPDX: CC0-1.0

//! Sign-test scanning of implicit relations.
//!
//! Every pixel center gets `f = lhs - rhs` evaluated at its four corners;
//! a sign change across the corners puts the center on the curve. Each
//! sample is independent, so the grid is mapped in parallel. A background
//! scan can be superseded: cancellation is best-effort and immediate, and
//! partial results are discarded.

use crate::{
    eval::{eval, Bindings, Program},
    viewport::{linspace, Viewport},
    Axis, Number, Point,
};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Receiver, TryRecvError},
    Arc,
};
use std::thread;

/// Scan the viewport grid for zero crossings of `lhs - rhs`. Points come
/// back in graph space with no particular order.
pub fn scan(lhs: &Program, rhs: &Program, vp: &Viewport) -> Vec<Point<Number>> {
    scan_cancellable(lhs, rhs, vp, &AtomicBool::new(false)).unwrap_or_default()
}

/// As [`scan`], but aborts (returning `None`) once `cancel` goes high.
fn scan_cancellable(
    lhs: &Program,
    rhs: &Program,
    vp: &Viewport,
    cancel: &AtomicBool,
) -> Option<Vec<Point<Number>>> {
    // half a pixel in graph units on each axis
    let x_tol = vp.span(Axis::X) / Number::from(vp.resolution().x.get()) * 0.5;
    let y_tol = vp.span(Axis::Y) / Number::from(vp.resolution().y.get()) * 0.5;

    let hits: Vec<Point<Number>> = sample_grid(vp)
        .into_par_iter()
        .map_init(Vec::new, |stack, center| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            on_curve(lhs, rhs, stack, center, x_tol, y_tol).then_some(center)
        })
        .filter_map(|hit| hit)
        .collect();

    if cancel.load(Ordering::Relaxed) {
        None
    } else {
        Some(hits)
    }
}

/// The full Cartesian grid of sample centers, plus a column at `x = 0` and
/// a row at `y = 0` when the bounds straddle the axis; grid quantization
/// would otherwise skip branches sitting exactly on it.
fn sample_grid(vp: &Viewport) -> Vec<Point<Number>> {
    let xs = linspace(vp.bounds(Axis::X), vp.samples(Axis::X));
    let ys = linspace(vp.bounds(Axis::Y), vp.samples(Axis::Y));

    let mut grid = Vec::with_capacity(xs.len() * ys.len() + xs.len() + ys.len());
    for &x in &xs {
        for &y in &ys {
            grid.push(Point { x, y });
        }
    }
    if vp.straddles_zero(Axis::X) {
        for &y in &ys {
            grid.push(Point { x: 0.0, y });
        }
    }
    if vp.straddles_zero(Axis::Y) {
        for &x in &xs {
            grid.push(Point { x, y: 0.0 });
        }
    }
    grid
}

/// Evaluate `lhs - rhs` at the four pixel corners; the center is on the
/// curve when the corner values straddle zero. Any evaluation failure
/// discards the sample.
fn on_curve(
    lhs: &Program,
    rhs: &Program,
    stack: &mut Vec<Number>,
    center: Point<Number>,
    x_tol: Number,
    y_tol: Number,
) -> bool {
    let mut lo = Number::INFINITY;
    let mut hi = Number::NEG_INFINITY;
    for (sx, sy) in [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)] {
        let bindings = Bindings::xy(center.x + sx * x_tol, center.y + sy * y_tol);
        let l = match eval(lhs, &bindings, stack) {
            Ok(val) => val,
            Err(_) => return false,
        };
        let r = match eval(rhs, &bindings, stack) {
            Ok(val) => val,
            Err(_) => return false,
        };
        let f = l - r;
        lo = lo.min(f);
        hi = hi.max(f);
    }
    lo <= 0.0 && hi >= 0.0
}

/// A background scan for one relation slot. Dropping (or replacing) the
/// handle cancels the scan, so a slot never has more than one in flight.
#[derive(Debug)]
pub struct ScanHandle {
    rx: Receiver<Vec<Point<Number>>>,
    cancel: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Kick off a scan on its own thread. The programs and viewport are
    /// snapshotted; later edits don't affect a running scan.
    pub fn spawn(lhs: Program, rhs: Program, vp: Viewport) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Some(points) = scan_cancellable(&lhs, &rhs, &vp, &flag) {
                // the receiver may already be gone; superseded results drop
                let _ = tx.send(points);
            }
        });
        Self { rx, cancel }
    }

    /// Non-blocking completion check, suitable for per-frame polling.
    /// `Some` means the scan is over; a dead or cancelled worker reports an
    /// empty point set.
    pub fn poll(&self) -> Option<Vec<Point<Number>>> {
        match self.rx.try_recv() {
            Ok(points) => Some(points),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Vec::new()),
        }
    }

    /// Ask the worker to stop. Best-effort: the scan notices at the next
    /// sample it visits.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::normalize, relation::Relation, ScalarState};
    use core::num::NonZeroU16;

    fn viewport(res: u16) -> Viewport {
        let res = NonZeroU16::new(res).unwrap();
        Viewport::new(
            Point { x: res, y: res },
            Point { x: 0.0, y: 0.0 },
            -3.0..3.0,
            -3.0..3.0,
        )
        .unwrap()
    }

    fn circle() -> Relation {
        Relation::compile(normalize("x^2+y^2=4", &ScalarState::default()))
            .expect("compiles cleanly")
    }

    #[test]
    fn circle_points_sit_on_the_radius() {
        let vp = viewport(61);
        let rel = circle();
        let hits = scan(rel.lhs_prog(), rel.rhs_prog(), &vp);
        assert!(!hits.is_empty());

        let x_tol = vp.span(Axis::X) / 61.0 * 0.5;
        let y_tol = vp.span(Axis::Y) / 61.0 * 0.5;
        let diagonal = (x_tol * x_tol + y_tol * y_tol).sqrt() * 2.0;
        for p in &hits {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 2.0).abs() <= diagonal, "{p:?} is off the circle");
        }

        // nothing deep inside the circle gets reported
        assert!(!hits.iter().any(|p| p.x.hypot(p.y) < 1.0));
    }

    #[test]
    fn axis_rows_are_scanned_even_when_the_grid_skips_them() {
        // an even sample count puts no grid line on x = 0, yet the circle's
        // topmost point (0, 2) must still be found via the inserted column
        let vp = viewport(60);
        let rel = circle();
        let hits = scan(rel.lhs_prog(), rel.rhs_prog(), &vp);
        assert!(hits
            .iter()
            .any(|p| p.x == 0.0 && (p.y - 2.0).abs() < 0.1));
    }

    #[test]
    fn domain_errors_discard_samples_quietly() {
        let rel = Relation::compile(normalize("y=log10(x)", &ScalarState::default())).unwrap();
        // scanned as an implicit relation here: log10 is undefined for
        // x <= 0, so the left half contributes nothing and nothing blows up
        let vp = viewport(31);
        let hits = scan(rel.lhs_prog(), rel.rhs_prog(), &vp);
        assert!(hits.iter().all(|p| p.x > 0.0));
        assert!(!hits.is_empty());
    }

    #[test]
    fn background_scan_delivers_via_polling() {
        let vp = viewport(31);
        let rel = circle();
        let handle = ScanHandle::spawn(rel.lhs_prog().clone(), rel.rhs_prog().clone(), vp);
        let points = loop {
            if let Some(points) = handle.poll() {
                break points;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        };
        assert!(!points.is_empty());
    }

    #[test]
    fn cancelled_scan_reports_empty() {
        let vp = viewport(127);
        let rel = circle();
        let handle = ScanHandle::spawn(rel.lhs_prog().clone(), rel.rhs_prog().clone(), vp);
        handle.cancel();
        let points = loop {
            if let Some(points) = handle.poll() {
                break points;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        };
        // either the cancel landed in time (empty) or the scan had already
        // finished; both are fine, it must just terminate
        let _ = points;
    }
}
