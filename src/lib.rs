// SPDX: CC0-1.0

pub mod display;
pub mod eval;
pub mod lex;
pub mod normalize;
pub mod parse;
pub mod relation;
pub mod scan;
pub mod shell;
pub mod stdlib;
pub mod trace;
pub mod validate;
pub mod viewport;

use crate::relation::Relation;
use crate::viewport::Viewport;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// User-assignable scalars `$m` and `$n`, read during normalization and
/// written by scalar-assignment equations. The previous value is kept so a
/// front-end can tell whether an assignment actually changed anything.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScalarState {
    pub m: Number,
    pub n: Number,
    pub old_m: Number,
    pub old_n: Number,
}

impl ScalarState {
    pub fn assign_m(&mut self, val: Number) {
        self.old_m = self.m;
        self.m = val;
    }

    pub fn assign_n(&mut self, val: Number) {
        self.old_n = self.n;
        self.n = val;
    }

    pub fn m_changed(&self) -> bool {
        self.old_m != self.m
    }

    pub fn n_changed(&self) -> bool {
        self.old_n != self.n
    }
}

/// Output of plotting one relation against a viewport.
///
/// Explicit relations yield device-space polyline segments, one per
/// unbroken stretch of the curve (pen lifts are segment boundaries).
/// Implicit relations yield an unordered set of device-space point markers.
#[derive(Clone, Debug)]
pub enum PlotResult {
    Path(Vec<Vec<Point<Number>>>),
    Points(Vec<Point<Number>>),
}

/// Plot a compiled relation over the viewport, dispatching to the dense
/// 1-D tracer when one side is a bare `(x)`/`(y)` marker and to the
/// pixel-grid sign-test scanner otherwise.
pub fn plot(rel: &Relation, vp: &Viewport) -> PlotResult {
    match rel.trace_parts() {
        Some((independent, prog)) => {
            PlotResult::Path(trace::trace_explicit(independent, prog, vp))
        }
        None => {
            let hits = scan::scan(rel.lhs_prog(), rel.rhs_prog(), vp);
            PlotResult::Points(vp.project_points(&hits))
        }
    }
}
