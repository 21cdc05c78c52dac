// SPDX: CC0-1.0

use crate::{Axis, Number, Point};
use core::{fmt, num::NonZeroU16, ops::Range};

/// Zooming in refuses to squeeze an axis tighter than this.
pub const MIN_BOUND_RANGE: Number = 4e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportErr {
    EmptyRange(Axis),
}

impl fmt::Display for ViewportErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRange(Axis::X) => write!(f, "x bounds must satisfy lower < upper"),
            Self::EmptyRange(Axis::Y) => write!(f, "y bounds must satisfy lower < upper"),
        }
    }
}

/// A bound transformation applied one grid step at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundOp {
    ZoomIn,
    ZoomOut,
    PanPositive,
    PanNegative,
}

/// The outcome of a bound shift: which axis actually moved, and where to.
/// Zoom-in may redirect to the other axis when the requested one is at the
/// range floor.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundShift {
    pub axis: Axis,
    pub bounds: Range<Number>,
}

/// The graph rectangle: bounds in graph space, a pixel resolution, and the
/// device-space position of the top-left corner. `stretch` (pixels per
/// graph unit) and `dec_places` (the grid-step exponent for labels and
/// panning) are recomputed whenever bounds or resolution change.
#[derive(Clone, Debug)]
pub struct Viewport {
    x: Range<Number>,
    y: Range<Number>,
    resolution: Point<NonZeroU16>,
    pos: Point<Number>,
    stretch: Point<Number>,
    dec_places: Point<i32>,
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("x range", &self.x)
            .field("y range", &self.y)
            .field(
                "resolution",
                &(self.resolution.x.get(), self.resolution.y.get()),
            )
            .finish()
    }
}

impl Viewport {
    pub fn new(
        resolution: Point<NonZeroU16>,
        pos: Point<Number>,
        x: Range<Number>,
        y: Range<Number>,
    ) -> Result<Self, ViewportErr> {
        let (stretch, dec_places) = derived(&x, &y, resolution)?;
        Ok(Self {
            x,
            y,
            resolution,
            pos,
            stretch,
            dec_places,
        })
    }

    /// Apply new resolution and bounds in one go, as a resolution change
    /// does. Everything derived is recomputed.
    pub fn reset(
        &mut self,
        resolution: Point<NonZeroU16>,
        pos: Point<Number>,
        x: Range<Number>,
        y: Range<Number>,
    ) -> Result<(), ViewportErr> {
        *self = Self::new(resolution, pos, x, y)?;
        Ok(())
    }

    pub fn set_bounds(&mut self, x: Range<Number>, y: Range<Number>) -> Result<(), ViewportErr> {
        self.reset(self.resolution, self.pos, x, y)
    }

    pub fn bounds(&self, axis: Axis) -> &Range<Number> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    pub fn resolution(&self) -> Point<NonZeroU16> {
        self.resolution
    }

    pub fn samples(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.resolution.x.get() as usize,
            Axis::Y => self.resolution.y.get() as usize,
        }
    }

    pub fn pos(&self) -> Point<Number> {
        self.pos
    }

    pub fn span(&self, axis: Axis) -> Number {
        let bounds = self.bounds(axis);
        bounds.end - bounds.start
    }

    pub fn dec_places(&self, axis: Axis) -> i32 {
        match axis {
            Axis::X => self.dec_places.x,
            Axis::Y => self.dec_places.y,
        }
    }

    /// One label/pan step: `10^dec_places` for the axis.
    pub fn grid_step(&self, axis: Axis) -> Number {
        match axis {
            Axis::X => 10f64.powi(self.dec_places.x),
            Axis::Y => 10f64.powi(self.dec_places.y),
        }
    }

    pub fn straddles_zero(&self, axis: Axis) -> bool {
        let bounds = self.bounds(axis);
        bounds.start < 0.0 && 0.0 < bounds.end
    }

    /// True when the origin lies strictly inside both bound pairs.
    pub fn origin_inside(&self) -> bool {
        self.straddles_zero(Axis::X) && self.straddles_zero(Axis::Y)
    }

    pub fn contains(&self, p: Point<Number>) -> bool {
        self.x.start <= p.x && p.x <= self.x.end && self.y.start <= p.y && p.y <= self.y.end
    }

    /// Map a graph-space point into device space. Device y grows downward,
    /// so the upper y bound lands at the top of the rectangle.
    pub fn graph_to_device(&self, p: Point<Number>) -> Point<Number> {
        Point {
            x: self.pos.x + (self.x.start - p.x).abs() * self.stretch.x,
            y: self.pos.y + (self.y.end - p.y).abs() * self.stretch.y,
        }
    }

    /// Inverse map for a device-space point, or `None` outside the device
    /// rectangle.
    pub fn device_to_graph(&self, p: Point<Number>) -> Option<Point<Number>> {
        let w = Number::from(self.resolution.x.get());
        let h = Number::from(self.resolution.y.get());
        let inside = self.pos.x <= p.x
            && p.x <= self.pos.x + w
            && self.pos.y <= p.y
            && p.y <= self.pos.y + h;
        inside.then(|| self.invert(p))
    }

    /// Inverse map without the rectangle check, for callers that know the
    /// point came out of `graph_to_device`.
    pub fn invert(&self, p: Point<Number>) -> Point<Number> {
        Point {
            x: self.x.start + (p.x - self.pos.x) / self.stretch.x,
            y: self.y.end - (p.y - self.pos.y) / self.stretch.y,
        }
    }

    /// Project graph-space points into device space, dropping any outside
    /// the bounds.
    pub fn project_points(&self, points: &[Point<Number>]) -> Vec<Point<Number>> {
        points
            .iter()
            .filter(|p| self.contains(**p))
            .map(|p| self.graph_to_device(*p))
            .collect()
    }

    /// New bounds for a one-step transformation. Zoom-in tries the given
    /// axis first and falls back to the other when the result would dip
    /// under [`MIN_BOUND_RANGE`]; `None` means neither axis can move.
    pub fn shift_bounds(&self, axis: Axis, op: BoundOp) -> Option<BoundShift> {
        match op {
            BoundOp::ZoomIn => {
                for candidate in [axis, axis.other()] {
                    let step = self.grid_step(candidate);
                    let bounds = self.bounds(candidate);
                    if MIN_BOUND_RANGE < ((bounds.end - bounds.start) - 2.0 * step).abs() {
                        return Some(BoundShift {
                            axis: candidate,
                            bounds: round_to(bounds.start + step, step)
                                ..round_to(bounds.end - step, step),
                        });
                    }
                }
                None
            }
            BoundOp::ZoomOut => {
                let step = self.grid_step(axis);
                let bounds = self.bounds(axis);
                Some(BoundShift {
                    axis,
                    bounds: round_to(bounds.start - step, step)..round_to(bounds.end + step, step),
                })
            }
            BoundOp::PanPositive => {
                let step = self.grid_step(axis);
                let bounds = self.bounds(axis);
                Some(BoundShift {
                    axis,
                    bounds: round_to(bounds.start + step, step)..round_to(bounds.end + step, step),
                })
            }
            BoundOp::PanNegative => {
                let step = self.grid_step(axis);
                let bounds = self.bounds(axis);
                Some(BoundShift {
                    axis,
                    bounds: round_to(bounds.start - step, step)..round_to(bounds.end - step, step),
                })
            }
        }
    }

    /// Apply a shift produced by [`Self::shift_bounds`].
    pub fn apply_shift(&mut self, shift: &BoundShift) -> Result<(), ViewportErr> {
        match shift.axis {
            Axis::X => self.set_bounds(shift.bounds.clone(), self.y.clone()),
            Axis::Y => self.set_bounds(self.x.clone(), shift.bounds.clone()),
        }
    }
}

fn derived(
    x: &Range<Number>,
    y: &Range<Number>,
    resolution: Point<NonZeroU16>,
) -> Result<(Point<Number>, Point<i32>), ViewportErr> {
    if x.end <= x.start {
        return Err(ViewportErr::EmptyRange(Axis::X));
    }
    if y.end <= y.start {
        return Err(ViewportErr::EmptyRange(Axis::Y));
    }
    let span = Point {
        x: x.end - x.start,
        y: y.end - y.start,
    };
    let stretch = Point {
        x: Number::from(resolution.x.get()) / span.x,
        y: Number::from(resolution.y.get()) / span.y,
    };
    let dec_places = Point {
        x: (span.x * 0.25).log10().floor() as i32,
        y: (span.y * 0.25).log10().floor() as i32,
    };
    Ok((stretch, dec_places))
}

fn round_to(val: Number, step: Number) -> Number {
    (val / step).round() * step
}

/// `n` evenly spaced samples across the range, endpoints included.
pub fn linspace(range: &Range<Number>, n: usize) -> Vec<Number> {
    match n {
        0 => Vec::new(),
        1 => vec![range.start],
        _ => {
            let step = (range.end - range.start) / (n - 1) as Number;
            (0..n).map(|i| range.start + step * i as Number).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(val: u16) -> NonZeroU16 {
        NonZeroU16::new(val).unwrap()
    }

    fn square_viewport() -> Viewport {
        Viewport::new(
            Point { x: nz(300), y: nz(300) },
            Point { x: 0.0, y: 0.0 },
            -10.0..10.0,
            -10.0..10.0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_ranges() {
        let err = Viewport::new(
            Point { x: nz(300), y: nz(300) },
            Point { x: 0.0, y: 0.0 },
            10.0..-10.0,
            -10.0..10.0,
        )
        .unwrap_err();
        assert_eq!(err, ViewportErr::EmptyRange(Axis::X));
    }

    #[test]
    fn mapping_round_trips_inside_bounds() {
        let vp = square_viewport();
        for p in [
            Point { x: 3.25, y: -7.5 },
            Point { x: -10.0, y: 10.0 },
            Point { x: 0.0, y: 0.0 },
            Point { x: 9.99, y: -9.99 },
        ] {
            let device = vp.graph_to_device(p);
            let back = vp.device_to_graph(device).expect("inside the rectangle");
            assert!((back.x - p.x).abs() < 1e-9, "{p:?} -> {back:?}");
            assert!((back.y - p.y).abs() < 1e-9, "{p:?} -> {back:?}");
        }
    }

    #[test]
    fn device_y_is_flipped() {
        let vp = square_viewport();
        let top = vp.graph_to_device(Point { x: 0.0, y: 10.0 });
        let bottom = vp.graph_to_device(Point { x: 0.0, y: -10.0 });
        assert!(top.y < bottom.y);
        assert_eq!(top.y, 0.0);
        assert_eq!(bottom.y, 300.0);
    }

    #[test]
    fn inverse_rejects_points_off_the_rectangle() {
        let vp = square_viewport();
        assert!(vp.device_to_graph(Point { x: -1.0, y: 50.0 }).is_none());
        assert!(vp.device_to_graph(Point { x: 50.0, y: 301.0 }).is_none());
    }

    #[test]
    fn grid_step_follows_the_span() {
        let vp = square_viewport();
        assert_eq!(vp.dec_places(Axis::X), 0);
        assert_eq!(vp.grid_step(Axis::X), 1.0);

        let tight = Viewport::new(
            Point { x: nz(300), y: nz(300) },
            Point { x: 0.0, y: 0.0 },
            -0.01..0.01,
            -10.0..10.0,
        )
        .unwrap();
        assert_eq!(tight.dec_places(Axis::X), -3);
        assert!((tight.grid_step(Axis::X) - 0.001).abs() < 1e-15);
    }

    #[test]
    fn zoom_round_trip_restores_bounds() {
        let mut vp = square_viewport();
        let shift = vp.shift_bounds(Axis::X, BoundOp::ZoomIn).unwrap();
        assert_eq!(shift.axis, Axis::X);
        assert_eq!(shift.bounds, -9.0..9.0);
        vp.apply_shift(&shift).unwrap();

        let shift = vp.shift_bounds(Axis::X, BoundOp::ZoomOut).unwrap();
        vp.apply_shift(&shift).unwrap();
        assert_eq!(*vp.bounds(Axis::X), -10.0..10.0);
    }

    #[test]
    fn zoom_in_at_the_floor_adjusts_the_other_axis() {
        let vp = Viewport::new(
            Point { x: nz(300), y: nz(300) },
            Point { x: 0.0, y: 0.0 },
            0.0..4e-5,
            -10.0..10.0,
        )
        .unwrap();
        let shift = vp.shift_bounds(Axis::X, BoundOp::ZoomIn).unwrap();
        assert_eq!(shift.axis, Axis::Y);
        assert_eq!(shift.bounds, -9.0..9.0);
    }

    #[test]
    fn panning_moves_both_ends_one_step() {
        let mut vp = square_viewport();
        let shift = vp.shift_bounds(Axis::Y, BoundOp::PanPositive).unwrap();
        assert_eq!(shift.bounds, -9.0..11.0);
        vp.apply_shift(&shift).unwrap();
        let shift = vp.shift_bounds(Axis::Y, BoundOp::PanNegative).unwrap();
        assert_eq!(shift.bounds, -10.0..10.0);
    }

    #[test]
    fn linspace_hits_both_endpoints() {
        let samples = linspace(&(-10.0..10.0), 21);
        assert_eq!(samples.len(), 21);
        assert_eq!(samples[0], -10.0);
        assert_eq!(samples[20], 10.0);
        assert_eq!(samples[10], 0.0);
    }
}
