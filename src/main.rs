// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
use core::ops::Range;
use graph_calc::{
    display::round_display,
    relation::Relation,
    scan::ScanHandle,
    shell::{self, Command},
    stdlib,
    trace::trace_explicit,
    validate::{validate, InvalidKind, Outcome},
    viewport::{BoundOp, BoundShift, Viewport},
    Axis, Number, Point, ScalarState,
};
#[cfg(not(debug_assertions))]
use std::process::Stdio;
use std::{
    fs::OpenOptions,
    io::{stdout, BufWriter, Write},
    process::{self, Child, ExitCode},
    thread,
    time::Duration,
};

const SLOT_COUNT: usize = 4;
const LINE_COLORS: [&str; SLOT_COUNT] = ["#ff0000", "#0ca830", "#0c40ff", "#803080"];
const DEFAULT_RES: u16 = 300;
const MIN_RES: u16 = 150;
const MIN_BOUND_MAGNITUDE: Number = 1e-5;
const SCAN_POLL: Duration = Duration::from_millis(50);

/// Exit code when the plotting collaborator is missing at startup.
const NO_GNUPLOT_EXIT: u8 = 66;

fn default_bounds() -> Range<Number> {
    -10.0..10.0
}

fn output_svg_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn output_gnuplot_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "gnuplot"
    )
}

fn output_data_filename(now: DateTime<Local>) -> String {
    format!(
        "{}_output-{}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "data"
    )
}

fn main() -> ExitCode {
    if !gnuplot_available() {
        eprintln!("gnuplot was not found (is it installed and in ${{PATH}}?)");
        return ExitCode::from(NO_GNUPLOT_EXIT);
    }
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn gnuplot_available() -> bool {
    process::Command::new("gnuplot")
        .arg("--version")
        .output()
        .is_ok()
}

/// One relation slot: the user's text plus whatever plot data the last
/// render produced. Traced segments live in device space; scan hits stay
/// in graph space so a pan or zoom can re-project them without rescanning.
#[derive(Debug)]
struct Slot {
    text: String,
    enabled: bool,
    relation: Option<Relation>,
    segments: Vec<Vec<Point<Number>>>,
    points: Vec<Point<Number>>,
    scan: Option<ScanHandle>,
}

impl Slot {
    fn new(text: &str, enabled: bool) -> Self {
        Self {
            text: String::from(text),
            enabled,
            relation: None,
            segments: Vec::new(),
            points: Vec::new(),
            scan: None,
        }
    }
}

#[derive(Debug)]
struct State {
    scalars: ScalarState,
    viewport: Viewport,
    slots: Vec<Slot>,
    gnuplot: Option<Child>,
}

fn try_main() -> anyhow::Result<()> {
    let res = NonZeroU16::new(DEFAULT_RES).context("default resolution is nonzero")?;
    let viewport = Viewport::new(
        Point { x: res, y: res },
        Point { x: 0.0, y: 0.0 },
        default_bounds(),
        default_bounds(),
    )
    .map_err(|err| anyhow::anyhow!("default viewport: {err}"))?;

    let mut state = State {
        scalars: ScalarState::default(),
        viewport,
        slots: vec![
            Slot::new("y = -x^3", true),
            Slot::new("y = x(x + 1)(x - 2)", false),
            Slot::new("", false),
            Slot::new("", false),
        ],
        gnuplot: None,
    };

    let mut stdout = BufWriter::new(stdout());
    loop {
        print_status(&mut stdout, &state)?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                }

                Command::Quit => break,

                Command::SetEq => set_eq(&mut stdout, &mut state)?,

                Command::Toggle => toggle(&mut stdout, &mut state)?,

                Command::SetWin => set_win(&mut stdout, &mut state)?,

                Command::Center => {
                    if state
                        .viewport
                        .set_bounds(default_bounds(), default_bounds())
                        .is_ok()
                    {
                        redraw(&mut stdout, &mut state)?;
                    }
                }

                Command::ZoomIn => zoom(&mut stdout, &mut state, BoundOp::ZoomIn)?,
                Command::ZoomOut => zoom(&mut stdout, &mut state, BoundOp::ZoomOut)?,
                Command::PanLeft => pan(&mut stdout, &mut state, Axis::X, BoundOp::PanNegative)?,
                Command::PanRight => pan(&mut stdout, &mut state, Axis::X, BoundOp::PanPositive)?,
                Command::PanUp => pan(&mut stdout, &mut state, Axis::Y, BoundOp::PanPositive)?,
                Command::PanDown => pan(&mut stdout, &mut state, Axis::Y, BoundOp::PanNegative)?,

                Command::Render => render(&mut stdout, &mut state)?,

                Command::Show => show(&mut stdout, &state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn print_status<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let vp = &state.viewport;
    let x = vp.bounds(Axis::X);
    let y = vp.bounds(Axis::Y);
    writeln!(
        out,
        "x: [{}, {}]  y: [{}, {}]  ({}x{} px)",
        round_display(x.start, -vp.dec_places(Axis::X)),
        round_display(x.end, -vp.dec_places(Axis::X)),
        round_display(y.start, -vp.dec_places(Axis::Y)),
        round_display(y.end, -vp.dec_places(Axis::Y)),
        vp.resolution().x,
        vp.resolution().y,
    )?;
    for (idx, slot) in state.slots.iter().enumerate() {
        let mark = if slot.enabled { 'x' } else { ' ' };
        writeln!(out, "  {} [{mark}] {}", idx + 1, slot.text)?;
    }
    Ok(())
}

fn read_slot<W: Write>(mut out: W) -> anyhow::Result<Option<usize>> {
    match shell::read_fromstr::<_, usize>(&mut out, "?slot (1-4) = ", true)? {
        Ok(Some(n)) if (1..=SLOT_COUNT).contains(&n) => Ok(Some(n - 1)),
        Ok(Some(_)) => {
            writeln!(out, "note: slot must be between 1 and 4")?;
            Ok(None)
        }
        Ok(None) | Err(_) => Ok(None),
    }
}

fn set_eq<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let idx = match read_slot(&mut out)? {
        Some(idx) => idx,
        None => return Ok(()),
    };

    let raw = shell::input(&mut out, "equation = ")?;
    let text = shell::sanitize_equation(&raw);

    let slot = &mut state.slots[idx];
    slot.text = text;
    slot.relation = None;
    slot.segments.clear();
    slot.points.clear();
    if let Some(old) = slot.scan.take() {
        old.cancel();
    }
    if slot.text.is_empty() {
        return Ok(());
    }

    match validate(&state.slots[idx].text, &mut state.scalars) {
        Outcome::Valid(rel) => {
            writeln!(out, "ok: {}", rel.equation())?;
            state.slots[idx].relation = Some(rel);
            state.slots[idx].enabled = true;
        }
        Outcome::AssignedM => {
            writeln!(out, "assigned value to: $m")?;
            if state.scalars.m_changed() {
                writeln!(out, "note: render to apply the new value")?;
            }
        }
        Outcome::AssignedN => {
            writeln!(out, "assigned value to: $n")?;
            if state.scalars.n_changed() {
                writeln!(out, "note: render to apply the new value")?;
            }
        }
        Outcome::Invalid(kind) => report_invalid(&mut out, idx, &kind)?,
    }

    Ok(())
}

fn report_invalid<W: Write>(mut out: W, idx: usize, kind: &InvalidKind) -> anyhow::Result<()> {
    writeln!(out, "slot {}: invalid: {kind}", idx + 1)?;
    if let InvalidKind::UndefinedName(name) = kind {
        if let Some(similar) = suggest(name) {
            let typ = match stdlib::lookup(similar) {
                Some(stdlib::Entry::Var(_)) => "variable",
                Some(stdlib::Entry::Const(_)) => "constant",
                Some(stdlib::Entry::Fun(_, _)) => "function",
                None => "name",
            };
            writeln!(out, "note: {typ} '{similar}' has a similar name")?;
        }
    }
    Ok(())
}

/// The vocabulary entry most similar to a misspelled name, if any is
/// close enough to be worth mentioning.
fn suggest(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    let mut best: Option<(f64, &'static str)> = None;
    for &cand in stdlib::NAMES {
        let sim = strsim::normalized_damerau_levenshtein(&lower, cand);
        if best.map(|(acc, _)| sim > acc).unwrap_or(true) {
            best = Some((sim, cand));
        }
    }
    best.filter(|(sim, _)| *sim > 0.3).map(|(_, cand)| cand)
}

fn toggle<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    if let Some(idx) = read_slot(&mut out)? {
        let slot = &mut state.slots[idx];
        slot.enabled = !slot.enabled;
        writeln!(
            out,
            "slot {} is now {}",
            idx + 1,
            if slot.enabled { "enabled" } else { "disabled" }
        )?;
    }
    Ok(())
}

fn set_win<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "win = {}", state.viewport)?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    let mut x = state.viewport.bounds(Axis::X).clone();
    let mut y = state.viewport.bounds(Axis::Y).clone();
    for (name, dst) in [
        ("left x", &mut x.start),
        ("right x", &mut x.end),
        ("lower y", &mut y.start),
        ("upper y", &mut y.end),
    ] {
        match shell::read_fromstr::<_, Number>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    for bound in [x.start, x.end, y.start, y.end] {
        if bound != 0.0 && bound.abs() < MIN_BOUND_MAGNITUDE {
            writeln!(out, "invalid: bound magnitudes under 1e-5 do not label")?;
            return Ok(());
        }
    }
    if x.end <= x.start || y.end <= y.start {
        writeln!(out, "invalid: lower bounds must stay below upper bounds")?;
        return Ok(());
    }

    let mut resolution = state.viewport.resolution();
    writeln!(out, "note: resolution must be an integer of at least {MIN_RES}")?;
    for (name, dst) in [("width", &mut resolution.x), ("height", &mut resolution.y)] {
        match shell::read_fromstr::<_, NonZeroU16>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) if new.get() >= MIN_RES => *dst = new,
            Ok(Some(_)) => {
                writeln!(out, "invalid: resolution must be at least {MIN_RES}")?;
                return Ok(());
            }
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    // slot text and enabled flags carry over untouched
    let pos = state.viewport.pos();
    if let Err(err) = state.viewport.reset(resolution, pos, x, y) {
        writeln!(out, "invalid: {err}")?;
        return Ok(());
    }
    render(&mut out, state)
}

fn apply_shift<W: Write>(
    mut out: W,
    state: &mut State,
    shift: &BoundShift,
) -> anyhow::Result<bool> {
    match state.viewport.apply_shift(shift) {
        Ok(()) => Ok(true),
        Err(err) => {
            writeln!(out, "invalid: {err}")?;
            Ok(false)
        }
    }
}

fn zoom<W: Write>(mut out: W, state: &mut State, op: BoundOp) -> anyhow::Result<()> {
    let mut moved = false;
    let mut y_done = false;
    if let Some(shift) = state.viewport.shift_bounds(Axis::X, op) {
        y_done = shift.axis == Axis::Y;
        moved |= apply_shift(&mut out, state, &shift)?;
    }
    if !y_done {
        if let Some(shift) = state.viewport.shift_bounds(Axis::Y, op) {
            moved |= apply_shift(&mut out, state, &shift)?;
        }
    }
    if moved {
        redraw(&mut out, state)?;
    } else {
        writeln!(out, "note: already at the zoom floor")?;
    }
    Ok(())
}

fn pan<W: Write>(mut out: W, state: &mut State, axis: Axis, op: BoundOp) -> anyhow::Result<()> {
    if let Some(shift) = state.viewport.shift_bounds(axis, op) {
        if apply_shift(&mut out, state, &shift)? {
            redraw(&mut out, state)?;
        }
    }
    Ok(())
}

/// The pan/zoom fast path: re-trace the explicit relations (cheap) and let
/// the emitter re-project stored scan points. No rescan happens until the
/// next full render, so freshly exposed implicit branches stay missing
/// until then.
fn redraw<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    for slot in &mut state.slots {
        if !slot.enabled {
            continue;
        }
        if let Some(rel) = &slot.relation {
            if let Some((independent, prog)) = rel.trace_parts() {
                slot.segments = trace_explicit(independent, prog, &state.viewport);
            }
        }
    }
    emit(&mut out, state)
}

fn render<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    for idx in 0..SLOT_COUNT {
        if !state.slots[idx].enabled || state.slots[idx].text.is_empty() {
            continue;
        }
        let text = state.slots[idx].text.clone();
        match validate(&text, &mut state.scalars) {
            Outcome::Valid(rel) => {
                match rel.trace_parts() {
                    Some((independent, prog)) => {
                        state.slots[idx].segments =
                            trace_explicit(independent, prog, &state.viewport);
                        state.slots[idx].points.clear();
                        if let Some(old) = state.slots[idx].scan.take() {
                            old.cancel();
                        }
                    }
                    None => {
                        // one scan in flight per slot: supersede the old one
                        if let Some(old) = state.slots[idx].scan.take() {
                            old.cancel();
                        }
                        state.slots[idx].scan = Some(ScanHandle::spawn(
                            rel.lhs_prog().clone(),
                            rel.rhs_prog().clone(),
                            state.viewport.clone(),
                        ));
                        state.slots[idx].segments.clear();
                    }
                }
                state.slots[idx].relation = Some(rel);
            }
            Outcome::AssignedM => writeln!(out, "slot {}: assigned value to: $m", idx + 1)?,
            Outcome::AssignedN => writeln!(out, "slot {}: assigned value to: $n", idx + 1)?,
            // an invalid slot blocks only itself
            Outcome::Invalid(kind) => report_invalid(&mut out, idx, &kind)?,
        }
    }

    if state.slots.iter().any(|slot| slot.scan.is_some()) {
        writeln!(out, "scanning...")?;
        out.flush()?;
    }
    loop {
        let mut pending = false;
        for slot in &mut state.slots {
            let finished = slot.scan.as_ref().and_then(ScanHandle::poll);
            if let Some(points) = finished {
                slot.points = points;
                slot.scan = None;
            } else if slot.scan.is_some() {
                pending = true;
            }
        }
        if !pending {
            break;
        }
        thread::sleep(SCAN_POLL);
    }

    emit(&mut out, state)
}

enum PlotStyle {
    Lines,
    Points,
}

/// Write the plot data and a gnuplot script, then hand them to a fresh
/// `gnuplot --persist` viewer. Traced segments are separated by single
/// blank lines (gnuplot breaks the line there, which is exactly a pen
/// lift); slots are separated by double blank lines and addressed with
/// `index`.
fn emit<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    if let Some(mut old_child) = state.gnuplot.take() {
        old_child
            .kill()
            .context("failed to kill previous gnuplot child")?;
    }

    let now = Local::now();
    let data_path = output_data_filename(now);
    let gnuplot_path = output_gnuplot_filename(now);
    let svg_path = output_svg_filename(now);

    let mut data = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&data_path)
            .context("failed to open output data file")?,
    );

    let vp = &state.viewport;
    let mut datasets: Vec<(usize, PlotStyle)> = Vec::new();
    for (idx, slot) in state.slots.iter().enumerate() {
        if !slot.enabled {
            continue;
        }
        if !slot.segments.is_empty() {
            for (seg_idx, seg) in slot.segments.iter().enumerate() {
                if seg_idx > 0 {
                    writeln!(data)?;
                }
                for p in seg {
                    let graph = vp.invert(*p);
                    writeln!(data, "{} {}", graph.x, graph.y)?;
                }
            }
            writeln!(data)?;
            writeln!(data)?;
            datasets.push((idx, PlotStyle::Lines));
        } else if !slot.points.is_empty() {
            let mut wrote = false;
            for p in &slot.points {
                if vp.contains(*p) {
                    writeln!(data, "{} {}", p.x, p.y)?;
                    wrote = true;
                }
            }
            if wrote {
                writeln!(data)?;
                writeln!(data)?;
                datasets.push((idx, PlotStyle::Points));
            } else {
                writeln!(out, "slot {}: empty graph", idx + 1)?;
            }
        }
    }

    data.flush()?;
    data.get_mut().sync_data()?;
    drop(data);

    if datasets.is_empty() {
        writeln!(out, "nothing to plot")?;
        return Ok(());
    }

    let mut gnuplot = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&gnuplot_path)
            .context("failed to open output gnuplot file")?,
    );

    writeln!(gnuplot, "reset")?;
    writeln!(gnuplot, "set term push")?;
    let resolution = vp.resolution();
    writeln!(
        gnuplot,
        "set terminal svg size {width},{height} enhanced",
        width = resolution.x,
        height = resolution.y,
    )?;
    writeln!(gnuplot, "set output '{svg_path}'")?;

    let x = vp.bounds(Axis::X);
    let y = vp.bounds(Axis::Y);
    writeln!(gnuplot, "set xrange[{min}:{max}]", min = x.start, max = x.end)?;
    writeln!(gnuplot, "set yrange[{min}:{max}]", min = y.start, max = y.end)?;

    writeln!(gnuplot, r#"set title "{data_path}""#)?;
    writeln!(gnuplot, "set title noenhanced")?;
    writeln!(gnuplot, r#"set xlabel "x""#)?;
    writeln!(gnuplot, r#"set ylabel "y""#)?;
    writeln!(gnuplot, "set tics out nomirror")?;
    writeln!(gnuplot, "set key out vertical top right")?;
    writeln!(gnuplot, r#"set key title "Relations""#)?;

    writeln!(gnuplot, r#"plot \"#)?;
    for (nth, (idx, style)) in datasets.iter().enumerate() {
        let sep = if nth + 1 == datasets.len() { "" } else { ", \\" };
        let color = LINE_COLORS[*idx];
        let title = &state.slots[*idx].text;
        match style {
            PlotStyle::Lines => writeln!(
                gnuplot,
                r#"  '{data_path}' index {nth} with lines lc rgb '{color}' title "{title}" noenhance{sep}"#,
            )?,
            PlotStyle::Points => writeln!(
                gnuplot,
                r#"  '{data_path}' index {nth} with points pt 5 ps 0.4 lc rgb '{color}' title "{title}" noenhance{sep}"#,
            )?,
        }
    }

    writeln!(gnuplot, "set term pop")?;
    writeln!(gnuplot, "replot")?;

    gnuplot.flush()?;
    gnuplot.get_mut().sync_data()?;
    drop(gnuplot);

    let mut cmd = process::Command::new("gnuplot");
    cmd.arg("--persist").arg(&gnuplot_path);
    #[cfg(not(debug_assertions))]
    {
        cmd.stdout(Stdio::null())
            .stderr(Stdio::null())
            .stdin(Stdio::null());
    }
    let child = cmd
        .spawn()
        .context("failed to spawn gnuplot (is it installed and in ${PATH}?)")?;
    state.gnuplot = Some(child);

    writeln!(out, "wrote {svg_path}")?;
    Ok(())
}

fn show<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    writeln!(out, "{}", state.viewport)?;
    writeln!(
        out,
        "$m = {m} (was {old_m}), $n = {n} (was {old_n})",
        m = state.scalars.m,
        old_m = state.scalars.old_m,
        n = state.scalars.n,
        old_n = state.scalars.old_n,
    )?;
    for (idx, slot) in state.slots.iter().enumerate() {
        let mark = if slot.enabled { 'x' } else { ' ' };
        writeln!(out, "slot {} [{mark}] {}", idx + 1, slot.text)?;
        if let Some(rel) = &slot.relation {
            shell::dump_program(&mut out, rel.lhs_prog(), format_args!("  lhs"))?;
            shell::dump_program(&mut out, rel.rhs_prog(), format_args!("  rhs"))?;
        }
    }
    Ok(())
}
