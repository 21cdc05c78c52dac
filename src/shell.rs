// SPDX: CC0-1.0

use crate::{eval::Program, lex::SubStr};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

/// Characters an equation field accepts: digits, the operator/punctuation
/// set, and exactly the letters needed to spell the vocabulary and the
/// variables. Everything else is dropped silently before validation.
const EQUATION_ALPHABET: &str = "0123456789=+-*/^().$ Aabcefgilmnopqrstxy";

/// Strip input down to the equation alphabet.
pub fn sanitize_equation(raw: &str) -> String {
    raw.chars()
        .filter(|chr| EQUATION_ALPHABET.contains(*chr))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    SetEq,
    Toggle,
    SetWin,
    Center,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    Render,
    Show,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::SetEq,
            Self::Toggle,
            Self::SetWin,
            Self::Center,
            Self::ZoomIn,
            Self::ZoomOut,
            Self::PanLeft,
            Self::PanRight,
            Self::PanUp,
            Self::PanDown,
            Self::Render,
            Self::Show,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::SetEq => "set the equation in one of the relation slots",
            Self::Toggle => "enable or disable one of the relation slots",
            Self::SetWin => "set bounds and graph resolution",
            Self::Center => "reset the bounds to -10..10 on both axes",
            Self::ZoomIn => "zoom in by one grid step per axis",
            Self::ZoomOut => "zoom out by one grid step per axis",
            Self::PanLeft => "pan one grid step towards negative x",
            Self::PanRight => "pan one grid step towards positive x",
            Self::PanUp => "pan one grid step towards positive y",
            Self::PanDown => "pan one grid step towards negative y",
            Self::Render => "validate, plot, and hand everything to gnuplot",
            Self::Show => "print slot programs and the viewport (for debugging)",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::SetEq => "eq",
            Self::Toggle => "toggle",
            Self::SetWin => "window",
            Self::Center => "center",
            Self::ZoomIn => "in",
            Self::ZoomOut => "out",
            Self::PanLeft => "left",
            Self::PanRight => "right",
            Self::PanUp => "up",
            Self::PanDown => "down",
            Self::Render => "render",
            Self::Show => "show",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for c in Self::exhaustive() {
            if s == c.name() {
                return Ok(*c);
            }
        }
        Err(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    writeln!(out, "{}", span.src())?;
    writeln!(
        out,
        "{}{}",
        " ".repeat(span.start()),
        "^".repeat(span.len())
    )?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    if prog.ops().len() == 0 {
        writeln!(out, "  (empty)")?;
    }
    for op in prog.ops() {
        writeln!(out, "  {op}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_drops_foreign_characters() {
        assert_eq!(sanitize_equation("y = sin(x)"), "y = sin(x)");
        assert_eq!(sanitize_equation("y=x^2 # comment!"), "y=x^2  comment");
        assert_eq!(sanitize_equation("y=\u{3b8}+x"), "y=+x");
    }

    #[test]
    fn command_names_round_trip() {
        for c in Command::exhaustive() {
            assert_eq!(c.name().parse::<Command>().unwrap(), *c);
        }
        assert!("bogus".parse::<Command>().is_err());
    }
}
