// SPDX: CC0-1.0

use crate::{
    eval::{eval, Bindings, DomainError, EvalErr, EvalErrTyp},
    lex::Lexer,
    normalize::normalize,
    parse::{parse, ParseErrTyp},
    relation::Relation,
    Number, ScalarState,
};
use core::fmt;
use std::sync::Arc;

/// Why an equation was rejected. Surfaced inline next to the offending
/// input; never fatal to the rest of the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidKind {
    /// Not exactly one `=`, or neither `x` nor `y` appears.
    MissingRelation,
    /// A literal `/0` survives whitespace removal.
    DivByZeroLiteral,
    /// Overflow or another unrecoverable arithmetic failure at the probe.
    Arithmetic,
    /// An identifier outside the vocabulary (carries the name).
    UndefinedName(String),
    /// The expression does not lex or parse.
    Syntax,
    /// Structurally sound but not a single value, e.g. juxtaposed groups.
    Type,
}

impl fmt::Display for InvalidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRelation => write!(f, "missing '=' and/or a free 'x' or 'y'"),
            Self::DivByZeroLiteral => write!(f, "division by zero"),
            Self::Arithmetic => write!(f, "arithmetic error"),
            Self::UndefinedName(name) => write!(f, "unknown name '{name}'"),
            Self::Syntax => write!(f, "malformed expression"),
            Self::Type => write!(f, "type mismatch"),
        }
    }
}

/// The one result of validating one line of input.
#[derive(Debug)]
pub enum Outcome {
    /// A plottable relation, compiled and ready.
    Valid(Relation),
    /// The line assigned `$m`; the relation slots are untouched.
    AssignedM,
    /// The line assigned `$n`.
    AssignedN,
    Invalid(InvalidKind),
}

/// Validate one line of equation input.
///
/// Scalar assignments are applied to `scalars` as a side effect; a failed
/// assignment keeps the previous value and still reports `AssignedM`/`N`.
/// Relations are probed at `x = y = 1` so structural mistakes surface now,
/// while being merely undefined at the probe point is fine.
pub fn validate(raw: &str, scalars: &mut ScalarState) -> Outcome {
    let raw = raw.trim();

    if let Some(rhs) = scalar_assignment(raw, 'm') {
        if let Some(val) = eval_scalar(rhs) {
            scalars.assign_m(val);
        }
        return Outcome::AssignedM;
    }
    if let Some(rhs) = scalar_assignment(raw, 'n') {
        if let Some(val) = eval_scalar(rhs) {
            scalars.assign_n(val);
        }
        return Outcome::AssignedN;
    }

    if raw.matches('=').count() != 1 || (!raw.contains('x') && !raw.contains('y')) {
        return Outcome::Invalid(InvalidKind::MissingRelation);
    }

    let squeezed: String = raw.chars().filter(|chr| !chr.is_whitespace()).collect();
    if squeezed.contains("/0") {
        return Outcome::Invalid(InvalidKind::DivByZeroLiteral);
    }

    let rel = match Relation::compile(normalize(raw, scalars)) {
        Ok(rel) => rel,
        Err(err) => {
            let kind = match err.typ {
                ParseErrTyp::UndefinedIdent => {
                    InvalidKind::UndefinedName(err.loc.get().to_string())
                }
                ParseErrTyp::LexErr(_) | ParseErrTyp::ParseNum(_) | ParseErrTyp::ParenMismatch => {
                    InvalidKind::Syntax
                }
            };
            return Outcome::Invalid(kind);
        }
    };

    // Probe both sides at a neutral point. Being undefined right there is
    // tolerated and ends probing; only hard failures reject.
    let probe = Bindings::xy(1.0, 1.0);
    let mut stack = Vec::new();
    let mut verdict = None;
    for prog in [rel.lhs_prog(), rel.rhs_prog()] {
        if let Err(err) = eval(prog, &probe, &mut stack) {
            verdict = probe_failure(err);
            break;
        }
    }
    match verdict {
        Some(kind) => Outcome::Invalid(kind),
        None => Outcome::Valid(rel),
    }
}

/// `None` when the failure only means "undefined at the probe point".
fn probe_failure(err: EvalErr) -> Option<InvalidKind> {
    match err.typ {
        EvalErrTyp::Domain(DomainError::DivisionByZero)
        | EvalErrTyp::Domain(DomainError::OutOfDomain) => None,
        EvalErrTyp::Domain(DomainError::Overflow) => Some(InvalidKind::Arithmetic),
        EvalErrTyp::Empty => Some(InvalidKind::Syntax),
        EvalErrTyp::MissingArgs { .. } | EvalErrTyp::StackMismatch { .. } => {
            Some(InvalidKind::Type)
        }
        EvalErrTyp::UnboundVar { text } => Some(InvalidKind::UndefinedName(text.get().to_string())),
    }
}

/// Match `m\s*=` (or `n\s*=`) with no `x`/`y` anywhere, returning the text
/// between the first and second `=`.
fn scalar_assignment(raw: &str, which: char) -> Option<&str> {
    if raw.contains('x') || raw.contains('y') {
        return None;
    }
    let rest = raw.strip_prefix(which)?.trim_start();
    rest.strip_prefix('=')?;
    raw.split('=').nth(1)
}

/// Evaluate a scalar right-hand side from the raw text, skipping
/// normalization entirely. Any failure is silently absorbed.
fn eval_scalar(rhs: &str) -> Option<Number> {
    let src = Arc::new(rhs.trim().to_string());
    let prog = parse(Lexer::new(&src)).ok()?;
    eval(&prog, &Bindings::none(), &mut Vec::new()).ok()
}
