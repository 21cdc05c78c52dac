// SPDX: CC0-1.0

use crate::{
    eval::Program,
    lex::Lexer,
    parse::{parse, ParseErr},
    Axis,
};
use core::fmt;
use std::sync::Arc;

/// The two sides of an equation after normalization. Immutable once
/// produced; validation decides what to do with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedEquation {
    pub lhs: String,
    pub rhs: String,
}

impl fmt::Display for NormalizedEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

/// How a relation gets rasterized: dense 1-D sampling when one side is a
/// bare variable marker, the pixel sign-test scan otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    /// `y = f(x)`
    ExplicitY,
    /// `x = f(y)`
    ExplicitX,
    /// anything else, e.g. `x^2+y^2=4`
    Implicit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Lhs,
    Rhs,
}

/// A normalized equation compiled to one reusable program per side.
#[derive(Clone, Debug)]
pub struct Relation {
    equation: NormalizedEquation,
    lhs_prog: Program,
    rhs_prog: Program,
    form: Form,
    /// Which side holds `f` for the explicit forms.
    expr_side: Side,
}

impl Relation {
    /// Parse both sides of a normalized equation. Compilation happens once;
    /// plotting re-runs the programs with fresh variable bindings per
    /// sample.
    pub fn compile(equation: NormalizedEquation) -> Result<Self, ParseErr> {
        let lhs_src = Arc::new(equation.lhs.clone());
        let lhs_prog = parse(Lexer::new(&lhs_src))?;
        let rhs_src = Arc::new(equation.rhs.clone());
        let rhs_prog = parse(Lexer::new(&rhs_src))?;
        let (form, expr_side) = classify(&equation);
        Ok(Self {
            equation,
            lhs_prog,
            rhs_prog,
            form,
            expr_side,
        })
    }

    pub fn equation(&self) -> &NormalizedEquation {
        &self.equation
    }

    pub fn form(&self) -> Form {
        self.form
    }

    pub fn lhs_prog(&self) -> &Program {
        &self.lhs_prog
    }

    pub fn rhs_prog(&self) -> &Program {
        &self.rhs_prog
    }

    /// For explicit forms, the independent axis and the program computing
    /// the dependent value. `None` means the relation needs the scanner.
    pub fn trace_parts(&self) -> Option<(Axis, &Program)> {
        let independent = match self.form {
            Form::ExplicitY => Axis::X,
            Form::ExplicitX => Axis::Y,
            Form::Implicit => return None,
        };
        let prog = match self.expr_side {
            Side::Lhs => &self.lhs_prog,
            Side::Rhs => &self.rhs_prog,
        };
        Some((independent, prog))
    }
}

/// A side is a marker when it is literally the wrapped variable and the
/// other side does not mention that variable at all.
fn classify(eq: &NormalizedEquation) -> (Form, Side) {
    if eq.lhs == "(y)" && !eq.rhs.contains('y') {
        (Form::ExplicitY, Side::Rhs)
    } else if eq.rhs == "(y)" && !eq.lhs.contains('y') {
        (Form::ExplicitY, Side::Lhs)
    } else if eq.lhs == "(x)" && !eq.rhs.contains('x') {
        (Form::ExplicitX, Side::Rhs)
    } else if eq.rhs == "(x)" && !eq.lhs.contains('x') {
        (Form::ExplicitX, Side::Lhs)
    } else {
        (Form::Implicit, Side::Rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::normalize, ScalarState};

    fn compile(raw: &str) -> Relation {
        Relation::compile(normalize(raw, &ScalarState::default())).expect("compiles cleanly")
    }

    #[test]
    fn classifies_explicit_y() {
        let rel = compile("y=x^2");
        assert_eq!(rel.form(), Form::ExplicitY);
        let (independent, _) = rel.trace_parts().unwrap();
        assert_eq!(independent, Axis::X);
    }

    #[test]
    fn classifies_flipped_sides() {
        let rel = compile("sin(x)=y");
        assert_eq!(rel.form(), Form::ExplicitY);

        let rel = compile("x=y^2");
        assert_eq!(rel.form(), Form::ExplicitX);
        let (independent, _) = rel.trace_parts().unwrap();
        assert_eq!(independent, Axis::Y);
    }

    #[test]
    fn classifies_implicit() {
        assert_eq!(compile("x^2+y^2=4").form(), Form::Implicit);
        assert!(compile("x^2+y^2=4").trace_parts().is_none());
        // the marker side reappearing on the other side forces a scan
        assert_eq!(compile("y=y").form(), Form::Implicit);
    }
}
