// SPDX: CC0-1.0

use crate::{lex::SubStr, Axis, Number};
use core::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Exp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Neg => 4,
            Self::Exp => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Exp => Right,
        }
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, crate::stdlib::neg)),
            Self::Add => ("add", Fun::new(2, crate::stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, crate::stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, crate::stdlib::mul)),
            Self::Div => ("div", Fun::new(2, crate::stdlib::div)),
            Self::Exp => ("pow", Fun::new(2, crate::stdlib::pow)),
        }
    }
}

/// A recoverable per-sample evaluation failure. Plotting treats these as
/// gaps or discarded samples, never as fatal errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainError {
    DivisionByZero,
    OutOfDomain,
    Overflow,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::OutOfDomain => write!(f, "outside the function domain"),
            Self::Overflow => write!(f, "arithmetic overflow"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(&[Number]) -> Result<Number, DomainError>,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Result<Number, DomainError>) -> Self {
        Self { arity, fun }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    /// A variable slot bound at evaluation time.
    Var(Axis),
    /// A vocabulary function resolved at parse time.
    Call(&'static str, Fun),
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().0),
            OperationTyp::Var(Axis::X) => write!(f, "load x"),
            OperationTyp::Var(Axis::Y) => write!(f, "load y"),
            OperationTyp::Call(name, _) => write!(f, "call '{name}'"),
        }
    }
}

#[derive(Debug)]
pub enum EvalErrTyp {
    Domain(DomainError),
    Empty,
    MissingArgs {
        name: &'static str,
        arity: usize,
        found: usize,
    },
    StackMismatch {
        expected: usize,
        found: usize,
    },
    UnboundVar {
        text: SubStr,
    },
}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub op: Option<Operation>, // if none, associated with end-of-program checking
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::Domain(err) => write!(f, "{err}"),

            EvalErrTyp::Empty => write!(f, "cannot evaluate empty program"),

            EvalErrTyp::MissingArgs { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),

            EvalErrTyp::StackMismatch { expected, found } => write!(
                f,
                "expected {expected} operation{s} on the stack but found {found}",
                s = if *expected == 1 { "" } else { "s" }
            ),

            EvalErrTyp::UnboundVar { text } => {
                write!(f, "variable '{}' has no value here", text.get())
            }
        }
    }
}

/// Values substituted for the `x`/`y` slots of a program. A slot left as
/// `None` turns any use of that variable into an `UnboundVar` error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bindings {
    pub x: Option<Number>,
    pub y: Option<Number>,
}

impl Bindings {
    pub const fn none() -> Self {
        Self { x: None, y: None }
    }

    pub const fn xy(x: Number, y: Number) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    pub const fn only(axis: Axis, val: Number) -> Self {
        match axis {
            Axis::X => Self {
                x: Some(val),
                y: None,
            },
            Axis::Y => Self {
                x: None,
                y: Some(val),
            },
        }
    }

    pub const fn get(&self, axis: Axis) -> Option<Number> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) ops: Vec<Operation>,
}

impl Program {
    #[inline]
    pub const fn new(ops: Vec<Operation>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }
}

fn eval_fun(
    stack: &mut Vec<Number>,
    op: &Operation,
    name: &'static str,
    fun: &Fun,
) -> Result<Number, EvalErr> {
    let len = stack.len();
    if len < fun.arity {
        return Err(EvalErr {
            typ: EvalErrTyp::MissingArgs {
                name,
                arity: fun.arity,
                found: len,
            },
            op: Some(op.clone()),
        });
    }
    let split = len - fun.arity;
    let val = (fun.fun)(&stack[split..]).map_err(|err| EvalErr {
        typ: EvalErrTyp::Domain(err),
        op: Some(op.clone()),
    })?;
    stack.truncate(split);

    // backstop for overflow and invalid results the vocabulary checks missed
    // (e.g. adding two barely-finite values)
    let domain = if val.is_nan() {
        Some(DomainError::OutOfDomain)
    } else if val.is_infinite() {
        Some(DomainError::Overflow)
    } else {
        None
    };
    if let Some(err) = domain {
        return Err(EvalErr {
            typ: EvalErrTyp::Domain(err),
            op: Some(op.clone()),
        });
    }
    Ok(val)
}

pub fn eval(
    prog: &Program,
    bindings: &Bindings,
    stack: &mut Vec<Number>,
) -> Result<Number, EvalErr> {
    if prog.ops.is_empty() {
        return Err(EvalErr {
            typ: EvalErrTyp::Empty,
            op: None,
        });
    }

    stack.clear();

    for op in prog.ops() {
        match op.typ {
            OperationTyp::Operator(typ) => {
                let (name, fun) = typ.fun();
                let val = eval_fun(stack, op, name, &fun)?;
                stack.push(val);
            }

            OperationTyp::Val(num) => stack.push(num),

            OperationTyp::Var(axis) => match bindings.get(axis) {
                Some(val) => stack.push(val),
                None => {
                    return Err(EvalErr {
                        typ: EvalErrTyp::UnboundVar {
                            text: op.loc.clone(),
                        },
                        op: Some(op.clone()),
                    });
                }
            },

            OperationTyp::Call(name, fun) => {
                let val = eval_fun(stack, op, name, &fun)?;
                stack.push(val);
            }
        }
    }

    if stack.len() != 1 {
        return Err(EvalErr {
            typ: EvalErrTyp::StackMismatch {
                expected: 1,
                found: stack.len(),
            },
            op: None,
        });
    }
    Ok(stack.pop().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::Lexer, parse::parse};
    use std::sync::Arc;

    fn eval_str(src: &str, bindings: &Bindings) -> Result<Number, EvalErr> {
        let src = Arc::new(String::from(src));
        let prog = parse(Lexer::new(&src)).expect("parses cleanly");
        eval(&prog, bindings, &mut Vec::new())
    }

    #[test]
    fn precedence_and_unary_minus() {
        assert_eq!(eval_str("2+3*4", &Bindings::none()).unwrap(), 14.0);
        assert_eq!(eval_str("-2^2", &Bindings::none()).unwrap(), -4.0);
        assert_eq!(eval_str("2^3^2", &Bindings::none()).unwrap(), 512.0);
        assert_eq!(eval_str("-(-3)", &Bindings::none()).unwrap(), 3.0);
    }

    #[test]
    fn variable_slots() {
        let bindings = Bindings::xy(3.0, 4.0);
        assert_eq!(eval_str("x*x+y*y", &bindings).unwrap(), 25.0);

        let err = eval_str("x+y", &Bindings::only(crate::Axis::X, 1.0)).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::UnboundVar { .. }));
    }

    #[test]
    fn division_by_zero_is_a_domain_error() {
        let err = eval_str("1/(x)", &Bindings::only(crate::Axis::X, 0.0)).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::Domain(DomainError::DivisionByZero)
        ));
    }

    #[test]
    fn overflow_is_a_domain_error() {
        let err = eval_str("10^10^10", &Bindings::none()).unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::Domain(DomainError::Overflow)));
    }

    #[test]
    fn juxtaposed_values_leave_the_stack_dirty() {
        let err = eval_str("(2)(3)", &Bindings::none()).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::StackMismatch {
                expected: 1,
                found: 2
            }
        ));
    }
}
