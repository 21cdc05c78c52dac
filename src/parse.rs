// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm)

use crate::{
    eval::{Associativity, Fun, Operation, OperationTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, TokTyp},
    stdlib::{self, Entry},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    UndefinedIdent,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::UndefinedIdent => write!(f, "undefined identifier"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun(&'static str, Fun),
    OpenParen,
}

#[derive(Clone, Debug)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

impl ShuntOp {
    fn precedence(&self) -> i8 {
        match self.typ {
            ShuntOpTyp::Operator(op) => op.precedence(),
            // a pending call binds tighter than any operator
            // (see https://softwareengineering.stackexchange.com/questions/290043/precedence-of-function-in-shunting-yard-algorithm)
            ShuntOpTyp::Fun(_, _) => i8::MAX,
            ShuntOpTyp::OpenParen => unreachable!("open paren has no precedence"),
        }
    }

    fn is_open_paren(&self) -> bool {
        matches!(self.typ, ShuntOpTyp::OpenParen)
    }

    fn into_output(self) -> Operation {
        let typ = match self.typ {
            ShuntOpTyp::Operator(typ) => OperationTyp::Operator(typ),
            ShuntOpTyp::Fun(name, fun) => OperationTyp::Call(name, fun),
            ShuntOpTyp::OpenParen => {
                unreachable!("no parentheses in the output stack")
            }
        };
        Operation { typ, loc: self.loc }
    }
}

pub fn parse(lex: Lexer<'_>) -> Result<Program, ParseErr> {
    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack

    for tok in lex {
        let tok = tok?;
        match tok.typ {
            TokTyp::Number => {
                let num: Number = match tok.loc.get().parse() {
                    Ok(val) => val,
                    Err(err) => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParseNum(err),
                            loc: tok.loc,
                        })
                    }
                };
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc,
                });
            }

            TokTyp::Ident => match stdlib::lookup(tok.loc.get()) {
                Some(Entry::Var(axis)) => out.push(Operation {
                    typ: OperationTyp::Var(axis),
                    loc: tok.loc,
                }),
                Some(Entry::Const(val)) => out.push(Operation {
                    typ: OperationTyp::Val(val),
                    loc: tok.loc,
                }),
                Some(Entry::Fun(name, fun)) => ops.push(ShuntOp {
                    typ: ShuntOpTyp::Fun(name, fun),
                    loc: tok.loc,
                }),
                None => {
                    return Err(ParseErr {
                        typ: ParseErrTyp::UndefinedIdent,
                        loc: tok.loc,
                    });
                }
            },

            TokTyp::Op(o1) => {
                while let Some(o2) = ops.last().cloned() {
                    if !o2.is_open_paren()
                        && ((o2.precedence() > o1.precedence())
                            || ((o1.precedence() == o2.precedence())
                                && (o1.associativity() == Associativity::Left)))
                    {
                        ops.pop().unwrap();
                        out.push(o2.into_output());
                    } else {
                        break;
                    }
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Operator(o1),
                    loc: tok.loc,
                });
            }

            TokTyp::OpenParen => {
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen,
                    loc: tok.loc,
                });
            }

            TokTyp::CloseParen => {
                while let Some(op) = ops.last() {
                    if !op.is_open_paren() {
                        let op = ops.pop().unwrap();
                        out.push(op.into_output());
                    } else {
                        break;
                    }
                }

                if let Some(op) = ops.pop() {
                    if !op.is_open_paren() {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: op.loc,
                        });
                    }
                } else {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    });
                }

                // a call site: the group just closed was this function's argument
                if let Some(op) = ops.last() {
                    if let ShuntOpTyp::Fun(_, _) = op.typ {
                        let op = ops.pop().unwrap();
                        out.push(op.into_output());
                    }
                }
            }

            TokTyp::XEqual | TokTyp::XComma => {
                unreachable!("unsupported token survived until parsing")
            }
        }
    }

    while let Some(op) = ops.pop() {
        if op.is_open_paren() {
            return Err(ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: op.loc,
            });
        }
        out.push(op.into_output());
    }

    Ok(Program::new(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{eval, Bindings};
    use std::sync::Arc;

    fn parse_str(src: &str) -> Result<Program, ParseErr> {
        let src = Arc::new(String::from(src));
        parse(Lexer::new(&src))
    }

    #[test]
    fn resolves_vocabulary_calls() {
        let prog = parse_str("sin(pi/2)+sqrt(4)").unwrap();
        let val = eval(&prog, &Bindings::none(), &mut Vec::new()).unwrap();
        assert!((val - 3.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_name_is_a_parse_error() {
        let err = parse_str("foo(1)").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::UndefinedIdent));
        assert_eq!(err.loc.get(), "foo");
    }

    #[test]
    fn mismatched_parens() {
        assert!(matches!(
            parse_str("(1+2").unwrap_err().typ,
            ParseErrTyp::ParenMismatch
        ));
        assert!(matches!(
            parse_str("1+2)").unwrap_err().typ,
            ParseErrTyp::ParenMismatch
        ));
    }

    #[test]
    fn malformed_number() {
        assert!(matches!(
            parse_str("1.2.3").unwrap_err().typ,
            ParseErrTyp::ParseNum(_)
        ));
    }

    #[test]
    fn nested_calls() {
        let prog = parse_str("log10(10^3)").unwrap();
        let val = eval(&prog, &Bindings::none(), &mut Vec::new()).unwrap();
        assert!((val - 3.0).abs() < 1e-12);
    }
}
