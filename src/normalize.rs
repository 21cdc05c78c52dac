// SPDX: CC0-1.0

//! Rewrites free-form equation text into the evaluator's vocabulary.
//!
//! Normalization is pure text-to-text: it never evaluates anything. Every
//! rewrite is idempotent on its own output, so running a normalized
//! equation through again changes nothing.

use crate::{relation::NormalizedEquation, ScalarState};
use core::f64::consts;

/// Synonyms accepted in input, applied as whole-identifier rewrites in this
/// order. `fact` chains through `factorial` into the shifted gamma, and the
/// reciprocal trig names expand to their quotient forms.
const REWRITES: &[(&str, &str)] = &[
    ("log", "log10"),
    ("ln", "log"),
    ("fact", "factorial"),
    ("factorial", "gamma_shift"),
    ("csc", "1/sin"),
    ("cosec", "1/sin"),
    ("sec", "1/cos"),
    ("cot", "1/tan"),
    ("arcsin", "asin"),
    ("arccos", "acos"),
    ("arctan", "atan"),
    ("abs", "fabs"),
];

/// Function names a digit coefficient can directly precede, post-rewrite.
const FUNCTION_TOKENS: &[&str] = &[
    "sin",
    "cos",
    "tan",
    "asin",
    "acos",
    "atan",
    "sqrt",
    "log",
    "log10",
    "gamma",
    "gamma_shift",
    "fabs",
];

/// Normalize one raw equation. The caller has already checked that the text
/// contains a single `=`; both returned sides are trimmed.
pub fn normalize(raw: &str, scalars: &ScalarState) -> NormalizedEquation {
    let text = normalize_text(raw, scalars);
    let mut split = text.splitn(2, '=');
    let lhs = split.next().unwrap_or("").trim().to_string();
    let rhs = split.next().unwrap_or("").trim().to_string();
    NormalizedEquation { lhs, rhs }
}

/// The full rewrite pipeline over the unsplit text.
pub fn normalize_text(raw: &str, scalars: &ScalarState) -> String {
    let mut text = wrap_variables(raw);
    for (from, to) in REWRITES {
        text = rewrite_idents(&text, from, to);
    }
    // `^` is already the power operator; adjacent groups multiply
    text = text.replace(")(", ")*(");
    text = substitute_scalars(&text, scalars);
    text = substitute_constants(&text);
    insert_juxta_mul(&text)
}

/// Parenthesize each bare `x`/`y` so operator precedence survives
/// substitution. Occurrences already wrapped as `(x)`/`(y)` are left alone.
fn wrap_variables(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    for (i, &chr) in chars.iter().enumerate() {
        if chr == 'x' || chr == 'y' {
            let wrapped = i > 0
                && chars[i - 1] == '('
                && chars.get(i + 1).copied() == Some(')');
            if wrapped {
                out.push(chr);
            } else {
                out.push('(');
                out.push(chr);
                out.push(')');
            }
        } else {
            out.push(chr);
        }
    }
    out
}

fn is_ident_start(chr: char) -> bool {
    chr.is_ascii_alphabetic()
}

fn is_ident_continue(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || chr == '_'
}

/// The identifier starting at `from`, which must be an ident-start position.
fn ident_at(chars: &[char], from: usize) -> String {
    let mut end = from + 1;
    while end < chars.len() && is_ident_continue(chars[end]) {
        end += 1;
    }
    chars[from..end].iter().collect()
}

/// Replace every whole identifier equal to `from` with `to`. Matching whole
/// tokens keeps `log10` safe from the `log` rule and makes rewriting
/// idempotent.
fn rewrite_idents(src: &str, from: &str, to: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < chars.len() {
        if is_ident_start(chars[i]) {
            let ident = ident_at(&chars, i);
            i += ident.len();
            if ident == from {
                out.push_str(to);
            } else {
                out.push_str(&ident);
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

/// Replace `$m`/`$n` with the current scalar values as parenthesized
/// literals. Any other `$` use is left for the lexer to reject.
fn substitute_scalars(src: &str, scalars: &ScalarState) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() && is_ident_start(chars[i + 1]) {
            let ident = ident_at(&chars, i + 1);
            let val = match ident.as_str() {
                "m" => Some(scalars.m),
                "n" => Some(scalars.n),
                _ => None,
            };
            if let Some(val) = val {
                out.push('(');
                out.push_str(&val.to_string());
                out.push(')');
                i += 1 + ident.len();
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Replace the constant names `e` and `pi` with parenthesized literals, so
/// a digit coefficient in front of them still gets explicit multiplication
/// from the digit-juxtaposition pass.
fn substitute_constants(src: &str) -> String {
    let text = rewrite_idents(src, "e", &format!("({})", consts::E));
    rewrite_idents(&text, "pi", &format!("({})", consts::PI))
}

/// Insert `*` between a digit and a following function name or `(`, e.g.
/// `2sin(x)` and `3(x+1)`. A digit that is the tail of an identifier such
/// as `log10` never triggers insertion, and already-explicit input is left
/// untouched.
fn insert_juxta_mul(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut prev_in_ident = false;
    for (i, &chr) in chars.iter().enumerate() {
        out.push(chr);
        let in_ident =
            is_ident_start(chr) || (prev_in_ident && is_ident_continue(chr));
        if chr.is_ascii_digit() && !in_ident {
            match chars.get(i + 1) {
                Some('(') => out.push('*'),
                Some(&next) if is_ident_start(next) => {
                    if FUNCTION_TOKENS.contains(&ident_at(&chars, i + 1).as_str()) {
                        out.push('*');
                    }
                }
                _ => {}
            }
        }
        prev_in_ident = in_ident;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize_text(raw, &ScalarState::default())
    }

    #[test]
    fn wraps_variables_once() {
        assert_eq!(norm("y=x"), "(y)=(x)");
        assert_eq!(norm("(y)=(x)"), "(y)=(x)");
    }

    #[test]
    fn juxtaposed_variable_names_become_calls() {
        assert_eq!(norm("y=sinx"), norm("y=sin(x)"));
        assert_eq!(norm("y=lnx"), "(y)=log(x)");
    }

    #[test]
    fn digit_coefficients_multiply() {
        assert_eq!(norm("y=2x"), "(y)=2*(x)");
        assert_eq!(norm("y=3(x+1)"), "(y)=3*((x)+1)");
        assert_eq!(norm("y=10sin(x)"), "(y)=10*sin(x)");
    }

    #[test]
    fn digit_insertion_spares_identifier_tails() {
        assert_eq!(norm("y=log10(x)"), "(y)=log10(x)");
        assert_eq!(norm("y=log(x)"), "(y)=log10(x)");
    }

    #[test]
    fn synonym_chain() {
        assert_eq!(norm("y=fact(x)"), "(y)=gamma_shift(x)");
        assert_eq!(norm("y=factorial(x)"), "(y)=gamma_shift(x)");
        assert_eq!(norm("y=arcsin(x)"), "(y)=asin(x)");
        assert_eq!(norm("y=abs(x)"), "(y)=fabs(x)");
        assert_eq!(norm("y=csc(x)"), "(y)=1/sin(x)");
    }

    #[test]
    fn adjacent_groups_multiply() {
        assert_eq!(norm("y=x(x+1)(x-2)"), "(y)=(x)*((x)+1)*((x)-2)");
    }

    #[test]
    fn scalars_and_constants_substitute() {
        let scalars = ScalarState {
            m: 5.0,
            n: -2.0,
            ..ScalarState::default()
        };
        assert_eq!(normalize_text("y=$m*x+$n", &scalars), "(y)=(5)*(x)+(-2)");
        assert_eq!(norm("y=2e"), format!("(y)=2*({})", core::f64::consts::E));
        assert_eq!(norm("y=pi"), format!("(y)=({})", core::f64::consts::PI));
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "y=2sin(x)+log(x)",
            "y = x(x + 1)(x - 2)",
            "x^2+y^2=4",
            "y=fact(x)/3(x)",
            "y=abs(x)+csc(x)",
        ] {
            let once = norm(raw);
            assert_eq!(norm(&once), once, "for input {raw:?}");
        }
    }

    #[test]
    fn splits_at_the_relation_sign() {
        let eq = normalize("y = x ^ 2", &ScalarState::default());
        assert_eq!(eq.lhs, "(y)");
        assert_eq!(eq.rhs, "(x) ^ 2");
    }
}
