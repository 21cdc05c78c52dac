// SPDX: CC0-1.0

use crate::{
    eval::{DomainError, Fun},
    Axis, Number,
};
use core::f64::consts;

/// What an identifier resolves to in the closed vocabulary.
#[derive(Clone, Copy, Debug)]
pub enum Entry {
    Var(Axis),
    Const(Number),
    Fun(&'static str, Fun),
}

/// Every name the vocabulary knows, for near-miss suggestions.
pub const NAMES: &[&str] = &[
    "x",
    "y",
    "pi",
    "tau",
    "e",
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
    "abs",
];

/// Resolve an identifier. This is the entire name space an expression can
/// reach; anything else is an undefined name.
pub fn lookup(name: &str) -> Option<Entry> {
    let entry = match name {
        "x" => Entry::Var(Axis::X),
        "y" => Entry::Var(Axis::Y),

        "pi" => Entry::Const(consts::PI),
        "tau" => Entry::Const(consts::TAU),
        "e" => Entry::Const(consts::E),

        "sin" => Entry::Fun("sin", Fun::new(1, sin)),
        "cos" => Entry::Fun("cos", Fun::new(1, cos)),
        "tan" => Entry::Fun("tan", Fun::new(1, tan)),
        "asin" => Entry::Fun("asin", Fun::new(1, arcsin)),
        "acos" => Entry::Fun("acos", Fun::new(1, arccos)),
        "atan" => Entry::Fun("atan", Fun::new(1, arctan)),
        "sqrt" => Entry::Fun("sqrt", Fun::new(1, sqrt)),
        "log" => Entry::Fun("log", Fun::new(1, ln)),
        "log10" => Entry::Fun("log10", Fun::new(1, log10)),
        "gamma" => Entry::Fun("gamma", Fun::new(1, gamma)),
        "gamma_shift" => Entry::Fun("gamma_shift", Fun::new(1, gamma_shift)),
        "fabs" | "abs" => Entry::Fun("fabs", Fun::new(1, abs)),

        _ => return None,
    };
    Some(entry)
}

#[track_caller]
fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    assert_eq!(args.len(), N);
    args[..N].try_into().unwrap()
}

pub fn neg(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(-x)
}

pub fn add(args: &[Number]) -> Result<Number, DomainError> {
    let [x, y] = expect_n::<2>(args);
    Ok(x + y)
}

pub fn sub(args: &[Number]) -> Result<Number, DomainError> {
    let [x, y] = expect_n::<2>(args);
    Ok(x - y)
}

pub fn mul(args: &[Number]) -> Result<Number, DomainError> {
    let [x, y] = expect_n::<2>(args);
    Ok(x * y)
}

pub fn div(args: &[Number]) -> Result<Number, DomainError> {
    let [x, y] = expect_n::<2>(args);
    if y == 0.0 {
        return Err(DomainError::DivisionByZero);
    }
    Ok(x / y)
}

pub fn pow(args: &[Number]) -> Result<Number, DomainError> {
    let [x, e] = expect_n::<2>(args);
    if x == 0.0 && e < 0.0 {
        return Err(DomainError::DivisionByZero);
    }
    Ok(x.powf(e))
}

pub fn abs(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(x.abs())
}

pub fn sqrt(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if x < 0.0 {
        return Err(DomainError::OutOfDomain);
    }
    Ok(x.sqrt())
}

pub fn ln(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        return Err(DomainError::OutOfDomain);
    }
    Ok(x.ln())
}

pub fn log10(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        return Err(DomainError::OutOfDomain);
    }
    Ok(x.log10())
}

pub fn sin(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(x.sin())
}

pub fn cos(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(x.cos())
}

pub fn tan(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(x.tan())
}

pub fn arcsin(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if !(-1.0..=1.0).contains(&x) {
        return Err(DomainError::OutOfDomain);
    }
    Ok(x.asin())
}

pub fn arccos(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if !(-1.0..=1.0).contains(&x) {
        return Err(DomainError::OutOfDomain);
    }
    Ok(x.acos())
}

pub fn arctan(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    Ok(x.atan())
}

/// The gamma function has poles at zero and the negative integers.
pub fn gamma(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 && x.fract() == 0.0 {
        return Err(DomainError::OutOfDomain);
    }
    let val = libm::tgamma(x);
    if val.is_nan() {
        return Err(DomainError::OutOfDomain);
    }
    if val.is_infinite() {
        return Err(DomainError::Overflow);
    }
    Ok(val)
}

/// The factorial function: gamma shifted left by one, `Γ(x + 1)`.
pub fn gamma_shift(args: &[Number]) -> Result<Number, DomainError> {
    let [x] = expect_n::<1>(args);
    gamma(&[x + 1.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_shift_is_factorial() {
        assert_eq!(gamma_shift(&[0.0]).unwrap(), 1.0);
        assert!((gamma_shift(&[4.0]).unwrap() - 24.0).abs() < 1e-9);
        assert!((gamma_shift(&[5.0]).unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn gamma_rejects_poles() {
        assert_eq!(gamma(&[0.0]), Err(DomainError::OutOfDomain));
        assert_eq!(gamma(&[-3.0]), Err(DomainError::OutOfDomain));
        assert!(gamma(&[-2.5]).is_ok());
    }

    #[test]
    fn domain_edges() {
        assert_eq!(sqrt(&[-1.0]), Err(DomainError::OutOfDomain));
        assert_eq!(ln(&[0.0]), Err(DomainError::OutOfDomain));
        assert_eq!(arcsin(&[1.5]), Err(DomainError::OutOfDomain));
        assert_eq!(div(&[1.0, 0.0]), Err(DomainError::DivisionByZero));
        assert_eq!(pow(&[0.0, -1.0]), Err(DomainError::DivisionByZero));
        assert!(arcsin(&[1.0]).is_ok());
        assert!(sqrt(&[0.0]).is_ok());
    }

    #[test]
    fn overflow_classification() {
        assert_eq!(gamma(&[200.0]), Err(DomainError::Overflow));
    }
}
