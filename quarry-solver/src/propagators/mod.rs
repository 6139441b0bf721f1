//! Propagators for the primitive constraints the compiler targets. Each one
//! is stateless between invocations and filters from the current domains
//! only, so they compose with snapshot-based backtracking without undo
//! hooks.

mod all_different;
mod among;
mod arithmetic;
mod bin_packing;
mod circuit;
mod clause;
mod element;
mod inverse;
mod lex;
mod linear;
mod regular;
mod rel;
mod scheduling;
mod sum_mod;
mod table;

pub use all_different::AllDifferent;
pub use among::Among;
pub use arithmetic::AbsoluteValue;
pub use arithmetic::Division;
pub use arithmetic::Maximum;
pub use arithmetic::Minimum;
pub use arithmetic::Modulo;
pub use arithmetic::Multiplication;
pub use arithmetic::Power;
pub use bin_packing::BinPacking;
pub use circuit::Circuit;
pub use clause::Clause;
pub use element::ElementConstArray;
pub use element::ElementConstMatrix;
pub use element::ElementVar;
pub use inverse::Inverse;
pub use lex::LexLessOrEqual;
pub use linear::Linear;
pub use linear::LinearOp;
pub use regular::Regular;
pub use rel::Binary;
pub use rel::Operand;
pub use rel::ReifiedBinary;
pub use scheduling::Cumulative;
pub use scheduling::Disjunctive;
pub use sum_mod::SumMod;
pub use table::NegativeTable;
pub use table::Table;

fn floor_div(numerator: i64, divisor: i64) -> i64 {
    let quotient = numerator / divisor;
    if numerator % divisor != 0 && (numerator < 0) != (divisor < 0) {
        quotient - 1
    } else {
        quotient
    }
}

fn ceil_div(numerator: i64, divisor: i64) -> i64 {
    let quotient = numerator / divisor;
    if numerator % divisor != 0 && (numerator < 0) == (divisor < 0) {
        quotient + 1
    } else {
        quotient
    }
}

fn clamp_to_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::ceil_div;
    use super::floor_div;

    #[test]
    fn rounding_matches_real_division() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(-7, -2), 4);
    }
}
