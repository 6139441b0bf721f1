//! Lowers expression trees into chains of auxiliary variables and primitive
//! constraints. Constant right operands take specialised paths that avoid
//! materialising an extra variable; logical operators compile to four-row
//! truth tables over a fresh 0/1 result.

use crate::basic_types::RelOp;
use crate::compiler::CompileError;
use crate::compiler::Compiler;
use crate::engine::Domain;
use crate::engine::Propagator;
use crate::engine::VariableId;
use crate::model::ArithOp;
use crate::model::BinaryOp;
use crate::model::Expr;
use crate::model::LogicOp;
use crate::model::NaryOp;
use crate::model::UnaryOp;
use crate::propagators::AbsoluteValue;
use crate::propagators::Binary;
use crate::propagators::Division;
use crate::propagators::Linear;
use crate::propagators::LinearOp;
use crate::propagators::Maximum;
use crate::propagators::Minimum;
use crate::propagators::Modulo;
use crate::propagators::Multiplication;
use crate::propagators::Operand;
use crate::propagators::Power;
use crate::propagators::ReifiedBinary;
use crate::propagators::SumMod;
use crate::propagators::Table;

const TABLE_AND: [[i32; 3]; 4] = [[0, 0, 0], [0, 1, 0], [1, 0, 0], [1, 1, 1]];
const TABLE_OR: [[i32; 3]; 4] = [[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 1]];
const TABLE_XOR: [[i32; 3]; 4] = [[0, 0, 0], [0, 1, 1], [1, 0, 1], [1, 1, 0]];
const TABLE_IFF: [[i32; 3]; 4] = [[0, 0, 1], [0, 1, 0], [1, 0, 0], [1, 1, 1]];
const TABLE_IMPLIES: [[i32; 3]; 4] = [[0, 0, 1], [0, 1, 1], [1, 0, 0], [1, 1, 1]];

/// Widest value range an auxiliary variable may materialise. Domains are
/// stored as explicit value lists, so derived bounds wider than this (huge
/// powers, products of wide domains) are rejected during compilation.
const MAX_AUXILIARY_SPAN: i64 = 1 << 24;

impl Compiler {
    /// Compiles an expression tree to the variable carrying its value.
    pub(crate) fn compile_expr(&mut self, expression: &Expr) -> Result<VariableId, CompileError> {
        match expression {
            Expr::Variable(name) => self.lookup(name),
            Expr::Constant(value) => Ok(self.constant(*value)),
            Expr::Unary(op, operand) => {
                let operand = self.compile_expr(operand)?;
                Ok(match op {
                    UnaryOp::Negate => self.negated(operand)?,
                    UnaryOp::AbsoluteValue => self.absolute(operand)?,
                    UnaryOp::Square => self.product_pair(operand, operand)?,
                    UnaryOp::Not => self.logical_not(operand),
                })
            }
            Expr::Binary(BinaryOp::Rel(op), lhs, rhs) => {
                let lhs = self.compile_expr(lhs)?;
                let rhs = match rhs.as_ref() {
                    Expr::Constant(value) => Operand::Constant(*value),
                    other => Operand::Variable(self.compile_expr(other)?),
                };
                Ok(self.reified(lhs, *op, rhs))
            }
            Expr::Binary(BinaryOp::Arith(op), lhs, rhs) => {
                let lhs = self.compile_expr(lhs)?;
                match rhs.as_ref() {
                    Expr::Constant(value) => self.arithmetic_by_constant(lhs, *op, *value),
                    other => {
                        let rhs = self.compile_expr(other)?;
                        self.arithmetic_pair(lhs, *op, rhs)
                    }
                }
            }
            Expr::Binary(BinaryOp::Logic(op), lhs, rhs) => {
                let lhs = self.compile_expr(lhs)?;
                let rhs = self.compile_expr(rhs)?;
                Ok(self.logic_pair(lhs, *op, rhs))
            }
            Expr::Nary(op, operands) => {
                let compiled = self.compile_all(operands)?;
                let mut folded = *compiled.first().ok_or(CompileError::MismatchedLengths {
                    constraint: "n-ary expression",
                })?;
                for &next in &compiled[1..] {
                    folded = match op {
                        NaryOp::Sum => self.sum_pair(folded, next)?,
                        NaryOp::Product => self.product_pair(folded, next)?,
                        NaryOp::Maximum => self.maximum_variable(&[folded, next])?,
                        NaryOp::Minimum => self.minimum_variable(&[folded, next])?,
                    };
                }
                Ok(folded)
            }
        }
    }

    /// Posts that a boolean expression holds. Top-level comparisons narrow
    /// domains directly instead of going through a reified 0/1 variable.
    pub(crate) fn force_true(&mut self, expression: &Expr) -> Result<(), CompileError> {
        if let Expr::Binary(BinaryOp::Rel(op), lhs, rhs) = expression {
            let lhs = self.compile_expr(lhs)?;
            match rhs.as_ref() {
                Expr::Constant(value) => {
                    self.narrow_by_constant(lhs, *op, *value);
                }
                other => {
                    let rhs = self.compile_expr(other)?;
                    self.model.post(Box::new(Binary::new(lhs, rhs, *op)));
                }
            }
            return Ok(());
        }
        let result = self.compile_expr(expression)?;
        self.model.post_assign(result, 1);
        Ok(())
    }

    pub(crate) fn narrow_by_constant(&mut self, variable: VariableId, op: RelOp, value: i32) {
        match op {
            RelOp::Equal => self.model.post_assign(variable, value),
            RelOp::NotEqual => self.model.post_remove(variable, value),
            RelOp::LessOrEqual => self.model.post_remove_above(variable, value),
            RelOp::LessThan => self.model.post_remove_above(variable, value - 1),
            RelOp::GreaterOrEqual => self.model.post_remove_below(variable, value),
            RelOp::GreaterThan => self.model.post_remove_below(variable, value + 1),
        }
    }

    pub(crate) fn constant(&mut self, value: i32) -> VariableId {
        self.model.new_auxiliary(Domain::sparse([value]))
    }

    pub(crate) fn fresh_boolean(&mut self) -> VariableId {
        self.model.new_auxiliary(Domain::interval(0, 1))
    }

    pub(crate) fn auxiliary_interval(
        &mut self,
        lower: i64,
        upper: i64,
    ) -> Result<VariableId, CompileError> {
        if upper.saturating_sub(lower) > MAX_AUXILIARY_SPAN {
            return Err(CompileError::DomainTooWide { lower, upper });
        }
        let lower = lower.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        let upper = upper.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        Ok(self.model.new_auxiliary(Domain::interval(lower, upper)))
    }

    fn bounds(&self, variable: VariableId) -> (i64, i64) {
        let store = self.model.store();
        (
            i64::from(store.min(variable)),
            i64::from(store.max(variable)),
        )
    }

    pub(crate) fn negated(&mut self, variable: VariableId) -> Result<VariableId, CompileError> {
        let (lower, upper) = self.bounds(variable);
        let result = self.auxiliary_interval(-upper, -lower)?;
        self.model.post(Box::new(Linear::new(
            vec![(1, variable), (1, result)],
            0,
            LinearOp::Equal,
        )));
        Ok(result)
    }

    pub(crate) fn offset(
        &mut self,
        variable: VariableId,
        amount: i32,
    ) -> Result<VariableId, CompileError> {
        let (lower, upper) = self.bounds(variable);
        let amount64 = i64::from(amount);
        let result = self.auxiliary_interval(lower + amount64, upper + amount64)?;
        self.model.post(Box::new(Linear::new(
            vec![(1, result), (-1, variable)],
            amount,
            LinearOp::Equal,
        )));
        Ok(result)
    }

    fn scaled(&mut self, variable: VariableId, factor: i32) -> Result<VariableId, CompileError> {
        if factor == 0 {
            return Ok(self.constant(0));
        }
        let (lower, upper) = self.bounds(variable);
        let factor64 = i64::from(factor);
        let (a, b) = (factor64 * lower, factor64 * upper);
        let result = self.auxiliary_interval(a.min(b), a.max(b))?;
        self.model.post(Box::new(Linear::new(
            vec![(factor, variable), (-1, result)],
            0,
            LinearOp::Equal,
        )));
        Ok(result)
    }

    fn absolute(&mut self, variable: VariableId) -> Result<VariableId, CompileError> {
        let (lower, upper) = self.bounds(variable);
        let result = self.auxiliary_interval(0, lower.abs().max(upper.abs()))?;
        self.model
            .post(Box::new(AbsoluteValue::new(variable, result)));
        Ok(result)
    }

    fn logical_not(&mut self, variable: VariableId) -> VariableId {
        // The operand is treated as boolean.
        self.model.post_remove_below(variable, 0);
        self.model.post_remove_above(variable, 1);
        let result = self.fresh_boolean();
        self.model.post(Box::new(Linear::new(
            vec![(1, variable), (1, result)],
            1,
            LinearOp::Equal,
        )));
        result
    }

    pub(crate) fn sum_pair(
        &mut self,
        lhs: VariableId,
        rhs: VariableId,
    ) -> Result<VariableId, CompileError> {
        let (lhs_lower, lhs_upper) = self.bounds(lhs);
        let (rhs_lower, rhs_upper) = self.bounds(rhs);
        let result = self.auxiliary_interval(lhs_lower + rhs_lower, lhs_upper + rhs_upper)?;
        self.model.post(Box::new(Linear::new(
            vec![(1, lhs), (1, rhs), (-1, result)],
            0,
            LinearOp::Equal,
        )));
        Ok(result)
    }

    pub(crate) fn product_pair(
        &mut self,
        lhs: VariableId,
        rhs: VariableId,
    ) -> Result<VariableId, CompileError> {
        let (lhs_lower, lhs_upper) = self.bounds(lhs);
        let (rhs_lower, rhs_upper) = self.bounds(rhs);
        let corners = [
            lhs_lower * rhs_lower,
            lhs_lower * rhs_upper,
            lhs_upper * rhs_lower,
            lhs_upper * rhs_upper,
        ];
        let result = self.auxiliary_interval(
            corners.iter().copied().min().unwrap_or(0),
            corners.iter().copied().max().unwrap_or(0),
        )?;
        self.model
            .post(Box::new(Multiplication::new(lhs, rhs, result)));
        Ok(result)
    }

    fn arithmetic_by_constant(
        &mut self,
        lhs: VariableId,
        op: ArithOp,
        value: i32,
    ) -> Result<VariableId, CompileError> {
        Ok(match op {
            ArithOp::Add => self.offset(lhs, value)?,
            ArithOp::Subtract => self.offset(lhs, -value)?,
            ArithOp::Distance => {
                let shifted = self.offset(lhs, -value)?;
                self.absolute(shifted)?
            }
            ArithOp::Multiply => self.scaled(lhs, value)?,
            ArithOp::Divide => self.quotient_by_constant(lhs, value)?,
            ArithOp::Modulo => self.remainder_by_constant(lhs, value)?,
            ArithOp::Power => {
                let exponent = self.constant(value);
                self.power_pair(lhs, exponent)?
            }
        })
    }

    fn arithmetic_pair(
        &mut self,
        lhs: VariableId,
        op: ArithOp,
        rhs: VariableId,
    ) -> Result<VariableId, CompileError> {
        match op {
            ArithOp::Add => self.sum_pair(lhs, rhs),
            ArithOp::Subtract => {
                let negated = self.negated(rhs)?;
                self.sum_pair(lhs, negated)
            }
            ArithOp::Distance => {
                let negated = self.negated(rhs)?;
                let difference = self.sum_pair(lhs, negated)?;
                self.absolute(difference)
            }
            ArithOp::Multiply => self.product_pair(lhs, rhs),
            ArithOp::Divide => {
                self.ternary_arithmetic(lhs, rhs, |x, y, z| Box::new(Division::new(x, y, z)))
            }
            ArithOp::Modulo => {
                self.ternary_arithmetic(lhs, rhs, |x, y, z| Box::new(Modulo::new(x, y, z)))
            }
            ArithOp::Power => self.power_pair(lhs, rhs),
        }
    }

    fn ternary_arithmetic(
        &mut self,
        lhs: VariableId,
        rhs: VariableId,
        build: impl FnOnce(VariableId, VariableId, VariableId) -> Box<dyn Propagator>,
    ) -> Result<VariableId, CompileError> {
        let (lhs_lower, lhs_upper) = self.bounds(lhs);
        let magnitude = lhs_lower.abs().max(lhs_upper.abs());
        let result = self.auxiliary_interval(-magnitude, magnitude)?;
        self.model.post(build(lhs, rhs, result));
        Ok(result)
    }

    fn power_pair(
        &mut self,
        base: VariableId,
        exponent: VariableId,
    ) -> Result<VariableId, CompileError> {
        let (base_lower, base_upper) = self.bounds(base);
        let (_, exponent_upper) = self.bounds(exponent);
        let magnitude = base_lower
            .abs()
            .max(base_upper.abs())
            .saturating_pow(exponent_upper.clamp(0, 31) as u32);
        let result = self.auxiliary_interval(-magnitude, magnitude)?;
        self.model.post(Box::new(Power::new(base, exponent, result)));
        Ok(result)
    }

    /// Division by a constant: an auxiliary quotient tied back by
    /// `lhs = quotient * divisor`.
    fn quotient_by_constant(
        &mut self,
        lhs: VariableId,
        divisor: i32,
    ) -> Result<VariableId, CompileError> {
        if divisor == 0 {
            return Err(CompileError::DivisionByZero);
        }
        let (lower, upper) = self.bounds(lhs);
        let divisor64 = i64::from(divisor);
        let (a, b) = (lower / divisor64, upper / divisor64);
        let quotient = self.auxiliary_interval(a.min(b) - 1, a.max(b) + 1)?;
        self.model.post(Box::new(Linear::new(
            vec![(1, lhs), (-divisor, quotient)],
            0,
            LinearOp::Equal,
        )));
        Ok(quotient)
    }

    /// Modulo by a constant: a remainder in `[0, divisor)` such that
    /// `(lhs - remainder) mod divisor == 0`, via the weighted-sum-with-
    /// modulus primitive.
    fn remainder_by_constant(
        &mut self,
        lhs: VariableId,
        divisor: i32,
    ) -> Result<VariableId, CompileError> {
        if divisor == 0 {
            return Err(CompileError::DivisionByZero);
        }
        let divisor = divisor.abs();
        let remainder = self.auxiliary_interval(0, i64::from(divisor) - 1)?;
        self.model.post(Box::new(SumMod::new(
            vec![(1, lhs), (-1, remainder)],
            0,
            divisor,
        )));
        Ok(remainder)
    }

    pub(crate) fn reified(&mut self, lhs: VariableId, op: RelOp, rhs: Operand) -> VariableId {
        let result = self.fresh_boolean();
        self.model
            .post(Box::new(ReifiedBinary::new(result, lhs, rhs, op)));
        result
    }

    fn logic_pair(&mut self, lhs: VariableId, op: LogicOp, rhs: VariableId) -> VariableId {
        let table = match op {
            LogicOp::And => TABLE_AND,
            LogicOp::Or => TABLE_OR,
            LogicOp::Xor => TABLE_XOR,
            LogicOp::Iff => TABLE_IFF,
            LogicOp::Implies => TABLE_IMPLIES,
        };
        let result = self.fresh_boolean();
        let tuples = table.iter().map(|row| row.to_vec()).collect();
        self.model
            .post(Box::new(Table::new(vec![lhs, rhs, result], tuples)));
        result
    }

    pub(crate) fn maximum_variable(
        &mut self,
        variables: &[VariableId],
    ) -> Result<VariableId, CompileError> {
        let lower = variables
            .iter()
            .map(|&variable| self.bounds(variable).0)
            .max()
            .unwrap_or(0);
        let upper = variables
            .iter()
            .map(|&variable| self.bounds(variable).1)
            .max()
            .unwrap_or(0);
        let result = self.auxiliary_interval(lower, upper)?;
        self.model
            .post(Box::new(Maximum::new(variables.to_vec(), result)));
        Ok(result)
    }

    pub(crate) fn minimum_variable(
        &mut self,
        variables: &[VariableId],
    ) -> Result<VariableId, CompileError> {
        let lower = variables
            .iter()
            .map(|&variable| self.bounds(variable).0)
            .min()
            .unwrap_or(0);
        let upper = variables
            .iter()
            .map(|&variable| self.bounds(variable).1)
            .min()
            .unwrap_or(0);
        let result = self.auxiliary_interval(lower, upper)?;
        self.model
            .post(Box::new(Minimum::new(variables.to_vec(), result)));
        Ok(result)
    }
}
