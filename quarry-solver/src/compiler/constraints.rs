//! Translates global constraint declarations into primitive propagator
//! postings. Encodings follow the declaration-by-declaration dispatch of
//! the instance walk; every posting is guarded by the model's sticky
//! failure flag.

use fnv::FnvHashMap;

use crate::basic_types::RelOp;
use crate::compiler::CompileError;
use crate::compiler::Compiler;
use crate::engine::Domain;
use crate::engine::VariableId;
use crate::model::BinPackingSpec;
use crate::model::Condition;
use crate::model::ConstraintDecl;
use crate::model::Coefficients;
use crate::model::ElementArray;
use crate::model::Expr;
use crate::model::IndexSpec;
use crate::model::Occurrences;
use crate::model::Rank;
use crate::propagators::AllDifferent;
use crate::propagators::Among;
use crate::propagators::BinPacking;
use crate::propagators::Binary;
use crate::propagators::Circuit;
use crate::propagators::Clause;
use crate::propagators::Cumulative;
use crate::propagators::Disjunctive;
use crate::propagators::ElementConstArray;
use crate::propagators::ElementConstMatrix;
use crate::propagators::ElementVar;
use crate::propagators::Inverse;
use crate::propagators::LexLessOrEqual;
use crate::propagators::Linear;
use crate::propagators::LinearOp;
use crate::propagators::Maximum;
use crate::propagators::Minimum;
use crate::propagators::NegativeTable;
use crate::propagators::Operand;
use crate::propagators::Regular;
use crate::propagators::Table;

impl Compiler {
    pub(crate) fn translate_constraint(
        &mut self,
        constraint: &ConstraintDecl,
    ) -> Result<(), CompileError> {
        if self.model.is_failed() {
            return Ok(());
        }
        match constraint {
            ConstraintDecl::Intension(expression) => self.force_true(expression),
            ConstraintDecl::Extension {
                variables,
                tuples,
                positive,
            } => {
                let variables = self.lookup_all(variables)?;
                if *positive {
                    self.model
                        .post(Box::new(Table::new(variables, tuples.clone())));
                } else {
                    self.model
                        .post(Box::new(NegativeTable::new(variables, tuples.clone())));
                }
                Ok(())
            }
            ConstraintDecl::Sum {
                terms,
                coefficients,
                condition,
            } => self.translate_sum(terms, coefficients.as_ref(), condition),
            ConstraintDecl::AllDifferent(terms) => {
                let variables = self.compile_all(terms)?;
                self.model.post(Box::new(AllDifferent::new(variables)));
                Ok(())
            }
            ConstraintDecl::AllDifferentMatrix(matrix) => self.translate_all_different_matrix(matrix),
            ConstraintDecl::AllEqual(names) => {
                let variables = self.lookup_all(names)?;
                for pair in variables.windows(2) {
                    self.model
                        .post(Box::new(Binary::new(pair[0], pair[1], RelOp::Equal)));
                }
                Ok(())
            }
            ConstraintDecl::Ordered {
                variables,
                lengths,
                op,
            } => self.translate_ordered(variables, lengths.as_deref(), *op),
            ConstraintDecl::Lex { lists, op } => self.translate_lex(lists, *op),
            ConstraintDecl::LexMatrix { matrix, op } => {
                self.translate_lex(matrix, *op)?;
                let transposed = transpose(matrix);
                self.translate_lex(&transposed, *op)
            }
            ConstraintDecl::Precedence {
                variables,
                values,
                covered,
            } => self.translate_precedence(variables, values.as_deref(), *covered),
            ConstraintDecl::Element {
                array,
                index,
                condition,
            } => self.translate_element(array, index.as_ref(), condition),
            ConstraintDecl::ElementMatrix {
                matrix,
                row,
                column,
                condition,
            } => self.translate_element_matrix(matrix, row, column, condition),
            ConstraintDecl::Count {
                variables,
                values,
                condition,
            } => self.translate_count(variables, values, condition),
            ConstraintDecl::Cardinality {
                variables,
                values,
                occurrences,
                closed,
            } => self.translate_cardinality(variables, values, occurrences, *closed),
            ConstraintDecl::Regular {
                variables,
                transitions,
                start,
                finals,
            } => self.translate_regular(variables, transitions, start, finals),
            ConstraintDecl::Circuit {
                variables,
                start_index,
            } => {
                let successors = self.shifted_all(variables, *start_index)?;
                self.model
                    .post(Box::new(AllDifferent::new(successors.clone())));
                self.model.post(Box::new(Circuit::new(successors)));
                Ok(())
            }
            ConstraintDecl::BinPacking { bins, sizes, spec } => {
                self.translate_bin_packing(bins, sizes, spec)
            }
            ConstraintDecl::Knapsack {
                variables,
                weights,
                profits,
                weight_condition,
                profit_condition,
            } => self.translate_knapsack(
                variables,
                weights,
                profits,
                weight_condition,
                profit_condition,
            ),
            ConstraintDecl::NoOverlap {
                starts,
                lengths,
                zero_ignored,
            } => {
                if !zero_ignored {
                    return Err(CompileError::ZeroLengthsNotIgnored);
                }
                let starts = self.lookup_all(starts)?;
                if starts.len() != lengths.len() {
                    return Err(CompileError::MismatchedLengths {
                        constraint: "no-overlap",
                    });
                }
                let (starts, lengths): (Vec<_>, Vec<_>) = starts
                    .into_iter()
                    .zip(lengths.iter().copied())
                    .filter(|&(_, length)| length != 0)
                    .unzip();
                self.model.post(Box::new(Disjunctive::new(starts, lengths)));
                Ok(())
            }
            ConstraintDecl::Cumulative {
                starts,
                lengths,
                heights,
                condition,
            } => {
                let Condition::Value(RelOp::LessOrEqual, capacity) = condition else {
                    return Err(CompileError::UnsupportedCondition {
                        constraint: "cumulative",
                    });
                };
                let starts = self.lookup_all(starts)?;
                if starts.len() != lengths.len() || starts.len() != heights.len() {
                    return Err(CompileError::MismatchedLengths {
                        constraint: "cumulative",
                    });
                }
                self.model.post(Box::new(Cumulative::new(
                    starts,
                    lengths.clone(),
                    heights.clone(),
                    *capacity,
                )));
                Ok(())
            }
            ConstraintDecl::Clause { positive, negative } => {
                let mut literals = Vec::new();
                for name in positive {
                    let variable = self.boolean(name)?;
                    literals.push((variable, true));
                }
                for name in negative {
                    let variable = self.boolean(name)?;
                    literals.push((variable, false));
                }
                self.model.post(Box::new(Clause::new(literals)));
                Ok(())
            }
            ConstraintDecl::Maximum { terms, condition } => {
                let variables = self.compile_all(terms)?;
                let (lower, upper) = self.alphabet_bounds(&variables);
                let target = self.condition_target(condition, i64::from(lower), i64::from(upper))?;
                self.model.post(Box::new(Maximum::new(variables, target)));
                Ok(())
            }
            ConstraintDecl::Minimum { terms, condition } => {
                let variables = self.compile_all(terms)?;
                let (lower, upper) = self.alphabet_bounds(&variables);
                let target = self.condition_target(condition, i64::from(lower), i64::from(upper))?;
                self.model.post(Box::new(Minimum::new(variables, target)));
                Ok(())
            }
            ConstraintDecl::ChannelSelf { list, start_index } => {
                let variables = self.shifted_all(list, *start_index)?;
                self.model
                    .post(Box::new(Inverse::new(variables.clone(), variables)));
                Ok(())
            }
            ConstraintDecl::ChannelPair {
                first,
                first_start,
                second,
                second_start,
            } => {
                if first_start != second_start {
                    return Err(CompileError::MismatchedStartIndices);
                }
                if first.len() != second.len() {
                    return Err(CompileError::MismatchedLengths {
                        constraint: "channel",
                    });
                }
                let first = self.shifted_all(first, *first_start)?;
                let second = self.shifted_all(second, *second_start)?;
                self.model.post(Box::new(Inverse::new(first, second)));
                Ok(())
            }
            ConstraintDecl::ChannelValue {
                list,
                start_index,
                value,
            } => {
                let mut cells = Vec::new();
                for name in list {
                    cells.push(self.boolean(name)?);
                }
                let value = self.lookup(value)?;
                let index = if *start_index == 0 {
                    value
                } else {
                    self.offset(value, -start_index)?
                };
                let one = self.constant(1);
                self.model
                    .post(Box::new(ElementVar::new(cells.clone(), index, one)));
                let terms = cells.into_iter().map(|cell| (1, cell)).collect();
                self.model
                    .post(Box::new(Linear::new(terms, 1, LinearOp::Equal)));
                Ok(())
            }
            ConstraintDecl::Instantiation { variables, values } => {
                let variables = self.lookup_all(variables)?;
                if variables.len() != values.len() {
                    return Err(CompileError::MismatchedLengths {
                        constraint: "instantiation",
                    });
                }
                for (&variable, &value) in variables.iter().zip(values) {
                    self.model.post_assign(variable, value);
                }
                Ok(())
            }
        }
    }

    /// A variable used as a boolean: its domain is narrowed to 0/1.
    fn boolean(&mut self, name: &str) -> Result<VariableId, CompileError> {
        let variable = self.lookup(name)?;
        self.model.post_remove_below(variable, 0);
        self.model.post_remove_above(variable, 1);
        Ok(variable)
    }

    fn shifted_all(
        &mut self,
        names: &[String],
        start_index: i32,
    ) -> Result<Vec<VariableId>, CompileError> {
        let variables = self.lookup_all(names)?;
        if start_index == 0 {
            return Ok(variables);
        }
        let mut shifted = Vec::with_capacity(variables.len());
        for variable in variables {
            shifted.push(self.offset(variable, -start_index)?);
        }
        Ok(shifted)
    }

    /// Applies a condition to an existing variable.
    fn condition_on(
        &mut self,
        variable: VariableId,
        condition: &Condition,
    ) -> Result<(), CompileError> {
        match condition {
            Condition::Value(op, value) => {
                self.narrow_by_constant(variable, *op, *value);
                Ok(())
            }
            Condition::Variable(op, name) => {
                let other = self.lookup(name)?;
                self.model.post(Box::new(Binary::new(variable, other, *op)));
                Ok(())
            }
            Condition::In { min, max } => {
                self.model.post_remove_below(variable, *min);
                self.model.post_remove_above(variable, *max);
                Ok(())
            }
            Condition::NotIn { min, max } => {
                let below = self.reified(variable, RelOp::LessThan, Operand::Constant(*min));
                let above = self.reified(variable, RelOp::GreaterThan, Operand::Constant(*max));
                self.model
                    .post(Box::new(Clause::new(vec![(below, true), (above, true)])));
                Ok(())
            }
        }
    }

    /// The variable a condition constrains a synthesised result against: an
    /// equality against a variable or constant is used directly, anything
    /// else goes through an auxiliary variable spanning the given bounds.
    fn condition_target(
        &mut self,
        condition: &Condition,
        lower: i64,
        upper: i64,
    ) -> Result<VariableId, CompileError> {
        match condition {
            Condition::Variable(RelOp::Equal, name) => self.lookup(name),
            Condition::Value(RelOp::Equal, value) => Ok(self.constant(*value)),
            other => {
                let target = self.auxiliary_interval(lower, upper)?;
                self.condition_on(target, other)?;
                Ok(target)
            }
        }
    }

    fn translate_sum(
        &mut self,
        terms: &[Expr],
        coefficients: Option<&Coefficients>,
        condition: &Condition,
    ) -> Result<(), CompileError> {
        let variables = self.compile_all(terms)?;
        let weighted: Vec<(i32, VariableId)> = match coefficients {
            None => variables.into_iter().map(|variable| (1, variable)).collect(),
            Some(Coefficients::Constants(weights)) => {
                if weights.len() != variables.len() {
                    return Err(CompileError::MismatchedLengths { constraint: "sum" });
                }
                weights.iter().copied().zip(variables).collect()
            }
            Some(Coefficients::Variables(names)) => {
                if names.len() != variables.len() {
                    return Err(CompileError::MismatchedLengths { constraint: "sum" });
                }
                let factors = self.lookup_all(names)?;
                let mut weighted = Vec::with_capacity(variables.len());
                for (variable, factor) in variables.into_iter().zip(factors) {
                    weighted.push((1, self.product_pair(variable, factor)?));
                }
                weighted
            }
        };
        match condition {
            // An equality against a variable is fused into the sum instead
            // of materialising an intermediate sum variable.
            Condition::Variable(RelOp::Equal, name) => {
                let target = self.lookup(name)?;
                let mut terms = weighted;
                terms.push((-1, target));
                self.model
                    .post(Box::new(Linear::new(terms, 0, LinearOp::Equal)));
                Ok(())
            }
            Condition::Value(op, value) => {
                self.post_linear(weighted, *op, *value);
                Ok(())
            }
            other => {
                let (weights, variables): (Vec<i32>, Vec<VariableId>) =
                    weighted.into_iter().unzip();
                let sum = self.weighted_sum_variable(&weights, &variables)?;
                self.condition_on(sum, other)
            }
        }
    }

    /// Posts `sum(terms) op value` for any relational operator, normalising
    /// strict and flipped comparisons onto the linear primitive.
    fn post_linear(&mut self, terms: Vec<(i32, VariableId)>, op: RelOp, value: i32) {
        match op {
            RelOp::Equal => self
                .model
                .post(Box::new(Linear::new(terms, value, LinearOp::Equal))),
            RelOp::NotEqual => self
                .model
                .post(Box::new(Linear::new(terms, value, LinearOp::NotEqual))),
            RelOp::LessOrEqual => self
                .model
                .post(Box::new(Linear::new(terms, value, LinearOp::LessOrEqual))),
            RelOp::LessThan => self.model.post(Box::new(Linear::new(
                terms,
                value.saturating_sub(1),
                LinearOp::LessOrEqual,
            ))),
            RelOp::GreaterOrEqual => {
                let negated = negate_terms(terms);
                self.model.post(Box::new(Linear::new(
                    negated,
                    value.saturating_neg(),
                    LinearOp::LessOrEqual,
                )));
            }
            RelOp::GreaterThan => {
                let negated = negate_terms(terms);
                self.model.post(Box::new(Linear::new(
                    negated,
                    value.saturating_add(1).saturating_neg(),
                    LinearOp::LessOrEqual,
                )));
            }
        }
    }

    fn translate_all_different_matrix(
        &mut self,
        matrix: &[Vec<String>],
    ) -> Result<(), CompileError> {
        ensure_rectangular(matrix, "all-different")?;
        for row in matrix {
            let variables = self.lookup_all(row)?;
            self.model.post(Box::new(AllDifferent::new(variables)));
        }
        for column in transpose(matrix) {
            let variables = self.lookup_all(&column)?;
            self.model.post(Box::new(AllDifferent::new(variables)));
        }
        Ok(())
    }

    fn translate_ordered(
        &mut self,
        names: &[String],
        lengths: Option<&[i32]>,
        op: RelOp,
    ) -> Result<(), CompileError> {
        if matches!(op, RelOp::Equal | RelOp::NotEqual) {
            return Err(CompileError::UnsupportedOperator {
                constraint: "ordered",
            });
        }
        let variables = self.lookup_all(names)?;
        if let Some(lengths) = lengths {
            if lengths.len() + 1 != variables.len() {
                return Err(CompileError::MismatchedLengths {
                    constraint: "ordered",
                });
            }
        }
        for (position, pair) in variables.windows(2).enumerate() {
            let separation = lengths.map_or(0, |lengths| lengths[position]);
            // x + separation op y, expressed as a two-term linear constraint.
            self.post_linear(vec![(1, pair[0]), (-1, pair[1])], op, -separation);
        }
        Ok(())
    }

    fn translate_lex(&mut self, lists: &[Vec<String>], op: RelOp) -> Result<(), CompileError> {
        if matches!(op, RelOp::Equal | RelOp::NotEqual) {
            return Err(CompileError::UnsupportedOperator { constraint: "lex" });
        }
        let strict = matches!(op, RelOp::LessThan | RelOp::GreaterThan);
        let flipped = matches!(op, RelOp::GreaterThan | RelOp::GreaterOrEqual);
        for pair in lists.windows(2) {
            if pair[0].len() != pair[1].len() {
                return Err(CompileError::MismatchedLengths { constraint: "lex" });
            }
            let first = self.lookup_all(&pair[0])?;
            let second = self.lookup_all(&pair[1])?;
            let (xs, ys) = if flipped {
                (second, first)
            } else {
                (first, second)
            };
            self.model
                .post(Box::new(LexLessOrEqual::new(xs, ys, strict)));
        }
        Ok(())
    }

    /// Precedence as an automaton over value occurrence order: state `i`
    /// means the first `i` listed values have each occurred, a later listed
    /// value may not appear before its predecessors.
    fn translate_precedence(
        &mut self,
        names: &[String],
        values: Option<&[i32]>,
        covered: bool,
    ) -> Result<(), CompileError> {
        let variables = self.lookup_all(names)?;
        let collected;
        let values = match values {
            Some(values) => values,
            None => {
                let mut union: Vec<i32> = Vec::new();
                for &variable in &variables {
                    union.extend(self.model.store().domain(variable).iter());
                }
                union.sort_unstable();
                union.dedup();
                collected = union;
                &collected
            }
        };
        let (min_value, max_value) = self.alphabet_bounds(&variables);

        let num_states = values.len() + 1;
        let mut transitions = Vec::new();
        for state in 0..num_states {
            for symbol in min_value..=max_value {
                let position = values.iter().position(|&value| value == symbol);
                let target = match position {
                    Some(position) if position == state => Some(state + 1),
                    Some(position) if position > state => None,
                    _ => Some(state),
                };
                if let Some(target) = target {
                    transitions.push((state, symbol, target));
                }
            }
        }
        let finals: Vec<usize> = if covered {
            vec![values.len()]
        } else {
            (0..num_states).collect()
        };
        self.model.post(Box::new(Regular::new(
            variables,
            num_states,
            &transitions,
            0,
            &finals,
            min_value,
            max_value,
        )));
        Ok(())
    }

    fn alphabet_bounds(&self, variables: &[VariableId]) -> (i32, i32) {
        let store = self.model.store();
        let min_value = variables
            .iter()
            .map(|&variable| store.min(variable))
            .min()
            .unwrap_or(0);
        let max_value = variables
            .iter()
            .map(|&variable| store.max(variable))
            .max()
            .unwrap_or(0);
        (min_value, max_value)
    }

    fn translate_element(
        &mut self,
        array: &ElementArray,
        index: Option<&IndexSpec>,
        condition: &Condition,
    ) -> Result<(), CompileError> {
        match index {
            Some(index) => {
                if index.rank != Rank::Any {
                    return Err(CompileError::UnsupportedRank);
                }
                let index_variable = self.lookup(&index.variable)?;
                let shifted = if index.start_index == 0 {
                    index_variable
                } else {
                    self.offset(index_variable, -index.start_index)?
                };
                match array {
                    ElementArray::Variables(names) => {
                        let cells = self.lookup_all(names)?;
                        let (lower, upper) = self.alphabet_bounds(&cells);
                        let target =
                            self.condition_target(condition, i64::from(lower), i64::from(upper))?;
                        self.model
                            .post(Box::new(ElementVar::new(cells, shifted, target)));
                    }
                    ElementArray::Constants(values) => {
                        let lower = values.iter().copied().min().unwrap_or(0);
                        let upper = values.iter().copied().max().unwrap_or(0);
                        let target =
                            self.condition_target(condition, i64::from(lower), i64::from(upper))?;
                        self.model.post(Box::new(ElementConstArray::new(
                            values.clone(),
                            shifted,
                            target,
                        )));
                    }
                }
                Ok(())
            }
            None => match (array, condition) {
                // Membership: the value occurs somewhere in the list.
                (ElementArray::Variables(names), Condition::Value(RelOp::Equal, value)) => {
                    let variables = self.lookup_all(names)?;
                    let occurrences = self
                        .model
                        .new_auxiliary(Domain::interval(1, variables.len() as i32));
                    self.model
                        .post(Box::new(Among::new(variables, [*value], occurrences)));
                    Ok(())
                }
                (array, condition) => {
                    let length = match array {
                        ElementArray::Variables(names) => names.len(),
                        ElementArray::Constants(values) => values.len(),
                    };
                    let free_index = self
                        .model
                        .new_auxiliary(Domain::interval(0, length as i32 - 1));
                    match array {
                        ElementArray::Variables(names) => {
                            let cells = self.lookup_all(names)?;
                            let (lower, upper) = self.alphabet_bounds(&cells);
                            let target = self.condition_target(
                                condition,
                                i64::from(lower),
                                i64::from(upper),
                            )?;
                            self.model
                                .post(Box::new(ElementVar::new(cells, free_index, target)));
                        }
                        ElementArray::Constants(values) => {
                            let lower = values.iter().copied().min().unwrap_or(0);
                            let upper = values.iter().copied().max().unwrap_or(0);
                            let target = self.condition_target(
                                condition,
                                i64::from(lower),
                                i64::from(upper),
                            )?;
                            self.model.post(Box::new(ElementConstArray::new(
                                values.clone(),
                                free_index,
                                target,
                            )));
                        }
                    }
                    Ok(())
                }
            },
        }
    }

    fn translate_element_matrix(
        &mut self,
        matrix: &[Vec<i32>],
        row: &IndexSpec,
        column: &IndexSpec,
        condition: &Condition,
    ) -> Result<(), CompileError> {
        if row.rank != Rank::Any || column.rank != Rank::Any {
            return Err(CompileError::UnsupportedRank);
        }
        ensure_rectangular(matrix, "element")?;
        let row_variable = self.lookup(&row.variable)?;
        let row_index = if row.start_index == 0 {
            row_variable
        } else {
            self.offset(row_variable, -row.start_index)?
        };
        let column_variable = self.lookup(&column.variable)?;
        let column_index = if column.start_index == 0 {
            column_variable
        } else {
            self.offset(column_variable, -column.start_index)?
        };
        let entries = matrix.iter().flatten().copied();
        let lower = entries.clone().min().unwrap_or(0);
        let upper = entries.max().unwrap_or(0);
        let target = self.condition_target(condition, i64::from(lower), i64::from(upper))?;
        self.model.post(Box::new(ElementConstMatrix::new(
            matrix.to_vec(),
            row_index,
            column_index,
            target,
        )));
        Ok(())
    }

    fn translate_count(
        &mut self,
        names: &[String],
        values: &[i32],
        condition: &Condition,
    ) -> Result<(), CompileError> {
        let variables = self.lookup_all(names)?;
        let count = variables.len() as i32;
        let occurrences = match condition {
            // Constant comparisons dispatch to the tightest occurrence
            // domain (exactly / at-least / at-most)...
            Condition::Value(RelOp::Equal, target) => self.model.new_auxiliary(Domain::sparse([*target])),
            Condition::Value(RelOp::GreaterOrEqual, target) => {
                self.model.new_auxiliary(Domain::interval(*target, count))
            }
            Condition::Value(RelOp::GreaterThan, target) => self
                .model
                .new_auxiliary(Domain::interval(*target + 1, count)),
            Condition::Value(RelOp::LessOrEqual, target) => {
                self.model.new_auxiliary(Domain::interval(0, *target))
            }
            Condition::Value(RelOp::LessThan, target) => self
                .model
                .new_auxiliary(Domain::interval(0, *target - 1)),
            // ...except not-equal, which removes the forbidden count from
            // the auxiliary occurrence variable.
            Condition::Value(RelOp::NotEqual, target) => {
                let domain = Domain::sparse((0..=count).filter(|value| value != target));
                self.model.new_auxiliary(domain)
            }
            Condition::In { min, max } => self
                .model
                .new_auxiliary(Domain::interval((*min).max(0), (*max).min(count))),
            other => {
                let occurrences = self.model.new_auxiliary(Domain::interval(0, count));
                self.condition_on(occurrences, other)?;
                occurrences
            }
        };
        self.model.post(Box::new(Among::new(
            variables,
            values.iter().copied(),
            occurrences,
        )));
        Ok(())
    }

    fn translate_cardinality(
        &mut self,
        names: &[String],
        values: &[i32],
        occurrences: &Occurrences,
        closed: bool,
    ) -> Result<(), CompileError> {
        if closed {
            return Err(CompileError::ClosedCardinality);
        }
        let variables = self.lookup_all(names)?;
        let count = variables.len() as i32;
        for (position, &value) in values.iter().enumerate() {
            let occurrence = match occurrences {
                Occurrences::Constants(counts) => {
                    let &target = counts.get(position).ok_or(CompileError::MismatchedLengths {
                        constraint: "cardinality",
                    })?;
                    self.model.new_auxiliary(Domain::sparse([target]))
                }
                Occurrences::Variables(names) => {
                    let name = names.get(position).ok_or(CompileError::MismatchedLengths {
                        constraint: "cardinality",
                    })?;
                    self.lookup(name)?
                }
                Occurrences::Intervals(intervals) => {
                    let &(lower, upper) =
                        intervals
                            .get(position)
                            .ok_or(CompileError::MismatchedLengths {
                                constraint: "cardinality",
                            })?;
                    self.model
                        .new_auxiliary(Domain::interval(lower.max(0), upper.min(count)))
                }
            };
            self.model.post(Box::new(Among::new(
                variables.clone(),
                [value],
                occurrence,
            )));
        }
        Ok(())
    }

    /// States are registered lazily in the order the transition table
    /// mentions them; transition values outside the variables' alphabet are
    /// unreachable and dropped.
    fn translate_regular(
        &mut self,
        names: &[String],
        transitions: &[(String, i32, String)],
        start: &str,
        finals: &[String],
    ) -> Result<(), CompileError> {
        let variables = self.lookup_all(names)?;
        let (min_value, max_value) = self.alphabet_bounds(&variables);

        let mut states: FnvHashMap<String, usize> = FnvHashMap::default();
        let mut register = |states: &mut FnvHashMap<String, usize>, name: &str| {
            let next = states.len();
            *states.entry(name.to_owned()).or_insert(next)
        };
        let triples: Vec<(usize, i32, usize)> = transitions
            .iter()
            .map(|(from, value, to)| {
                let from = register(&mut states, from);
                let to = register(&mut states, to);
                (from, *value, to)
            })
            .collect();
        let start = register(&mut states, start);
        let finals: Vec<usize> = finals
            .iter()
            .map(|name| register(&mut states, name))
            .collect();

        self.model.post(Box::new(Regular::new(
            variables,
            states.len(),
            &triples,
            start,
            &finals,
            min_value,
            max_value,
        )));
        Ok(())
    }

    fn translate_bin_packing(
        &mut self,
        bins: &[String],
        sizes: &[i32],
        spec: &BinPackingSpec,
    ) -> Result<(), CompileError> {
        let bins = self.lookup_all(bins)?;
        if bins.len() != sizes.len() {
            return Err(CompileError::MismatchedLengths {
                constraint: "bin-packing",
            });
        }
        let loads = match spec {
            BinPackingSpec::Capacity(condition) => {
                // The load bounds come from the capacity comparison.
                let Condition::Value(op, capacity) = condition else {
                    return Err(CompileError::UnsupportedCondition {
                        constraint: "bin-packing",
                    });
                };
                let (lower, upper) = match op {
                    RelOp::LessOrEqual => (0, *capacity),
                    RelOp::LessThan => (0, *capacity - 1),
                    RelOp::Equal => (*capacity, *capacity),
                    _ => {
                        return Err(CompileError::UnsupportedCondition {
                            constraint: "bin-packing",
                        })
                    }
                };
                let num_bins = self.bin_count(&bins);
                (0..num_bins)
                    .map(|_| self.model.new_auxiliary(Domain::interval(lower, upper)))
                    .collect()
            }
            BinPackingSpec::Capacities(capacities) => capacities
                .iter()
                .map(|&capacity| self.model.new_auxiliary(Domain::interval(0, capacity)))
                .collect(),
            BinPackingSpec::Loads(names) => self.lookup_all(names)?,
        };
        self.model
            .post(Box::new(BinPacking::new(bins, sizes.to_vec(), loads)));
        Ok(())
    }

    fn bin_count(&self, bins: &[VariableId]) -> usize {
        let store = self.model.store();
        bins.iter()
            .map(|&bin| store.max(bin).max(0) as usize + 1)
            .max()
            .unwrap_or(0)
    }

    fn translate_knapsack(
        &mut self,
        names: &[String],
        weights: &[i32],
        profits: &[i32],
        weight_condition: &Condition,
        profit_condition: &Condition,
    ) -> Result<(), CompileError> {
        let variables = self.lookup_all(names)?;
        if variables.len() != weights.len() || variables.len() != profits.len() {
            return Err(CompileError::MismatchedLengths {
                constraint: "knapsack",
            });
        }
        let weight_op = condition_operator(weight_condition).ok_or(
            CompileError::UnsupportedCondition {
                constraint: "knapsack",
            },
        )?;
        if !matches!(
            weight_op,
            RelOp::Equal | RelOp::LessOrEqual | RelOp::LessThan
        ) {
            return Err(CompileError::UnsupportedOperator {
                constraint: "knapsack",
            });
        }
        let profit_op = condition_operator(profit_condition).ok_or(
            CompileError::UnsupportedCondition {
                constraint: "knapsack",
            },
        )?;
        if !matches!(
            profit_op,
            RelOp::Equal | RelOp::GreaterOrEqual | RelOp::GreaterThan
        ) {
            return Err(CompileError::UnsupportedOperator {
                constraint: "knapsack",
            });
        }

        let weight_terms: Vec<(i32, VariableId)> = weights
            .iter()
            .copied()
            .zip(variables.iter().copied())
            .collect();
        self.post_weighted_condition(weight_terms, weight_condition)?;
        let profit_terms: Vec<(i32, VariableId)> = profits
            .iter()
            .copied()
            .zip(variables.iter().copied())
            .collect();
        self.post_weighted_condition(profit_terms, profit_condition)
    }

    fn post_weighted_condition(
        &mut self,
        terms: Vec<(i32, VariableId)>,
        condition: &Condition,
    ) -> Result<(), CompileError> {
        match condition {
            Condition::Value(op, value) => {
                self.post_linear(terms, *op, *value);
                Ok(())
            }
            Condition::Variable(op, name) => {
                let other = self.lookup(name)?;
                if *op == RelOp::Equal {
                    let mut terms = terms;
                    terms.push((-1, other));
                    self.model
                        .post(Box::new(Linear::new(terms, 0, LinearOp::Equal)));
                } else {
                    let (weights, variables): (Vec<i32>, Vec<VariableId>) =
                        terms.into_iter().unzip();
                    let sum = self.weighted_sum_variable(&weights, &variables)?;
                    self.model.post(Box::new(Binary::new(sum, other, *op)));
                }
                Ok(())
            }
            _ => Err(CompileError::UnsupportedCondition {
                constraint: "knapsack",
            }),
        }
    }
}

/// Rows of uneven length would panic once the matrix is transposed or
/// indexed; they are rejected up front instead.
fn ensure_rectangular<T>(matrix: &[Vec<T>], constraint: &'static str) -> Result<(), CompileError> {
    let columns = matrix.first().map_or(0, Vec::len);
    if matrix.iter().any(|row| row.len() != columns) {
        return Err(CompileError::MismatchedLengths { constraint });
    }
    Ok(())
}

fn condition_operator(condition: &Condition) -> Option<RelOp> {
    match condition {
        Condition::Value(op, _) | Condition::Variable(op, _) => Some(*op),
        _ => None,
    }
}

fn negate_terms(terms: Vec<(i32, VariableId)>) -> Vec<(i32, VariableId)> {
    terms
        .into_iter()
        .map(|(weight, variable)| (-weight, variable))
        .collect()
}

fn transpose(matrix: &[Vec<String>]) -> Vec<Vec<String>> {
    let columns = matrix.first().map_or(0, Vec::len);
    (0..columns)
        .map(|column| matrix.iter().map(|row| row[column].clone()).collect())
        .collect()
}
