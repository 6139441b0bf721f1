use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// Support-based filtering for `z = x (op) y`. Every value of each variable
/// keeps a witness pair among the other two domains; quadratic in the domain
/// sizes, which the explicit-domain representation keeps small.
macro_rules! binary_arithmetic {
    ($name:ident, $doc:literal, $apply:expr) => {
        #[doc = $doc]
        pub struct $name {
            x: VariableId,
            y: VariableId,
            z: VariableId,
        }

        impl $name {
            pub fn new(x: VariableId, y: VariableId, z: VariableId) -> $name {
                $name { x, y, z }
            }
        }

        impl Propagator for $name {
            fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
                let apply: fn(i64, i64) -> Option<i64> = $apply;
                filter_ternary(store, self.x, self.y, self.z, apply)
            }

            fn variables(&self) -> Vec<VariableId> {
                vec![self.x, self.y, self.z]
            }
        }
    };
}

binary_arithmetic!(Multiplication, "`z = x * y`.", |x, y| x.checked_mul(y));
binary_arithmetic!(
    Division,
    "`z = x / y` with truncation towards zero; zero divisors are unsupported.",
    |x, y| if y == 0 { None } else { Some(x / y) }
);
binary_arithmetic!(
    Modulo,
    "`z = x % y` with the sign of the dividend; zero divisors are unsupported.",
    |x, y| if y == 0 { None } else { Some(x % y) }
);
binary_arithmetic!(
    Power,
    "`z = x ^ y` for non-negative exponents; negative exponents are unsupported.",
    |x, y| u32::try_from(y).ok().and_then(|y| x.checked_pow(y))
);

fn filter_ternary(
    store: &mut DomainStore,
    x: VariableId,
    y: VariableId,
    z: VariableId,
    apply: fn(i64, i64) -> Option<i64>,
) -> Result<(), Inconsistency> {
    let x_values = store.values(x);
    let y_values = store.values(y);
    let z_values = store.values(z);

    let result_of = |a: i32, b: i32| apply(i64::from(a), i64::from(b));

    store.retain(z, |result| {
        x_values.iter().any(|&a| {
            y_values
                .iter()
                .any(|&b| result_of(a, b) == Some(i64::from(result)))
        })
    })?;
    let z_values: Vec<i32> = store.values(z);
    store.retain(x, |a| {
        y_values.iter().any(|&b| {
            result_of(a, b)
                .and_then(|result| i32::try_from(result).ok())
                .is_some_and(|result| z_values.binary_search(&result).is_ok())
        })
    })?;
    let x_values = store.values(x);
    store.retain(y, |b| {
        x_values.iter().any(|&a| {
            result_of(a, b)
                .and_then(|result| i32::try_from(result).ok())
                .is_some_and(|result| z_values.binary_search(&result).is_ok())
        })
    })
}

/// `z = |x|`.
pub struct AbsoluteValue {
    x: VariableId,
    z: VariableId,
}

impl AbsoluteValue {
    pub fn new(x: VariableId, z: VariableId) -> AbsoluteValue {
        AbsoluteValue { x, z }
    }
}

impl Propagator for AbsoluteValue {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let x_values = store.values(self.x);
        store.retain(self.z, |value| {
            value >= 0
                && (x_values.binary_search(&value).is_ok()
                    || value
                        .checked_neg()
                        .is_some_and(|negated| x_values.binary_search(&negated).is_ok()))
        })?;
        let z_values = store.values(self.z);
        store.retain(self.x, |value| {
            value
                .checked_abs()
                .is_some_and(|magnitude| z_values.binary_search(&magnitude).is_ok())
        })
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.x, self.z]
    }
}

/// `z = max(xs)`; bounds filtering.
pub struct Maximum {
    xs: Vec<VariableId>,
    z: VariableId,
}

impl Maximum {
    pub fn new(xs: Vec<VariableId>, z: VariableId) -> Maximum {
        Maximum { xs, z }
    }
}

impl Propagator for Maximum {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let largest_max = self
            .xs
            .iter()
            .map(|&x| store.max(x))
            .max()
            .ok_or(Inconsistency)?;
        let largest_min = self
            .xs
            .iter()
            .map(|&x| store.min(x))
            .max()
            .ok_or(Inconsistency)?;
        store.remove_above(self.z, largest_max)?;
        store.remove_below(self.z, largest_min)?;
        let z_max = store.max(self.z);
        for &x in &self.xs {
            store.remove_above(x, z_max)?;
        }
        // Only one variable can still reach the maximum: it must.
        let z_min = store.min(self.z);
        let mut candidates = self.xs.iter().filter(|&&x| store.max(x) >= z_min);
        if let (Some(&only), None) = (candidates.next(), candidates.next()) {
            store.remove_below(only, z_min)?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.xs.clone();
        variables.push(self.z);
        variables
    }
}

/// `z = min(xs)`; bounds filtering.
pub struct Minimum {
    xs: Vec<VariableId>,
    z: VariableId,
}

impl Minimum {
    pub fn new(xs: Vec<VariableId>, z: VariableId) -> Minimum {
        Minimum { xs, z }
    }
}

impl Propagator for Minimum {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let smallest_min = self
            .xs
            .iter()
            .map(|&x| store.min(x))
            .min()
            .ok_or(Inconsistency)?;
        let smallest_max = self
            .xs
            .iter()
            .map(|&x| store.max(x))
            .min()
            .ok_or(Inconsistency)?;
        store.remove_below(self.z, smallest_min)?;
        store.remove_above(self.z, smallest_max)?;
        let z_min = store.min(self.z);
        for &x in &self.xs {
            store.remove_below(x, z_min)?;
        }
        let z_max = store.max(self.z);
        let mut candidates = self.xs.iter().filter(|&&x| store.min(x) <= z_max);
        if let (Some(&only), None) = (candidates.next(), candidates.next()) {
            store.remove_above(only, z_max)?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.xs.clone();
        variables.push(self.z);
        variables
    }
}
