use fnv::FnvHashSet;

use crate::engine::DomainStore;
use crate::engine::Inconsistency;
use crate::engine::Propagator;
use crate::engine::VariableId;

/// `array[index] = value` over an array of variables. Indices are zero
/// based; the compiler shifts non-zero start indices before posting.
pub struct ElementVar {
    array: Vec<VariableId>,
    index: VariableId,
    value: VariableId,
}

impl ElementVar {
    pub fn new(array: Vec<VariableId>, index: VariableId, value: VariableId) -> ElementVar {
        ElementVar {
            array,
            index,
            value,
        }
    }
}

impl Propagator for ElementVar {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let length = self.array.len() as i32;
        let value_values = store.values(self.value);
        let overlaps: Vec<bool> = self
            .array
            .iter()
            .map(|&cell| {
                store
                    .domain(cell)
                    .iter()
                    .any(|entry| value_values.binary_search(&entry).is_ok())
            })
            .collect();
        store.retain(self.index, |candidate| {
            (0..length).contains(&candidate) && overlaps[candidate as usize]
        })?;

        let indices = store.values(self.index);
        let mut supported = FnvHashSet::default();
        for &position in &indices {
            supported.extend(store.domain(self.array[position as usize]).iter());
        }
        store.retain(self.value, |candidate| supported.contains(&candidate))?;

        if let [position] = indices.as_slice() {
            let cell = self.array[*position as usize];
            let value_values = store.values(self.value);
            store.retain(cell, |candidate| {
                value_values.binary_search(&candidate).is_ok()
            })?;
        }
        Ok(())
    }

    fn variables(&self) -> Vec<VariableId> {
        let mut variables = self.array.clone();
        variables.push(self.index);
        variables.push(self.value);
        variables
    }
}

/// `array[index] = value` over a constant array.
pub struct ElementConstArray {
    array: Vec<i32>,
    index: VariableId,
    value: VariableId,
}

impl ElementConstArray {
    pub fn new(array: Vec<i32>, index: VariableId, value: VariableId) -> ElementConstArray {
        ElementConstArray {
            array,
            index,
            value,
        }
    }
}

impl Propagator for ElementConstArray {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let length = self.array.len() as i32;
        let value_values = store.values(self.value);
        {
            let array = &self.array;
            store.retain(self.index, |candidate| {
                (0..length).contains(&candidate)
                    && value_values
                        .binary_search(&array[candidate as usize])
                        .is_ok()
            })?;
        }
        let supported: FnvHashSet<i32> = store
            .values(self.index)
            .into_iter()
            .map(|position| self.array[position as usize])
            .collect();
        store.retain(self.value, |candidate| supported.contains(&candidate))
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.index, self.value]
    }
}

/// `matrix[row][column] = value` over a constant matrix.
pub struct ElementConstMatrix {
    matrix: Vec<Vec<i32>>,
    row: VariableId,
    column: VariableId,
    value: VariableId,
}

impl ElementConstMatrix {
    pub fn new(
        matrix: Vec<Vec<i32>>,
        row: VariableId,
        column: VariableId,
        value: VariableId,
    ) -> ElementConstMatrix {
        ElementConstMatrix {
            matrix,
            row,
            column,
            value,
        }
    }

}

impl Propagator for ElementConstMatrix {
    fn propagate(&mut self, store: &mut DomainStore) -> Result<(), Inconsistency> {
        let rows = self.matrix.len() as i32;
        let columns = self.matrix.first().map_or(0, Vec::len) as i32;
        store.retain(self.row, |candidate| (0..rows).contains(&candidate))?;
        store.retain(self.column, |candidate| (0..columns).contains(&candidate))?;

        let row_values = store.values(self.row);
        let column_values = store.values(self.column);
        let value_values = store.values(self.value);

        let mut supported_rows = FnvHashSet::default();
        let mut supported_columns = FnvHashSet::default();
        let mut supported_values = FnvHashSet::default();
        for &row in &row_values {
            for &column in &column_values {
                let entry = self.matrix[row as usize][column as usize];
                if value_values.binary_search(&entry).is_ok() {
                    let _ = supported_rows.insert(row);
                    let _ = supported_columns.insert(column);
                    let _ = supported_values.insert(entry);
                }
            }
        }

        store.retain(self.row, |candidate| supported_rows.contains(&candidate))?;
        store.retain(self.column, |candidate| {
            supported_columns.contains(&candidate)
        })?;
        store.retain(self.value, |candidate| {
            supported_values.contains(&candidate)
        })
    }

    fn variables(&self) -> Vec<VariableId> {
        vec![self.row, self.column, self.value]
    }
}

#[cfg(test)]
mod tests {
    use super::ElementConstArray;
    use super::ElementConstMatrix;
    use super::ElementVar;
    use crate::engine::Domain;
    use crate::engine::DomainStore;
    use crate::engine::Propagator;

    #[test]
    fn variable_array_channels_both_ways() {
        let mut store = DomainStore::default();
        let a = store.new_domain(Domain::interval(0, 1));
        let b = store.new_domain(Domain::interval(5, 6));
        let index = store.new_domain(Domain::interval(0, 5));
        let value = store.new_domain(Domain::interval(4, 9));

        let mut element = ElementVar::new(vec![a, b], index, value);
        element.propagate(&mut store).unwrap();
        // Only cell 1 intersects the value domain.
        assert_eq!(store.values(index), vec![1]);
        assert_eq!(store.values(value), vec![5, 6]);
        assert_eq!(store.values(b), vec![5, 6]);
    }

    #[test]
    fn constant_array_filters_the_index() {
        let mut store = DomainStore::default();
        let index = store.new_domain(Domain::interval(-1, 5));
        let value = store.new_domain(Domain::sparse([7]));

        let mut element = ElementConstArray::new(vec![3, 7, 7, 1], index, value);
        element.propagate(&mut store).unwrap();
        assert_eq!(store.values(index), vec![1, 2]);
    }

    #[test]
    fn constant_matrix_filters_rows_and_columns() {
        let mut store = DomainStore::default();
        let row = store.new_domain(Domain::interval(0, 1));
        let column = store.new_domain(Domain::interval(0, 2));
        let value = store.new_domain(Domain::sparse([6]));

        let matrix = vec![vec![1, 2, 3], vec![4, 6, 6]];
        let mut element = ElementConstMatrix::new(matrix, row, column, value);
        element.propagate(&mut store).unwrap();
        assert_eq!(store.values(row), vec![1]);
        assert_eq!(store.values(column), vec![1, 2]);
    }
}
