use crate::series::Series;
use ecocount_scanner::Timestamp;
use std::collections::BTreeMap;

pub const COUNT_COLUMN: &str = "count";

/// Counts per timestamp, one column per series.
///
/// The index is the union of every series' timestamps. A cell is `None` when
/// its series has no point at that timestamp, which is distinct from a
/// reported count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: BTreeMap<Timestamp, Vec<Option<u64>>>,
}

impl Dataset {
    /// A dataset with only the `count` column and no rows.
    pub fn empty() -> Self {
        Self {
            columns: vec![COUNT_COLUMN.to_string()],
            rows: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index(&self) -> impl Iterator<Item = &Timestamp> {
        self.rows.keys()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Timestamp, &[Option<u64>])> {
        self.rows.iter().map(|(ts, cells)| (ts, cells.as_slice()))
    }

    pub fn first_timestamp(&self) -> Option<&Timestamp> {
        self.rows.keys().next()
    }

    pub fn last_timestamp(&self) -> Option<&Timestamp> {
        self.rows.keys().next_back()
    }

    /// Cell lookup. `None` for an unknown row or column, `Some(None)` for a null cell.
    pub fn get(&self, timestamp: &Timestamp, column: &str) -> Option<Option<u64>> {
        let idx = self.column_index(column)?;
        self.rows.get(timestamp).map(|cells| cells[idx])
    }

    pub fn column(&self, name: &str) -> Option<Vec<Option<u64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.values().map(|cells| cells[idx]).collect())
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Outer join of `series` as column `name`.
    ///
    /// Joining a name that is already present writes into that column.
    fn join(&mut self, name: &str, series: &Series) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for cells in self.rows.values_mut() {
                    cells.push(None);
                }
                self.columns.len() - 1
            }
        };

        let width = self.columns.len();
        for (timestamp, &counts) in series {
            let cells = self
                .rows
                .entry(*timestamp)
                .or_insert_with(|| vec![None; width]);
            cells[idx] = Some(counts);
        }
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

/// Combines the all-directions series with per-direction series.
///
/// The aggregate becomes `count`; each direction becomes a column named by its
/// code, in the order given. Cell values do not depend on that order.
pub fn assemble(aggregate: &Series, directions: &[(String, Series)]) -> Dataset {
    let mut dataset = Dataset::empty();
    dataset.join(COUNT_COLUMN, aggregate);
    for (code, series) in directions {
        dataset.join(code, series);
    }
    dataset
}
