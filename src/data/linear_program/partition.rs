//! # Block partitions
//!
//! A `BlockPartition` assigns every row and column of a `SparseModel` to a block. Columns always
//! belong to one of the blocks `1..=nr_blocks`. Rows belong either to the block of the columns they
//! reference, or to block `0`, the linking block, whose rows may couple columns of any blocks.
//!
//! Partitions are immutable once created: they are either given explicitly or found by a greedy
//! heuristic on the row-column incidence graph.
use std::cmp::Reverse;

use index_utils::remove_indices;
use itertools::Itertools;

use crate::data::linear_program::model::SparseModel;
use crate::error::{Error, Result};

/// Identifier of the linking block.
pub const LINKING_BLOCK: usize = 0;

/// Assignment of rows and columns to blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPartition {
    row_block: Vec<usize>,
    column_block: Vec<usize>,
    nr_blocks: usize,
}

/// How a partition should be obtained for a branch-and-price solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockFinding {
    /// Use a partition supplied by the caller.
    Explicit(BlockPartition),
    /// Find a partition with `BlockPartition::from_heuristic`.
    Heuristic {
        /// Number of blocks to aim for.
        target_blocks: usize,
    },
}

impl BlockFinding {
    /// Produce the partition for `model`.
    pub fn resolve(&self, model: &SparseModel) -> Result<BlockPartition> {
        match self {
            BlockFinding::Explicit(partition) => {
                partition.check_fits(model)?;
                Ok(partition.clone())
            },
            &BlockFinding::Heuristic { target_blocks } => BlockPartition::from_heuristic(model, target_blocks),
        }
    }
}

impl BlockPartition {
    /// Validate a partition given by block ids per row and per column.
    ///
    /// # Arguments
    ///
    /// * `model`: The model that should be partitioned.
    /// * `row_block`: Block of each row, `0` for linking rows.
    /// * `column_block`: Block of each column, at least `1`.
    ///
    /// # Return value
    ///
    /// The partition, or `Error::InvalidPartition` if the sizes don't match, a column is placed in
    /// the linking block or a non-linking row references a column of another block.
    pub fn from_explicit(
        model: &SparseModel,
        row_block: Vec<usize>,
        column_block: Vec<usize>,
    ) -> Result<Self> {
        let nr_blocks = row_block.iter().chain(&column_block).copied().max().unwrap_or(0);
        let partition = Self { row_block, column_block, nr_blocks };
        partition.check_fits(model)?;

        Ok(partition)
    }

    /// Every row and column in a single block, so that nothing is linking.
    pub fn single_block(model: &SparseModel) -> Self {
        Self {
            row_block: vec![1; model.nr_rows()],
            column_block: vec![1; model.nr_columns()],
            nr_blocks: 1,
        }
    }

    /// Find a partition with (at most) `target_blocks` blocks.
    ///
    /// Rows are considered from short to long, ties broken by the lowest row index. The columns of
    /// a row are merged into one group unless that would leave fewer than `target_blocks` groups;
    /// long rows that would glue groups together are thereby left to become linking rows. Groups
    /// in excess of the target are merged smallest first. Finally, rows that span several groups
    /// are linking, all other rows join the block of their columns.
    ///
    /// The result only depends on the model, so repeated calls give the same partition.
    pub fn from_heuristic(model: &SparseModel, target_blocks: usize) -> Result<Self> {
        if target_blocks == 0 {
            return Err(Error::InvalidPartition("at least one block is needed".to_string()));
        }

        let nr_columns = model.nr_columns();
        let target = target_blocks.min(nr_columns).max(1);

        // Columns that appear in no row can join any block, they are placed at the end
        let active = (0..nr_columns)
            .map(|j| !model.constraints().column_rows(j).is_empty())
            .collect::<Vec<_>>();
        let mut nr_groups = active.iter().filter(|&&is_active| is_active).count();

        let mut groups = UnionFind::new(nr_columns);
        let row_order = (0..model.nr_rows())
            .sorted_by_key(|&i| (model.row_columns(i).len(), i))
            .collect::<Vec<_>>();
        for i in row_order {
            let columns = model.row_columns(i);
            let merges = groups.merges_needed(columns);
            if nr_groups >= target + merges {
                for (&a, &b) in columns.iter().tuple_windows() {
                    groups.union(a, b);
                }
                nr_groups -= merges;
            } else {
                log::trace!("row {} left as a linking candidate", i);
            }
        }

        let (mut sets, loose): (Vec<_>, Vec<_>) = groups.sets().into_iter()
            .partition(|set| active[set[0]]);
        for set in loose {
            if sets.len() < target {
                sets.push(set);
            } else if let Some(smallest) = sets.iter().position_min_by_key(|set| (set.len(), set[0])) {
                sets[smallest].extend(set);
            }
        }

        while sets.len() > target {
            sets.sort_by_key(|set| Reverse((set.len(), set[0])));
            // The two smallest groups are at the back
            let smallest = sets.len() - 1;
            let second = sets.len() - 2;
            let mut merged = sets[smallest].clone();
            merged.extend_from_slice(&sets[second]);
            remove_indices(&mut sets, &[second, smallest]);
            sets.push(merged);
        }
        for set in &mut sets {
            set.sort_unstable();
        }
        sets.sort_by_key(|set| set[0]);

        let mut column_block = vec![0; nr_columns];
        for (index, set) in sets.iter().enumerate() {
            for &j in set {
                column_block[j] = index + 1;
            }
        }

        let row_block = (0..model.nr_rows())
            .map(|i| {
                let blocks = model.row_columns(i).iter().map(|&j| column_block[j]).unique().collect::<Vec<_>>();
                match blocks.as_slice() {
                    &[block] => block,
                    _ => LINKING_BLOCK,
                }
            })
            .collect::<Vec<_>>();

        let partition = Self { row_block, column_block, nr_blocks: sets.len().max(1) };
        debug_assert!(partition.check_fits(model).is_ok());
        log::debug!(
            "heuristic found {} blocks with {} linking rows",
            partition.nr_blocks, partition.linking_rows().len(),
        );

        Ok(partition)
    }

    /// Verify that this partition can be used with `model`.
    ///
    /// Block membership of non-linking rows is checked structurally: every column the row
    /// references must be in the block of the row.
    pub fn check_fits(&self, model: &SparseModel) -> Result<()> {
        let invalid = |message: String| Err(Error::InvalidPartition(message));

        if self.row_block.len() != model.nr_rows() {
            return invalid(format!("{} row blocks for {} rows", self.row_block.len(), model.nr_rows()));
        }
        if self.column_block.len() != model.nr_columns() {
            return invalid(format!(
                "{} column blocks for {} columns", self.column_block.len(), model.nr_columns(),
            ));
        }
        if let Some(j) = self.column_block.iter().position(|&block| block == LINKING_BLOCK) {
            return invalid(format!("column {} is in the linking block", j));
        }
        if let Some(j) = self.column_block.iter().position(|&block| block > self.nr_blocks) {
            return invalid(format!("column {} is in block {} of {}", j, self.column_block[j], self.nr_blocks));
        }
        if let Some(i) = self.row_block.iter().position(|&block| block > self.nr_blocks) {
            return invalid(format!("row {} is in block {} of {}", i, self.row_block[i], self.nr_blocks));
        }

        for (i, &block) in self.row_block.iter().enumerate() {
            if block == LINKING_BLOCK {
                continue;
            }
            if let Some(&j) = model.row_columns(i).iter().find(|&&j| self.column_block[j] != block) {
                return invalid(format!(
                    "row {} of block {} references column {} of block {}", i, block, j, self.column_block[j],
                ));
            }
        }

        Ok(())
    }

    /// Number of non-linking blocks.
    pub fn nr_blocks(&self) -> usize {
        self.nr_blocks
    }

    /// Block of row `i`, `0` if the row is linking.
    pub fn block_of_row(&self, i: usize) -> usize {
        self.row_block[i]
    }

    /// Block of column `j`.
    pub fn block_of_column(&self, j: usize) -> usize {
        self.column_block[j]
    }

    /// Block ids of all rows.
    pub fn row_blocks(&self) -> &[usize] {
        &self.row_block
    }

    /// Block ids of all columns.
    pub fn column_blocks(&self) -> &[usize] {
        &self.column_block
    }

    /// Indices of all rows in `block`, in increasing order.
    pub fn rows_of_block(&self, block: usize) -> Vec<usize> {
        (0..self.row_block.len()).filter(|&i| self.row_block[i] == block).collect()
    }

    /// Indices of all columns in `block`, in increasing order.
    pub fn columns_of_block(&self, block: usize) -> Vec<usize> {
        (0..self.column_block.len()).filter(|&j| self.column_block[j] == block).collect()
    }

    /// Indices of the rows in the linking block.
    pub fn linking_rows(&self) -> Vec<usize> {
        self.rows_of_block(LINKING_BLOCK)
    }
}

/// Disjoint sets of column indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`, the lowest root stays root.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[child] = root;
    }

    /// How many unions it takes to bring all of `elements` in one set.
    fn merges_needed(&mut self, elements: &[usize]) -> usize {
        let roots = elements.iter().map(|&x| self.find(x)).unique().count();
        roots.saturating_sub(1)
    }

    /// All sets, each sorted, in order of their lowest element.
    fn sets(mut self) -> Vec<Vec<usize>> {
        let mut by_root = vec![Vec::new(); self.parent.len()];
        for x in 0..self.parent.len() {
            let root = self.find(x);
            by_root[root].push(x);
        }
        by_root.into_iter().filter(|set| !set.is_empty()).collect()
    }
}

#[cfg(test)]
mod test {
    use crate::data::linear_program::elements::{ConstraintType, Objective, VariableType};
    use crate::data::linear_program::model::{Bounds, SparseColumns, SparseModel};
    use crate::data::linear_program::partition::{BlockFinding, BlockPartition, LINKING_BLOCK};
    use crate::error::Error;

    /// Rows: {0, 1}, {1, 2}, {3, 4}, {0, 4}. Columns 5 appears nowhere.
    fn model() -> SparseModel {
        let rows: Vec<Vec<usize>> = vec![vec![0, 1], vec![1, 2], vec![3, 4], vec![0, 4]];
        let mut columns = vec![Vec::new(); 6];
        for (i, row) in rows.iter().enumerate() {
            for &j in row {
                columns[j].push(i);
            }
        }
        let mut column_start = vec![0];
        let mut row_index = Vec::new();
        for column in columns {
            row_index.extend(column);
            column_start.push(row_index.len());
        }
        let nnz = row_index.len();

        SparseModel::build(
            4, 6,
            Objective::Minimize,
            vec![1_f64; 6],
            vec![1_f64; 4],
            vec![ConstraintType::LessEqual; 4],
            SparseColumns::new(column_start, row_index, vec![1_f64; nnz]),
            Bounds::nonnegative(6),
            vec![VariableType::Continuous; 6],
        ).unwrap()
    }

    #[test]
    fn explicit() {
        let model = model();
        let partition = BlockPartition::from_explicit(
            &model,
            vec![1, 1, 2, 0],
            vec![1, 1, 1, 2, 2, 2],
        ).unwrap();
        assert_eq!(partition.nr_blocks(), 2);
        assert_eq!(partition.linking_rows(), vec![3]);
        assert_eq!(partition.columns_of_block(2), vec![3, 4, 5]);
        assert_eq!(partition.rows_of_block(1), vec![0, 1]);
    }

    #[test]
    fn explicit_rejects_crossing_rows() {
        let model = model();
        let result = BlockPartition::from_explicit(&model, vec![1, 1, 2, 1], vec![1, 1, 1, 2, 2, 2]);
        assert!(matches!(result, Err(Error::InvalidPartition(_))));

        let result = BlockPartition::from_explicit(&model, vec![1, 1, 2, 0], vec![1, 1, 1, 2, 2, 0]);
        assert!(matches!(result, Err(Error::InvalidPartition(_))));

        let result = BlockPartition::from_explicit(&model, vec![1, 1, 2], vec![1, 1, 1, 2, 2, 2]);
        assert!(matches!(result, Err(Error::InvalidPartition(_))));
    }

    #[test]
    fn linking_row_within_one_block_is_accepted() {
        let model = model();
        let partition = BlockPartition::from_explicit(&model, vec![0, 1, 2, 0], vec![1, 1, 1, 2, 2, 2]);
        assert!(partition.is_ok());
    }

    #[test]
    fn heuristic() {
        let model = model();
        let partition = BlockPartition::from_heuristic(&model, 2).unwrap();

        // Rows 0, 1 and 2 group {0, 1, 2} and {3, 4}, row 3 would glue them together
        assert_eq!(partition.nr_blocks(), 2);
        assert_eq!(partition.block_of_row(3), LINKING_BLOCK);
        assert_eq!(partition.block_of_column(0), partition.block_of_column(2));
        assert_ne!(partition.block_of_column(0), partition.block_of_column(3));
        // The loose column joins the smallest group
        assert_eq!(partition.block_of_column(5), partition.block_of_column(3));
        assert!(partition.check_fits(&model).is_ok());

        assert_eq!(partition, BlockPartition::from_heuristic(&model, 2).unwrap());
    }

    #[test]
    fn heuristic_extremes() {
        let model = model();
        assert!(matches!(BlockPartition::from_heuristic(&model, 0), Err(Error::InvalidPartition(_))));

        let one = BlockPartition::from_heuristic(&model, 1).unwrap();
        assert_eq!(one.nr_blocks(), 1);
        assert!(one.linking_rows().is_empty());

        let many = BlockPartition::from_heuristic(&model, 100).unwrap();
        assert_eq!(many.nr_blocks(), 6);
        assert_eq!(many.linking_rows(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn finding() {
        let model = model();
        let single = BlockFinding::Explicit(BlockPartition::single_block(&model)).resolve(&model).unwrap();
        assert_eq!(single.nr_blocks(), 1);
        let found = BlockFinding::Heuristic { target_blocks: 2 }.resolve(&model).unwrap();
        assert_eq!(found.nr_blocks(), 2);
    }
}
