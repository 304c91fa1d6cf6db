//! # Pivot rules
//!
//! Strategies for selecting the column that enters the basis.
use crate::algorithm::simplex::tableau::Tableau;
use crate::data::linear_algebra::SparseTuple;

/// Deciding how to pivot.
///
/// During the Simplex method, one needs to decide how to move from basic solution to basic
/// solution. The pivot rule describes that behavior.
///
/// Once the column has been selected, a row needs to be found. That decision is made by the ratio
/// test of the tableau; the rule only decides how ties in the ratio test are broken.
pub(crate) trait PivotRule {
    /// Break ties between leaving candidates by the lowest column index.
    const LOWEST_INDEX_LEAVING: bool;

    /// Create a new instance.
    fn new() -> Self;

    /// Column selection rule for the primal Simplex method.
    ///
    /// # Arguments
    ///
    /// * `relative_costs`: Relative cost of every column of the tableau.
    ///
    /// # Return value
    ///
    /// A column that is profitable to move, with its relative cost, or `None` if the current
    /// solution is optimal.
    fn select_primal_pivot_column(
        &mut self,
        tableau: &Tableau,
        relative_costs: &[f64],
    ) -> Option<SparseTuple<f64>>;
}

/// Simply pivot on the first profitable column.
///
/// Together with leaving ties broken by index this is Bland's rule, which does not cycle.
pub(crate) struct FirstProfitable;
impl PivotRule for FirstProfitable {
    const LOWEST_INDEX_LEAVING: bool = true;

    fn new() -> Self {
        Self
    }

    fn select_primal_pivot_column(
        &mut self,
        tableau: &Tableau,
        relative_costs: &[f64],
    ) -> Option<SparseTuple<f64>> {
        relative_costs.iter()
            .copied()
            .enumerate()
            .find(|&(j, cost)| tableau.is_profitable(j, cost))
    }
}

/// Pivot on the column with the relative cost largest in absolute value.
pub(crate) struct MostProfitable;
impl PivotRule for MostProfitable {
    const LOWEST_INDEX_LEAVING: bool = false;

    fn new() -> Self {
        Self
    }

    fn select_primal_pivot_column(
        &mut self,
        tableau: &Tableau,
        relative_costs: &[f64],
    ) -> Option<SparseTuple<f64>> {
        relative_costs.iter()
            .copied()
            .enumerate()
            .filter(|&(j, cost)| tableau.is_profitable(j, cost))
            // The first of equally profitable columns
            .min_by(|(_, a), (_, b)| b.abs().total_cmp(&a.abs()))
    }
}
