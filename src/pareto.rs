//! Non-dominated sorting
//!
//! NSGA-II-style front peeling: partition a population into ordered tiers
//! where tier 0 is the Pareto frontier, tier 1 is the frontier of what
//! remains, and so on. All value vectors are assumed to already be in
//! minimizing form (see `ObjectiveResults::minimizing_matrix`).

use serde::{Deserialize, Serialize};

/// One tier of mutually non-dominated candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParetoTier {
    /// Tier rank; tier 0 dominates tier 1, etc.
    pub rank: usize,
    /// Indices into the sorted population
    pub members: Vec<usize>,
}

/// True iff `a` dominates `b` under the minimizing convention:
/// no worse on every objective and strictly better on at least one.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    let mut strictly_better = false;
    for (x, y) in a.iter().zip(b) {
        if x > y {
            return false;
        }
        if x < y {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Partition candidates into ordered Pareto tiers.
///
/// Every index in `0..matrix.len()` appears in exactly one tier. Candidates
/// with equal objective vectors are mutually non-dominated and share a tier.
pub fn non_dominated_sort(matrix: &[Vec<f64>]) -> Vec<ParetoTier> {
    let mut remaining: Vec<usize> = (0..matrix.len()).collect();
    let mut tiers = Vec::new();
    let mut rank = 0;

    while !remaining.is_empty() {
        let front: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| {
                !remaining
                    .iter()
                    .any(|&j| j != i && dominates(&matrix[j], &matrix[i]))
            })
            .collect();

        remaining.retain(|i| !front.contains(i));
        tiers.push(ParetoTier {
            rank,
            members: front,
        });
        rank += 1;
    }

    tiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominates_basic() {
        assert!(dominates(&[1.0, 1.0], &[2.0, 2.0]));
        assert!(dominates(&[1.0, 2.0], &[1.0, 3.0]));
        assert!(!dominates(&[1.0, 3.0], &[2.0, 2.0]));
        assert!(!dominates(&[2.0, 2.0], &[1.0, 1.0]));
    }

    #[test]
    fn test_equal_vectors_do_not_dominate() {
        assert!(!dominates(&[1.0, 2.0], &[1.0, 2.0]));
    }

    #[test]
    fn test_sort_partitions_exactly_once() {
        let matrix = vec![
            vec![1.0, 4.0],
            vec![2.0, 2.0],
            vec![4.0, 1.0],
            vec![3.0, 3.0],
            vec![5.0, 5.0],
        ];
        let tiers = non_dominated_sort(&matrix);

        let mut seen: Vec<usize> = tiers.iter().flat_map(|t| t.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_tier_zero_is_undominated() {
        let matrix = vec![
            vec![1.0, 4.0],
            vec![2.0, 2.0],
            vec![4.0, 1.0],
            vec![3.0, 3.0],
            vec![5.0, 5.0],
        ];
        let tiers = non_dominated_sort(&matrix);

        assert_eq!(tiers[0].members, vec![0, 1, 2]);
        for &i in &tiers[0].members {
            for (j, row) in matrix.iter().enumerate() {
                if i != j {
                    assert!(!dominates(row, &matrix[i]));
                }
            }
        }
    }

    #[test]
    fn test_each_lower_tier_member_is_dominated_by_upper_tier() {
        let matrix = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
            vec![1.5, 0.5],
        ];
        let tiers = non_dominated_sort(&matrix);

        for window in tiers.windows(2) {
            let (upper, lower) = (&window[0], &window[1]);
            for &i in &lower.members {
                assert!(
                    upper
                        .members
                        .iter()
                        .any(|&j| dominates(&matrix[j], &matrix[i])),
                    "tier {} member {} not dominated by tier {}",
                    lower.rank,
                    i,
                    upper.rank
                );
            }
        }
    }

    #[test]
    fn test_equal_vectors_share_a_tier() {
        let matrix = vec![vec![1.0, 2.0], vec![1.0, 2.0], vec![3.0, 3.0]];
        let tiers = non_dominated_sort(&matrix);

        assert_eq!(tiers[0].members, vec![0, 1]);
        assert_eq!(tiers[1].members, vec![2]);
    }

    #[test]
    fn test_single_objective_total_order() {
        let matrix = vec![vec![3.0], vec![1.0], vec![2.0]];
        let tiers = non_dominated_sort(&matrix);

        assert_eq!(tiers.len(), 3);
        assert_eq!(tiers[0].members, vec![1]);
        assert_eq!(tiers[1].members, vec![2]);
        assert_eq!(tiers[2].members, vec![0]);
    }

    #[test]
    fn test_empty_population() {
        let tiers = non_dominated_sort(&[]);
        assert!(tiers.is_empty());
    }
}
