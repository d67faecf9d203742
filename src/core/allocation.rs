//! Entry validation and allocation normalization.
//!
//! An entry's total is split across the 1-3 branches picked on the entry form. When
//! the user typed amounts next to the branches they are used as proportions; when
//! nothing positive was typed the total is split evenly. Shares are converted to whole
//! units by largest-remainder apportionment, so the split always adds back up to the
//! declared total.
//!
//! Shares are kept as exact fractions (`numerator / denominator`) instead of floats:
//! two branches with the same fractional part compare equal and fall back to selection
//! order, which keeps the result reproducible.

use crate::{
    errors::EntryValidationError,
    models::{Allocation, BranchSelection},
};
use std::collections::HashSet;

/// Largest total a single entry may carry.
pub const MAX_ENTRY_TOTAL: i64 = 500;

/// Maximum number of branches one entry may be split across.
pub const MAX_BRANCHES_PER_ENTRY: usize = 3;

/// Parses the total typed on the entry form. Anything that is not a whole number is `None`.
#[must_use]
pub fn parse_total(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Parses an amount typed next to a branch. Blank or unparsable input counts as unset.
#[must_use]
pub fn parse_entered_amount(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Drops form rows that have no branch picked, keeping the order of the rest.
#[must_use]
pub fn selected_rows(rows: Vec<BranchSelection>) -> Vec<BranchSelection> {
    rows.into_iter()
        .filter(|row| !row.branch_id.trim().is_empty())
        .collect()
}

/// Checks an entry before anything is normalized or written.
///
/// Checks run in a fixed order and the first failure wins: total present and positive,
/// total within [`MAX_ENTRY_TOTAL`], at least one branch, no duplicate branches, at most
/// [`MAX_BRANCHES_PER_ENTRY`] branches. Returns the validated total.
pub fn validate_entry(
    total: Option<i64>,
    selections: &[BranchSelection],
) -> std::result::Result<i64, EntryValidationError> {
    let total = match total {
        Some(t) if t > 0 => t,
        _ => return Err(EntryValidationError::InvalidTotal),
    };
    if total > MAX_ENTRY_TOTAL {
        return Err(EntryValidationError::TotalExceedsCap {
            total,
            cap: MAX_ENTRY_TOTAL,
        });
    }
    if selections.is_empty() {
        return Err(EntryValidationError::NoBranchSelected);
    }

    let mut seen = HashSet::with_capacity(selections.len());
    for selection in selections {
        if !seen.insert(selection.branch_id.as_str()) {
            return Err(EntryValidationError::DuplicateBranch {
                branch_id: selection.branch_id.clone(),
            });
        }
    }

    if selections.len() > MAX_BRANCHES_PER_ENTRY {
        return Err(EntryValidationError::TooManyBranches {
            count: selections.len(),
            max: MAX_BRANCHES_PER_ENTRY,
        });
    }

    Ok(total)
}

/// Splits `total` across `selections` into whole amounts that sum exactly to `total`.
///
/// Expects input that already passed [`validate_entry`]. Empty input yields an empty
/// list and a non-positive total gives every selection zero; neither case panics.
/// Output order always matches selection order.
#[must_use]
pub fn normalize_allocations(total: i64, selections: &[BranchSelection]) -> Vec<Allocation> {
    if selections.is_empty() {
        return Vec::new();
    }
    if total <= 0 {
        return selections
            .iter()
            .map(|s| Allocation::new(s.branch_id.clone(), 0))
            .collect();
    }

    let weights: Vec<i128> = selections
        .iter()
        .map(|s| i128::from(s.entered.unwrap_or(0).max(0)))
        .collect();
    let sum_entered: i128 = weights.iter().sum();

    // raw share of selection i = total * weight_i / denominator
    let total_wide = i128::from(total);
    let (numerators, denominator): (Vec<i128>, i128) = if sum_entered > 0 {
        (weights.iter().map(|w| total_wide * w).collect(), sum_entered)
    } else {
        let count = i128::try_from(selections.len()).unwrap_or(i128::MAX);
        (vec![total_wide; selections.len()], count)
    };

    let mut amounts: Vec<i128> = numerators.iter().map(|n| n / denominator).collect();
    let fractions: Vec<i128> = numerators.iter().map(|n| n % denominator).collect();
    let mut remainder = total_wide - amounts.iter().sum::<i128>();

    // Stable sort keeps selection order among equal fractions.
    let mut order: Vec<usize> = (0..selections.len()).collect();
    order.sort_by(|&a, &b| fractions[b].cmp(&fractions[a]));
    for index in order {
        if remainder <= 0 {
            break;
        }
        amounts[index] += 1;
        remainder -= 1;
    }

    selections
        .iter()
        .zip(amounts)
        .map(|(selection, amount)| {
            Allocation::new(
                selection.branch_id.clone(),
                i64::try_from(amount).unwrap_or(i64::MAX),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(ids: &[&str]) -> Vec<BranchSelection> {
        ids.iter().map(|id| BranchSelection::new(*id, None)).collect()
    }

    fn weighted(pairs: &[(&str, i64)]) -> Vec<BranchSelection> {
        pairs
            .iter()
            .map(|(id, amount)| BranchSelection::new(*id, Some(*amount)))
            .collect()
    }

    fn amounts(allocations: &[Allocation]) -> Vec<i64> {
        allocations.iter().map(|a| a.amount).collect()
    }

    #[test]
    fn test_equal_split_even_total() {
        let result = normalize_allocations(10, &blank(&["a", "b"]));
        assert_eq!(result, vec![Allocation::new("a", 5), Allocation::new("b", 5)]);
    }

    #[test]
    fn test_proportional_split_with_remainder() {
        // 7.5 and 2.5: equal fractions, first selection keeps the extra unit
        let result = normalize_allocations(10, &weighted(&[("a", 3), ("b", 1)]));
        assert_eq!(result, vec![Allocation::new("a", 8), Allocation::new("b", 2)]);
    }

    #[test]
    fn test_equal_split_remainder_goes_to_first() {
        let result = normalize_allocations(7, &blank(&["a", "b", "c"]));
        assert_eq!(amounts(&result), vec![3, 2, 2]);
    }

    #[test]
    fn test_equal_split_two_remainder_units() {
        let result = normalize_allocations(8, &blank(&["a", "b", "c"]));
        assert_eq!(amounts(&result), vec![3, 3, 2]);
    }

    #[test]
    fn test_largest_fraction_wins_regardless_of_position() {
        // 10 * 1/6 = 1.666, 10 * 2/6 = 3.333, 10 * 3/6 = 5.0
        let result = normalize_allocations(10, &weighted(&[("a", 1), ("b", 2), ("c", 3)]));
        assert_eq!(amounts(&result), vec![2, 3, 5]);
    }

    #[test]
    fn test_output_keeps_selection_order() {
        let result = normalize_allocations(100, &weighted(&[("z", 1), ("m", 1), ("a", 2)]));
        let ids: Vec<&str> = result.iter().map(|a| a.branch_id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m", "a"]);
        assert_eq!(amounts(&result), vec![25, 25, 50]);
    }

    #[test]
    fn test_unset_selection_gets_zero_when_others_entered() {
        let selections = vec![
            BranchSelection::new("a", Some(4)),
            BranchSelection::new("b", None),
        ];
        let result = normalize_allocations(9, &selections);
        assert_eq!(amounts(&result), vec![9, 0]);
    }

    #[test]
    fn test_negative_entries_are_ignored() {
        let result = normalize_allocations(10, &weighted(&[("a", -5), ("b", 2)]));
        assert_eq!(amounts(&result), vec![0, 10]);
    }

    #[test]
    fn test_all_zero_entries_split_evenly() {
        let result = normalize_allocations(11, &weighted(&[("a", 0), ("b", 0)]));
        assert_eq!(amounts(&result), vec![6, 5]);
    }

    #[test]
    fn test_non_positive_total_gives_zero_rows() {
        let result = normalize_allocations(0, &blank(&["a", "b"]));
        assert_eq!(amounts(&result), vec![0, 0]);
        let result = normalize_allocations(-3, &blank(&["a"]));
        assert_eq!(amounts(&result), vec![0]);
    }

    #[test]
    fn test_empty_selection_yields_empty() {
        assert!(normalize_allocations(10, &[]).is_empty());
    }

    #[test]
    fn test_huge_entered_amounts_do_not_overflow() {
        let result = normalize_allocations(500, &weighted(&[("a", i64::MAX), ("b", i64::MAX)]));
        assert_eq!(amounts(&result), vec![250, 250]);
    }

    #[test]
    fn test_sum_is_exact_for_every_total() {
        let shapes: Vec<Vec<BranchSelection>> = vec![
            blank(&["a"]),
            blank(&["a", "b"]),
            blank(&["a", "b", "c"]),
            weighted(&[("a", 1), ("b", 1), ("c", 1)]),
            weighted(&[("a", 7), ("b", 0), ("c", 13)]),
            weighted(&[("a", 333), ("b", 1)]),
            weighted(&[("a", 2), ("b", 3), ("c", 5)]),
        ];
        for total in 1..=MAX_ENTRY_TOTAL {
            for selections in &shapes {
                let result = normalize_allocations(total, selections);
                assert_eq!(result.len(), selections.len());
                assert_eq!(result.iter().map(|a| a.amount).sum::<i64>(), total);
                assert!(result.iter().all(|a| a.amount >= 0));
            }
        }
    }

    #[test]
    fn test_equal_split_within_one_unit() {
        for total in 1..=MAX_ENTRY_TOTAL {
            for n in 1..=3_usize {
                let ids: Vec<String> = (0..n).map(|i| format!("b{i}")).collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                let result = normalize_allocations(total, &blank(&refs));
                let n_i64 = i64::try_from(n).unwrap_or(1);
                for allocation in &result {
                    assert!(allocation.amount == total / n_i64 || allocation.amount == total / n_i64 + 1);
                }
            }
        }
    }

    #[test]
    fn test_validate_entry_order_of_checks() {
        let one = blank(&["a"]);
        assert_eq!(validate_entry(None, &one), Err(EntryValidationError::InvalidTotal));
        assert_eq!(validate_entry(Some(0), &one), Err(EntryValidationError::InvalidTotal));
        assert_eq!(validate_entry(Some(-4), &one), Err(EntryValidationError::InvalidTotal));
        assert_eq!(
            validate_entry(Some(501), &[]),
            Err(EntryValidationError::TotalExceedsCap {
                total: 501,
                cap: 500
            })
        );
        assert_eq!(
            validate_entry(Some(10), &[]),
            Err(EntryValidationError::NoBranchSelected)
        );
        // Duplicates are reported before the count check
        assert_eq!(
            validate_entry(Some(10), &blank(&["a", "b", "c", "a"])),
            Err(EntryValidationError::DuplicateBranch {
                branch_id: "a".to_string()
            })
        );
        assert_eq!(
            validate_entry(Some(10), &blank(&["a", "b", "c", "d"])),
            Err(EntryValidationError::TooManyBranches { count: 4, max: 3 })
        );
        assert_eq!(validate_entry(Some(500), &blank(&["a", "b", "c"])), Ok(500));
    }

    #[test]
    fn test_parse_form_input() {
        assert_eq!(parse_total(" 250 "), Some(250));
        assert_eq!(parse_total("12.5"), None);
        assert_eq!(parse_total(""), None);
        assert_eq!(parse_entered_amount(""), None);
        assert_eq!(parse_entered_amount("abc"), None);
        assert_eq!(parse_entered_amount(" 3"), Some(3));
        assert_eq!(
            BranchSelection::from_input("moca", "7"),
            BranchSelection::new("moca", Some(7))
        );
    }

    #[test]
    fn test_selected_rows_drops_blank_branches() {
        let rows = vec![
            BranchSelection::new("", Some(3)),
            BranchSelection::new("moca", None),
            BranchSelection::new("  ", None),
            BranchSelection::new("santiago", Some(1)),
        ];
        let ids: Vec<String> = selected_rows(rows).into_iter().map(|r| r.branch_id).collect();
        assert_eq!(ids, vec!["moca", "santiago"]);
    }
}
