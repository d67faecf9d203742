//! Badges and the weekly highlight.
//!
//! Badge rules are plain data: each [`BadgeRule`] carries a predicate over one branch
//! and a shared [`RuleContext`]. Nothing is stored; earned badges are recomputed from
//! the current snapshot every time they are read.

use crate::{
    core::period::{format_amount, trailing_week_start},
    models::{Branch, Entry},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::HashMap, fmt};

/// Everything a badge predicate may look at besides the branch itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// All entries, deleted ones included; rules skip deleted entries themselves
    pub entries: &'a [Entry],
    /// All branches with derived totals
    pub branches: &'a [Branch],
    /// Evaluation instant
    pub now: DateTime<Utc>,
}

/// A badge definition with its earning predicate.
#[derive(Debug, Clone, Copy)]
pub struct BadgeRule {
    /// Stable rule key
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display icon
    pub icon: &'static str,
    /// Human description of the rule
    pub description: &'static str,
    /// Whether `branch` earns the badge
    pub check: fn(&Branch, &RuleContext<'_>) -> bool,
}

/// An earned badge, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    /// Rule key
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Display icon
    pub icon: &'static str,
    /// What earned it
    pub description: &'static str,
}

impl From<&BadgeRule> for Badge {
    fn from(rule: &BadgeRule) -> Self {
        Self {
            id: rule.id,
            name: rule.name,
            icon: rule.icon,
            description: rule.description,
        }
    }
}

/// Badge rules in display order.
pub const BADGE_RULES: &[BadgeRule] = &[
    BadgeRule {
        id: "reach_goal",
        name: "Goal Reached",
        icon: "🏁",
        description: "Total at or above a non-zero goal",
        check: reached_goal,
    },
    BadgeRule {
        id: "half_way",
        name: "Half of Goal",
        icon: "🎯",
        description: "Total at or above half of a non-zero goal",
        check: half_way,
    },
    BadgeRule {
        id: "strong_week_top",
        name: "Branch of the Week",
        icon: "🏆",
        description: "Largest positive sum over the last seven days",
        check: top_of_week,
    },
];

const fn reached_goal(branch: &Branch, _: &RuleContext<'_>) -> bool {
    branch.goal > 0 && branch.total >= branch.goal
}

const fn half_way(branch: &Branch, _: &RuleContext<'_>) -> bool {
    // total >= goal / 2 without rounding the goal
    branch.goal > 0 && branch.total * 2 >= branch.goal
}

fn top_of_week(branch: &Branch, ctx: &RuleContext<'_>) -> bool {
    let sums = weekly_sums(ctx.entries, ctx.now);
    let own = sums.get(branch.id.as_str()).copied().unwrap_or(0);
    let best = ctx
        .branches
        .iter()
        .map(|b| sums.get(b.id.as_str()).copied().unwrap_or(0))
        .max()
        .unwrap_or(0);
    own > 0 && own == best
}

/// Per-branch sum of non-deleted allocations over the trailing seven days.
#[must_use]
pub fn weekly_sums(entries: &[Entry], now: DateTime<Utc>) -> HashMap<&str, i64> {
    let since = trailing_week_start(now);
    let mut sums = HashMap::new();
    for entry in entries
        .iter()
        .filter(|e| !e.is_deleted && e.timestamp >= since)
    {
        for allocation in &entry.allocations {
            *sums.entry(allocation.branch_id.as_str()).or_insert(0) += allocation.amount;
        }
    }
    sums
}

/// Badges earned by one branch, in rule order.
#[must_use]
pub fn branch_badges(branch: &Branch, ctx: &RuleContext<'_>) -> Vec<Badge> {
    BADGE_RULES
        .iter()
        .filter(|rule| (rule.check)(branch, ctx))
        .map(Badge::from)
        .collect()
}

/// Badges earned by at least one branch, each listed once, in rule order.
#[must_use]
pub fn regional_badges(ctx: &RuleContext<'_>) -> Vec<Badge> {
    BADGE_RULES
        .iter()
        .filter(|rule| ctx.branches.iter().any(|b| (rule.check)(b, ctx)))
        .map(Badge::from)
        .collect()
}

/// Headline for the dashboard about the last seven days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WeeklyHighlight {
    /// A branch raised strictly more than zero and led the week
    Leader {
        /// Display name of the leading branch
        branch_name: String,
        /// Its seven-day sum
        amount: i64,
    },
    /// Nobody raised anything this week
    Encouragement,
}

impl fmt::Display for WeeklyHighlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leader {
                branch_name,
                amount,
            } => write!(
                f,
                "🏆 Strongest week: {branch_name} with {}.",
                format_amount(*amount)
            ),
            Self::Encouragement => {
                f.write_str("Every contribution counts. Let's make this week a strong one!")
            }
        }
    }
}

/// Picks the branch with the largest positive seven-day sum; the first in branch order
/// wins ties.
#[must_use]
pub fn weekly_highlight(
    branches: &[Branch],
    entries: &[Entry],
    now: DateTime<Utc>,
) -> WeeklyHighlight {
    let sums = weekly_sums(entries, now);
    let mut best: Option<(&Branch, i64)> = None;
    for branch in branches {
        let sum = sums.get(branch.id.as_str()).copied().unwrap_or(0);
        if sum > best.map_or(0, |(_, s)| s) {
            best = Some((branch, sum));
        }
    }

    best.map_or(WeeklyHighlight::Encouragement, |(branch, amount)| {
        WeeklyHighlight::Leader {
            branch_name: branch.name.clone(),
            amount,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, sample_branches, sample_entry};

    fn with_totals(totals: &[i64]) -> Vec<Branch> {
        sample_branches()
            .into_iter()
            .zip(totals)
            .map(|(mut b, t)| {
                b.total = *t;
                b
            })
            .collect()
    }

    fn ids(badges: &[Badge]) -> Vec<&str> {
        badges.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_goal_badges() {
        let now = at(2026, 10, 19, 12, 0);
        // santiago 1000 goal, moca 500 goal, la-vega no goal
        let branches = with_totals(&[1000, 249, 5000]);
        let ctx = RuleContext {
            entries: &[],
            branches: &branches,
            now,
        };

        assert_eq!(ids(&branch_badges(&branches[0], &ctx)), vec!["reach_goal", "half_way"]);
        assert!(branch_badges(&branches[1], &ctx).is_empty());
        // zero goal never earns goal badges
        assert!(branch_badges(&branches[2], &ctx).is_empty());
    }

    #[test]
    fn test_half_way_threshold_is_inclusive() {
        let branches = with_totals(&[0, 250, 0]);
        let ctx = RuleContext {
            entries: &[],
            branches: &branches,
            now: at(2026, 10, 19, 12, 0),
        };
        assert_eq!(ids(&branch_badges(&branches[1], &ctx)), vec!["half_way"]);
    }

    #[test]
    fn test_branch_of_the_week_ties_all_earn() {
        let now = at(2026, 10, 19, 12, 0);
        let branches = sample_branches();
        let entries = vec![
            sample_entry(1, at(2026, 10, 18, 12, 0), &[("santiago", 40), ("moca", 40)]),
            sample_entry(2, at(2026, 10, 17, 12, 0), &[("la-vega", 10)]),
        ];
        let ctx = RuleContext {
            entries: &entries,
            branches: &branches,
            now,
        };

        let earned: Vec<bool> = branches.iter().map(|b| top_of_week(b, &ctx)).collect();
        assert_eq!(earned, vec![true, true, false]);
    }

    #[test]
    fn test_old_and_deleted_entries_do_not_count_for_the_week() {
        let now = at(2026, 10, 19, 12, 0);
        let mut deleted = sample_entry(2, at(2026, 10, 18, 12, 0), &[("moca", 100)]);
        deleted.is_deleted = true;
        let entries = vec![
            sample_entry(1, at(2026, 10, 12, 11, 59), &[("santiago", 100)]),
            deleted,
        ];

        assert!(weekly_sums(&entries, now).is_empty());

        let branches = sample_branches();
        let ctx = RuleContext {
            entries: &entries,
            branches: &branches,
            now,
        };
        assert!(regional_badges(&ctx).is_empty());
        assert_eq!(
            weekly_highlight(&branches, &entries, now),
            WeeklyHighlight::Encouragement
        );
    }

    #[test]
    fn test_trailing_week_includes_boundary() {
        let now = at(2026, 10, 19, 12, 0);
        let entries = vec![sample_entry(1, at(2026, 10, 12, 12, 0), &[("moca", 7)])];
        assert_eq!(weekly_sums(&entries, now).get("moca"), Some(&7));
    }

    #[test]
    fn test_regional_badges_dedupe_in_rule_order() {
        let now = at(2026, 10, 19, 12, 0);
        let branches = with_totals(&[600, 500, 0]);
        let entries = vec![sample_entry(1, at(2026, 10, 18, 12, 0), &[("la-vega", 5)])];
        let ctx = RuleContext {
            entries: &entries,
            branches: &branches,
            now,
        };

        assert_eq!(
            ids(&regional_badges(&ctx)),
            vec!["reach_goal", "half_way", "strong_week_top"]
        );
    }

    #[test]
    fn test_weekly_highlight_picks_first_on_ties() {
        let now = at(2026, 10, 19, 12, 0);
        let branches = sample_branches();
        let entries = vec![
            sample_entry(1, at(2026, 10, 18, 12, 0), &[("moca", 1200), ("la-vega", 1200)]),
            sample_entry(2, at(2026, 10, 18, 13, 0), &[("santiago", 10)]),
        ];

        let highlight = weekly_highlight(&branches, &entries, now);
        assert_eq!(
            highlight,
            WeeklyHighlight::Leader {
                branch_name: "Moca".to_string(),
                amount: 1200
            }
        );
        assert_eq!(highlight.to_string(), "🏆 Strongest week: Moca with 1,200.");
    }

    #[test]
    fn test_earned_badge_carries_rule_description() {
        let branches = with_totals(&[1000, 0, 0]);
        let ctx = RuleContext {
            entries: &[],
            branches: &branches,
            now: at(2026, 10, 19, 12, 0),
        };
        let badges = branch_badges(&branches[0], &ctx);
        assert_eq!(badges[0].description, "Total at or above a non-zero goal");
        assert_eq!(badges[1].description, BADGE_RULES[1].description);
    }

    #[test]
    fn test_rules_are_in_display_order() {
        let rule_ids: Vec<&str> = BADGE_RULES.iter().map(|r| r.id).collect();
        assert_eq!(rule_ids, vec!["reach_goal", "half_way", "strong_week_top"]);
    }
}
