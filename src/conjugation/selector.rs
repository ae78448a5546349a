//! Adaptive rule selection and unlock progression.
//!
//! Selection merges three short lists over the unlocked rules: weak rules
//! (low accuracy with enough evidence), recently practiced rules, and the
//! most recently unlocked rules, then tops up with the least practiced.

use std::collections::HashMap;

use crate::config::DrillConfig;
use crate::models::conjugation::{RuleStats, VerbRule};

/// Selection limits derived from [`DrillConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionParams {
    /// Upper bound on selected rules.
    pub rules_per_session: usize,
    /// Accuracy below which a rule is weak.
    pub weak_accuracy_threshold: f64,
    /// Attempts required before accuracy is trusted.
    pub min_attempts: u32,
    /// Maximum weak rules.
    pub weak_limit: usize,
    /// Maximum recently practiced rules.
    pub recent_limit: usize,
    /// Maximum most-recently-unlocked rules.
    pub newest_limit: usize,
}

impl From<&DrillConfig> for SelectionParams {
    fn from(config: &DrillConfig) -> Self {
        let to_usize = |v: u32| usize::try_from(v).unwrap_or(usize::MAX);
        Self {
            rules_per_session: to_usize(config.rules_per_session),
            weak_accuracy_threshold: config.weak_accuracy_threshold,
            min_attempts: config.min_attempts,
            weak_limit: to_usize(config.weak_limit),
            recent_limit: to_usize(config.recent_limit),
            newest_limit: to_usize(config.newest_limit),
        }
    }
}

/// Index statistics by rule identifier.
#[must_use]
pub fn index_stats(stats: Vec<RuleStats>) -> HashMap<String, RuleStats> {
    stats
        .into_iter()
        .map(|s| (s.rule_id.clone(), s))
        .collect()
}

fn stats_for<'s>(stats: &'s HashMap<String, RuleStats>, rule: &VerbRule) -> Option<&'s RuleStats> {
    stats.get(&rule.id)
}

fn attempts_of(stats: &HashMap<String, RuleStats>, rule: &VerbRule) -> u32 {
    stats_for(stats, rule).map_or(0, |s| s.attempts)
}

fn contains(chosen: &[&VerbRule], rule: &VerbRule) -> bool {
    chosen.iter().any(|c| c.id == rule.id)
}

/// Choose the rules a new drill session draws from.
///
/// Locked rules in `rules` are ignored. The result preserves merge order:
/// weak, then recent, then newest, then least-practiced fill.
#[must_use]
pub fn select_rules<'a>(
    rules: &'a [VerbRule],
    stats: &HashMap<String, RuleStats>,
    params: &SelectionParams,
) -> Vec<&'a VerbRule> {
    let unlocked: Vec<&VerbRule> = rules.iter().filter(|r| r.is_unlocked()).collect();
    let mut chosen: Vec<&VerbRule> = Vec::with_capacity(params.rules_per_session);

    let mut weak: Vec<(&VerbRule, &RuleStats)> = unlocked
        .iter()
        .filter_map(|rule| stats_for(stats, rule).map(|s| (*rule, s)))
        .filter(|(_, s)| {
            s.attempts >= params.min_attempts && s.accuracy() < params.weak_accuracy_threshold
        })
        .collect();
    weak.sort_by(|(ra, sa), (rb, sb)| {
        sa.accuracy()
            .total_cmp(&sb.accuracy())
            .then(sb.attempts.cmp(&sa.attempts))
            .then(ra.unlock_order.cmp(&rb.unlock_order))
    });
    chosen.extend(weak.into_iter().take(params.weak_limit).map(|(rule, _)| rule));

    let mut recent: Vec<(&VerbRule, &RuleStats)> = unlocked
        .iter()
        .filter(|rule| !contains(&chosen, rule))
        .filter_map(|rule| stats_for(stats, rule).map(|s| (*rule, s)))
        .filter(|(_, s)| s.last_practiced_at.is_some())
        .collect();
    recent.sort_by(|(ra, sa), (rb, sb)| {
        sb.last_practiced_at
            .cmp(&sa.last_practiced_at)
            .then(ra.unlock_order.cmp(&rb.unlock_order))
    });
    let recent: Vec<&VerbRule> = recent
        .into_iter()
        .take(params.recent_limit)
        .map(|(rule, _)| rule)
        .collect();
    chosen.extend(recent);

    let mut newest: Vec<&VerbRule> = unlocked
        .iter()
        .copied()
        .filter(|rule| !contains(&chosen, rule))
        .collect();
    newest.sort_by(|a, b| {
        b.unlocked_at
            .cmp(&a.unlocked_at)
            .then(b.unlock_order.cmp(&a.unlock_order))
    });
    let newest: Vec<&VerbRule> = newest.into_iter().take(params.newest_limit).collect();
    chosen.extend(newest);

    if chosen.len() < params.rules_per_session {
        let mut fill: Vec<&VerbRule> = unlocked
            .iter()
            .copied()
            .filter(|rule| !contains(&chosen, rule))
            .collect();
        fill.sort_by(|a, b| {
            attempts_of(stats, a)
                .cmp(&attempts_of(stats, b))
                .then(a.unlock_order.cmp(&b.unlock_order))
        });
        let missing = params.rules_per_session - chosen.len();
        chosen.extend(fill.into_iter().take(missing));
    }

    chosen.truncate(params.rules_per_session);
    chosen
}

/// The rule to unlock next, if every unlocked rule has been mastered.
///
/// Mastery means at least `min_attempts` attempts with accuracy of at
/// least `threshold`. Returns `None` when mastery is incomplete or every
/// rule is already unlocked.
#[must_use]
pub fn next_unlock<'a>(
    rules: &'a [VerbRule],
    stats: &HashMap<String, RuleStats>,
    min_attempts: u32,
    threshold: f64,
) -> Option<&'a VerbRule> {
    let mastered = rules.iter().filter(|r| r.is_unlocked()).all(|rule| {
        stats_for(stats, rule)
            .is_some_and(|s| s.attempts >= min_attempts && s.accuracy() >= threshold)
    });
    if !mastered {
        return None;
    }

    rules
        .iter()
        .filter(|r| !r.is_unlocked())
        .min_by_key(|r| r.unlock_order)
}
