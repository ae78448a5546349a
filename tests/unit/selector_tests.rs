//! Adaptive rule selection and unlock progression.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use hablemos::config::DrillConfig;
use hablemos::conjugation::selector::{
    index_stats, next_unlock, select_rules, SelectionParams,
};
use hablemos::models::conjugation::{Mood, RuleStats, VerbRule};

fn rule(order: i64, unlocked_at: Option<DateTime<Utc>>) -> VerbRule {
    VerbRule {
        id: format!("r{order}"),
        name: format!("Rule {order}"),
        tense: "present".into(),
        mood: Mood::Indicative,
        description: String::new(),
        example_verbs: vec!["hablar".into()],
        unlock_order: order,
        unlocked_at,
    }
}

/// Rules 1..=n, unlocked an hour apart so higher orders are newer.
fn unlocked_rules(n: i64) -> Vec<VerbRule> {
    let base = Utc::now() - Duration::days(1);
    (1..=n)
        .map(|order| rule(order, Some(base + Duration::hours(order))))
        .collect()
}

fn stats(id: &str, attempts: u32, correct: u32, minutes_ago: Option<i64>) -> RuleStats {
    RuleStats {
        rule_id: id.into(),
        attempts,
        correct,
        last_practiced_at: minutes_ago.map(|m| Utc::now() - Duration::minutes(m)),
    }
}

fn params(rules_per_session: usize) -> SelectionParams {
    SelectionParams {
        rules_per_session,
        weak_accuracy_threshold: 0.7,
        min_attempts: 5,
        weak_limit: 2,
        recent_limit: 1,
        newest_limit: 2,
    }
}

fn ids<'a>(rules: &[&'a VerbRule]) -> Vec<&'a str> {
    rules.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn params_follow_drill_config() {
    let p = SelectionParams::from(&DrillConfig::default());
    assert_eq!(p.rules_per_session, 4);
    assert_eq!(p.weak_limit, 2);
    assert_eq!(p.recent_limit, 1);
    assert_eq!(p.newest_limit, 2);
    assert_eq!(p.min_attempts, 5);
}

#[test]
fn fresh_learner_gets_newest_rules() {
    let rules = unlocked_rules(3);
    let chosen = select_rules(&rules, &HashMap::new(), &params(4));
    // No stats: newest two first, then least-practiced fill by order.
    assert_eq!(ids(&chosen), vec!["r3", "r2", "r1"]);
}

#[test]
fn locked_rules_are_never_selected() {
    let mut rules = unlocked_rules(2);
    rules.push(rule(3, None));
    let chosen = select_rules(&rules, &HashMap::new(), &params(4));
    assert!(!ids(&chosen).contains(&"r3"));
    assert_eq!(chosen.len(), 2);
}

#[test]
fn weak_rules_come_first_weakest_first() {
    let rules = unlocked_rules(6);
    let stats = index_stats(vec![
        stats("r1", 10, 6, Some(300)),
        stats("r2", 10, 2, Some(200)),
        stats("r3", 10, 9, Some(100)),
        // Too few attempts to be judged weak.
        stats("r4", 2, 0, Some(400)),
    ]);

    let chosen = select_rules(&rules, &stats, &params(4));
    let chosen = ids(&chosen);
    assert_eq!(&chosen[..2], &["r2", "r1"]);
}

#[test]
fn recent_then_newest_follow_weak() {
    let rules = unlocked_rules(6);
    let stats = index_stats(vec![
        stats("r1", 10, 3, Some(500)),
        stats("r2", 10, 10, Some(5)),
        stats("r3", 10, 10, Some(50)),
    ]);

    let chosen = select_rules(&rules, &stats, &params(4));
    // weak r1, most recent r2, newest r6 and r5.
    assert_eq!(ids(&chosen), vec!["r1", "r2", "r6", "r5"]);
}

#[test]
fn result_is_truncated_and_duplicate_free() {
    let rules = unlocked_rules(8);
    let stats = index_stats(vec![
        stats("r8", 10, 1, Some(1)),
        stats("r7", 10, 2, Some(2)),
    ]);

    let chosen = select_rules(&rules, &stats, &params(3));
    let chosen = ids(&chosen);
    assert_eq!(chosen.len(), 3);
    let mut unique = chosen.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), chosen.len());
    assert_eq!(&chosen[..2], &["r8", "r7"]);
}

#[test]
fn fill_prefers_least_practiced() {
    let rules = unlocked_rules(5);
    let stats = index_stats(vec![
        stats("r1", 20, 20, Some(10)),
        stats("r2", 1, 1, Some(20)),
        stats("r3", 3, 3, Some(30)),
    ]);
    let p = SelectionParams {
        weak_limit: 0,
        recent_limit: 0,
        newest_limit: 0,
        ..params(2)
    };

    let chosen = select_rules(&rules, &stats, &p);
    assert_eq!(ids(&chosen), vec!["r4", "r5"]);
}

#[test]
fn no_unlocked_rules_selects_nothing() {
    let rules = vec![rule(1, None), rule(2, None)];
    assert!(select_rules(&rules, &HashMap::new(), &params(4)).is_empty());
}

#[test]
fn next_unlock_requires_mastery_of_every_unlocked_rule() {
    let mut rules = unlocked_rules(2);
    rules.push(rule(4, None));
    rules.push(rule(3, None));

    let partial = index_stats(vec![stats("r1", 10, 9, None), stats("r2", 3, 3, None)]);
    assert!(next_unlock(&rules, &partial, 5, 0.8).is_none());

    let inaccurate = index_stats(vec![stats("r1", 10, 9, None), stats("r2", 10, 7, None)]);
    assert!(next_unlock(&rules, &inaccurate, 5, 0.8).is_none());

    let mastered = index_stats(vec![stats("r1", 10, 9, None), stats("r2", 5, 4, None)]);
    let next = next_unlock(&rules, &mastered, 5, 0.8).expect("a rule unlocks");
    assert_eq!(next.id, "r3");
}

#[test]
fn next_unlock_is_none_when_everything_is_unlocked() {
    let rules = unlocked_rules(2);
    let mastered = index_stats(vec![stats("r1", 10, 10, None), stats("r2", 10, 10, None)]);
    assert!(next_unlock(&rules, &mastered, 5, 0.8).is_none());
}
