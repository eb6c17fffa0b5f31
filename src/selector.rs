use std::collections::{HashMap, HashSet};

use crate::edge::edge_of_learning_score;
use crate::models::{Exercise, MasteryForSkill};

/// Returns the next exercise in curriculum order.
///
/// Input is assumed to already be in curriculum order (unit -> skill -> lesson -> exercise).
/// Picks the first exercise the learner has not answered correctly; once every
/// exercise has a correct attempt, starts over from the first one as review.
pub fn select_next_exercise<'a>(
    exercises: impl IntoIterator<Item = &'a Exercise>,
    correct_attempts: &HashSet<String>,
) -> Option<&'a Exercise> {
    let mut first = None;
    for ex in exercises {
        if !correct_attempts.contains(&ex.id) {
            return Some(ex);
        }
        first.get_or_insert(ex);
    }
    first
}

/// Chooses the next exercise using due reviews, edge-of-learning and curriculum order.
///
/// Priority:
/// 1. skills whose spaced review is due,
/// 2. the skill scoring highest on [`edge_of_learning_score`] (only when mastery data exists),
/// 3. plain curriculum order.
///
/// `last_exercise_id` is never returned, so the learner is not shown the same
/// exercise twice in a row. Within a chosen group, exercises without a correct
/// attempt come first.
pub fn select_next_exercise_with_mastery<'a>(
    exercises: &'a [Exercise],
    correct_attempts: &HashSet<String>,
    mastery_by_skill: &HashMap<String, MasteryForSkill>,
    due_review_skill_ids: &HashSet<String>,
    last_exercise_id: Option<&str>,
) -> Option<&'a Exercise> {
    let candidates: Vec<&Exercise> = exercises
        .iter()
        .filter(|ex| Some(ex.id.as_str()) != last_exercise_id)
        .collect();
    if candidates.is_empty() {
        return None;
    }

    // 1. Due reviews
    let due = candidates
        .iter()
        .copied()
        .filter(|ex| due_review_skill_ids.contains(&ex.skill_id));
    if let Some(ex) = select_next_exercise(due, correct_attempts) {
        return Some(ex);
    }

    // 2. Edge of learning
    if !mastery_by_skill.is_empty() {
        for skill_id in rank_skills_by_edge(&candidates, mastery_by_skill) {
            let in_skill = candidates.iter().copied().filter(|ex| ex.skill_id == skill_id);
            if let Some(ex) = select_next_exercise(in_skill, correct_attempts) {
                return Some(ex);
            }
        }
    }

    // 3. Curriculum order
    select_next_exercise(candidates, correct_attempts)
}

/// Distinct skills among `candidates`, best edge-of-learning score first.
/// Equal scores keep first-appearance order.
fn rank_skills_by_edge<'a>(
    candidates: &[&'a Exercise],
    mastery_by_skill: &HashMap<String, MasteryForSkill>,
) -> Vec<&'a str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut scored: Vec<(&'a str, f64)> = Vec::new();
    for &ex in candidates {
        if !seen.insert(ex.skill_id.as_str()) {
            continue;
        }
        let m = mastery_by_skill.get(&ex.skill_id).copied().unwrap_or_default();
        scored.push((ex.skill_id.as_str(), edge_of_learning_score(m.mastery_probability, m.confidence_score)));
    }

    // sort_by is stable, which gives the first-appearance tiebreak
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(skill_id, _)| skill_id).collect()
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
