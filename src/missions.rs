//! Daily missions: a short, deterministic question set per learner, domain and day.
//!
//! The same `(learner, domain, date)` always produces the same mission. The
//! seed is the FNV-1a hash of `"{learner}:{domain}:{date}:{kind}"` feeding an
//! xorshift32 generator.

use serde::{Deserialize, Serialize};

use crate::data::READING_BANK;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionQuestion {
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub skill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionNode {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub predicted_struggle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub nodes: Vec<MissionNode>,
    pub questions: Vec<MissionQuestion>,
}

/// FNV-1a over UTF-16 code units.
pub fn hash_seed(input: &str) -> u32 {
    let mut h: u32 = 2166136261;
    for unit in input.encode_utf16() {
        h ^= u32::from(unit);
        h = h.wrapping_mul(16777619);
    }
    h
}

/// xorshift32 producing floats in `[0, 1)`.
pub struct MissionRng {
    state: u32,
}

impl MissionRng {
    pub fn new(key: &str) -> Self {
        let seed = hash_seed(key);
        Self { state: if seed == 0 { 1 } else { seed } }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        f64::from(self.state) / 4294967296.0
    }

    /// Uniform integer in `[min, max]`.
    pub fn pick_int(&mut self, min: i64, max: i64) -> i64 {
        (self.next_f64() * (max - min + 1) as f64).floor() as i64 + min
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_f64() * (i + 1) as f64).floor() as usize;
            items.swap(i, j);
        }
    }
}

fn base_nodes() -> Vec<MissionNode> {
    [
        ("warmup", "Warm-up", "Easy start", false),
        ("skill", "Skill", "Today\u{2019}s focus", false),
        ("practice", "Practice", "A few tries", true),
        ("miniBoss", "Mini Boss", "Show what you know", false),
        ("celebrate", "Celebrate", "Victory!", false),
    ]
    .into_iter()
    .map(|(id, title, subtitle, predicted_struggle)| MissionNode {
        id: id.to_string(),
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        predicted_struggle,
    })
    .collect()
}

fn mission_id(learner_id: &str, domain_id: &str, date_key: &str) -> String {
    format!("{learner_id}:{domain_id}:{date_key}")
}

/// Correct answer plus the first two of four draws within ±3 that miss it, shuffled.
/// Distractors may repeat; all four draws are always taken.
fn numeric_options(rng: &mut MissionRng, correct: i64) -> (Vec<String>, usize) {
    let draws: Vec<i64> = (0..4).map(|_| (correct + rng.pick_int(-3, 3)).max(0)).collect();
    let distractors = draws.into_iter().filter(|&n| n != correct).take(2);

    let mut options: Vec<String> = std::iter::once(correct)
        .chain(distractors)
        .map(|n| n.to_string())
        .collect();
    rng.shuffle(&mut options);
    let correct_str = correct.to_string();
    let correct_index = options.iter().position(|o| *o == correct_str).unwrap_or(0);
    (options, correct_index)
}

fn build_math_mission(learner_id: &str, domain_id: &str, date_key: &str) -> Mission {
    let mut rng = MissionRng::new(&format!("{learner_id}:{domain_id}:{date_key}:math"));
    let is_elle = learner_id == "elle";
    let within = if is_elle { 10 } else { 20 };

    let mut questions = Vec::with_capacity(3);
    for i in 0..3 {
        let add_not_sub = rng.next_f64() < 0.6;
        let a = rng.pick_int(1, within - 1);
        // Drawn in both branches so the sequence stays fixed; addition redraws it below.
        rng.pick_int(1, within - 1);

        let (prompt, correct, skill) = if add_not_sub {
            // keep the sum inside the band
            let max_b = (within - a).max(1);
            let b = rng.pick_int(1, max_b);
            let skill = if is_elle { "Adding within 10" } else { "Adding within 20" };
            (format!("{a} + {b} = ?"), a + b, skill)
        } else {
            let bigger = rng.pick_int((a + 1).max(2), within);
            let smaller = rng.pick_int(1, bigger - 1);
            let skill = if is_elle { "Subtracting within 10" } else { "Subtracting within 20" };
            (format!("{bigger} \u{2212} {smaller} = ?"), bigger - smaller, skill)
        };

        let (options, correct_index) = numeric_options(&mut rng, correct);
        questions.push(MissionQuestion {
            id: format!("q{}", i + 1),
            prompt,
            options,
            correct_index,
            skill: skill.to_string(),
        });
    }

    Mission {
        id: mission_id(learner_id, domain_id, date_key),
        title: if is_elle { "7-Day Star Trail" } else { "7-Day Math Quest" }.to_string(),
        nodes: base_nodes(),
        questions,
    }
}

fn build_reading_mission(learner_id: &str, domain_id: &str, date_key: &str) -> Mission {
    let mut rng = MissionRng::new(&format!("{learner_id}:{domain_id}:{date_key}:reading"));

    let mut bank: Vec<MissionQuestion> = READING_BANK
        .iter()
        .map(|q| MissionQuestion {
            id: q.id.to_string(),
            prompt: q.prompt.to_string(),
            options: q.options.iter().map(|o| o.to_string()).collect(),
            correct_index: q.correct_index,
            skill: q.skill.to_string(),
        })
        .collect();
    rng.shuffle(&mut bank);
    bank.truncate(3);

    Mission {
        id: mission_id(learner_id, domain_id, date_key),
        title: "Reading Mission".to_string(),
        nodes: base_nodes(),
        questions: bank,
    }
}

fn build_placeholder_mission(learner_id: &str, domain_id: &str, date_key: &str) -> Mission {
    let mut rng = MissionRng::new(&format!("{learner_id}:{domain_id}:{date_key}:placeholder"));
    let distractor = 1 + rng.pick_int(1, 3);

    let mut options = vec!["1".to_string(), "2".to_string(), distractor.to_string()];
    rng.shuffle(&mut options);
    let correct_index = options.iter().position(|o| o == "2").unwrap_or(0);

    Mission {
        id: mission_id(learner_id, domain_id, date_key),
        title: "Daily Mission".to_string(),
        nodes: base_nodes(),
        questions: vec![MissionQuestion {
            id: "placeholder-1".to_string(),
            prompt: "This is a practice question. What is 1 + 1?".to_string(),
            options,
            correct_index,
            skill: "Getting started".to_string(),
        }],
    }
}

/// Builds the mission for `learner_id` in `domain_id` on `date_key` (YYYY-MM-DD).
pub fn daily_mission(learner_id: &str, domain_id: &str, date_key: &str) -> Mission {
    match domain_id.to_lowercase().as_str() {
        "math" => build_math_mission(learner_id, domain_id, date_key),
        "reading" => build_reading_mission(learner_id, domain_id, date_key),
        _ => build_placeholder_mission(learner_id, domain_id, date_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(q: &MissionQuestion) -> i64 {
        q.options[q.correct_index].parse().unwrap()
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(hash_seed(""), 2166136261);
        assert_eq!(hash_seed("a"), 0xe40c292c);
    }

    #[test]
    fn test_rng_is_deterministic_and_in_range() {
        let mut a = MissionRng::new("liv:math:2025-03-01:math");
        let mut b = MissionRng::new("liv:math:2025-03-01:math");
        for _ in 0..1000 {
            let x = a.next_f64();
            assert_eq!(x, b.next_f64());
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_pick_int_bounds() {
        let mut rng = MissionRng::new("bounds");
        for _ in 0..1000 {
            let n = rng.pick_int(-3, 3);
            assert!((-3..=3).contains(&n));
        }
    }

    #[test]
    fn test_same_inputs_same_mission() {
        for domain in ["math", "reading", "art"] {
            assert_eq!(
                daily_mission("liv", domain, "2025-03-01"),
                daily_mission("liv", domain, "2025-03-01")
            );
        }
    }

    #[test]
    fn test_math_mission_shape() {
        for date in ["2025-03-01", "2025-03-02", "2025-12-31", "2026-01-01"] {
            for learner in ["liv", "elle"] {
                let mission = daily_mission(learner, "math", date);
                let band = if learner == "elle" { 10 } else { 20 };
                assert_eq!(mission.id, format!("{learner}:math:{date}"));
                assert_eq!(mission.questions.len(), 3);
                assert_eq!(mission.nodes.len(), 5);
                for q in &mission.questions {
                    let a = answer(q);
                    assert!((0..=band).contains(&a), "{} -> {a}", q.prompt);
                    assert!((1..=3).contains(&q.options.len()));
                    let hits = q.options.iter().filter(|o| o.parse::<i64>().unwrap() == a).count();
                    assert_eq!(hits, 1, "{:?}", q.options);
                    assert!(q.skill.ends_with(&format!("within {band}")));
                }
            }
        }
    }

    fn summary(mission: &Mission) -> Vec<(&str, Vec<&str>, usize)> {
        mission
            .questions
            .iter()
            .map(|q| (q.prompt.as_str(), q.options.iter().map(String::as_str).collect(), q.correct_index))
            .collect()
    }

    #[test]
    fn test_math_mission_is_pinned() {
        let mission = daily_mission("liv", "math", "2025-03-01");
        assert_eq!(
            summary(&mission),
            vec![
                ("5 + 3 = ?", vec!["8", "5", "9"], 0),
                ("20 \u{2212} 7 = ?", vec!["12", "13", "11"], 1),
                ("1 + 3 = ?", vec!["4", "2", "7"], 0),
            ]
        );
    }

    #[test]
    fn test_repeated_distractors_keep_later_questions_stable() {
        // The first two questions repeat a distractor.
        let mission = daily_mission("elle", "math", "2025-01-11");
        assert_eq!(
            summary(&mission),
            vec![
                ("6 + 1 = ?", vec!["10", "7", "10"], 1),
                ("7 + 2 = ?", vec!["6", "9", "6"], 1),
                ("8 + 2 = ?", vec!["10", "7", "12"], 0),
            ]
        );
    }

    #[test]
    fn test_math_titles_by_learner() {
        assert_eq!(daily_mission("elle", "math", "2025-03-01").title, "7-Day Star Trail");
        assert_eq!(daily_mission("liv", "Math", "2025-03-01").title, "7-Day Math Quest");
    }

    #[test]
    fn test_reading_mission_uses_bank() {
        let mission = daily_mission("liv", "reading", "2025-03-01");
        assert_eq!(mission.title, "Reading Mission");
        assert_eq!(mission.questions.len(), 3);
        let mut ids: Vec<_> = mission.questions.iter().map(|q| q.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["rhyme-1", "sight-1", "sound-1"]);
    }

    #[test]
    fn test_unknown_domain_is_placeholder() {
        let mission = daily_mission("liv", "spanish", "2025-03-01");
        assert_eq!(mission.title, "Daily Mission");
        assert_eq!(mission.questions.len(), 1);
        let q = &mission.questions[0];
        assert_eq!(q.options[q.correct_index], "2");
    }

    #[test]
    fn test_practice_node_predicts_struggle() {
        let nodes = daily_mission("liv", "math", "2025-03-01").nodes;
        let flagged: Vec<_> = nodes.iter().filter(|n| n.predicted_struggle).map(|n| n.id.as_str()).collect();
        assert_eq!(flagged, vec!["practice"]);
    }
}
