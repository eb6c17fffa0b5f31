use serde::{Deserialize, Serialize};

/// How a committed 7-day challenge reacts to a missed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStyle {
    /// Missing a day resets the streak and the challenge.
    Strict,
    /// Missing a day trims the streak but keeps the challenge going.
    Gentle,
}

impl ChallengeStyle {
    pub fn missed_day_message(self) -> &'static str {
        match self {
            ChallengeStyle::Strict => {
                "We missed a day. That\u{2019}s okay, want to start again today and keep the streak going?"
            }
            ChallengeStyle::Gentle => "We missed a day. That\u{2019}s okay, we can keep going today. \u{1f49b}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub id: String,
    pub display_name: String,
    pub age: u32,
    pub grade_label: String,
    pub challenge_style: ChallengeStyle,
}

/// Looks up a built-in learner. Unknown ids get a gentle generic profile
/// named after the id.
pub fn learner_profile(raw: &str) -> LearnerProfile {
    match raw.to_lowercase().as_str() {
        "liv" => LearnerProfile {
            id: "liv".to_string(),
            display_name: "Liv".to_string(),
            age: 7,
            grade_label: "Grade 2".to_string(),
            challenge_style: ChallengeStyle::Strict,
        },
        "elle" => LearnerProfile {
            id: "elle".to_string(),
            display_name: "Elle".to_string(),
            age: 5,
            grade_label: "Grade 1".to_string(),
            challenge_style: ChallengeStyle::Gentle,
        },
        _ => LearnerProfile {
            id: raw.to_string(),
            display_name: capitalize(raw).unwrap_or_else(|| "Learner".to_string()),
            age: 0,
            grade_label: "Learner".to_string(),
            challenge_style: ChallengeStyle::Gentle,
        },
    }
}

fn capitalize(raw: &str) -> Option<String> {
    let mut chars = raw.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_learners() {
        let liv = learner_profile("Liv");
        assert_eq!(liv.age, 7);
        assert_eq!(liv.challenge_style, ChallengeStyle::Strict);

        let elle = learner_profile("elle");
        assert_eq!(elle.grade_label, "Grade 1");
        assert_eq!(elle.challenge_style, ChallengeStyle::Gentle);
    }

    #[test]
    fn test_unknown_learner_fallback() {
        let p = learner_profile("maya");
        assert_eq!(p.display_name, "Maya");
        assert_eq!(p.age, 0);
        assert_eq!(p.grade_label, "Learner");
        assert_eq!(p.challenge_style, ChallengeStyle::Gentle);

        assert_eq!(learner_profile("").display_name, "Learner");
    }
}
