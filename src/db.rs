use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous}, ConnectOptions, Pool, Row, Sqlite};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use anyhow::Context;
use log::{debug, info};
use uuid::Uuid;

use crate::data::{SeedSkill, CURRICULUM, PROFILES};
use crate::error::NotFound;
use crate::learners::ChallengeStyle;
use crate::mastery::update_mastery_from_counts;
use crate::models::{Attempt, Exercise, MasteryForSkill, ReviewScheduleEntry, SkillMasteryState};
use crate::selector::select_next_exercise_with_mastery;
use crate::srs::schedule_next_review;
use crate::streak::XpStreakState;

/// How many recent attempts the parent overview shows per child.
const PARENT_ATTEMPT_LIMIT: i64 = 50;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS domains (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS units (
        id TEXT PRIMARY KEY,
        domain_id TEXT NOT NULL REFERENCES domains(id),
        title TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS skills (
        id TEXT PRIMARY KEY,
        domain_id TEXT NOT NULL REFERENCES domains(id),
        unit_id TEXT REFERENCES units(id),
        name TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS lessons (
        id TEXT PRIMARY KEY,
        skill_id TEXT NOT NULL REFERENCES skills(id),
        title TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS exercises (
        id TEXT PRIMARY KEY,
        lesson_id TEXT NOT NULL REFERENCES lessons(id),
        prompt TEXT NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        display_name TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL,
        parent_id TEXT REFERENCES profiles(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attempts (
        id TEXT PRIMARY KEY,
        learner_id TEXT NOT NULL,
        exercise_id TEXT NOT NULL REFERENCES exercises(id),
        correct BOOLEAN NOT NULL,
        created_at DATETIME NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS attempts_learner_idx ON attempts (learner_id, exercise_id)",
    r#"
    CREATE TABLE IF NOT EXISTS skill_mastery (
        learner_id TEXT NOT NULL,
        skill_id TEXT NOT NULL REFERENCES skills(id),
        mastery_probability REAL NOT NULL,
        confidence_score REAL NOT NULL,
        attempts_count INTEGER NOT NULL,
        last_attempt_at DATETIME,
        next_review_at DATETIME,
        updated_at DATETIME NOT NULL,
        PRIMARY KEY (learner_id, skill_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS review_schedule (
        learner_id TEXT NOT NULL,
        skill_id TEXT NOT NULL REFERENCES skills(id),
        next_review_at DATETIME NOT NULL,
        PRIMARY KEY (learner_id, skill_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS learning_sessions (
        id TEXT PRIMARY KEY,
        learner_id TEXT NOT NULL,
        domain TEXT NOT NULL,
        status TEXT NOT NULL,
        started_at DATETIME NOT NULL,
        ended_at DATETIME
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS xp_streaks (
        learner_id TEXT NOT NULL,
        domain_id TEXT NOT NULL REFERENCES domains(id),
        xp INTEGER NOT NULL DEFAULT 0,
        streak INTEGER NOT NULL DEFAULT 0,
        challenge_day INTEGER NOT NULL DEFAULT 0,
        committed BOOLEAN NOT NULL DEFAULT 0,
        last_completed_date DATE,
        updated_at DATETIME NOT NULL,
        PRIMARY KEY (learner_id, domain_id)
    )
    "#,
];

impl<'r> sqlx::FromRow<'r, SqliteRow> for Exercise {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Exercise {
            id: row.try_get("id")?,
            lesson_id: row.try_get("lesson_id")?,
            skill_id: row.try_get("skill_id")?,
            prompt: row.try_get("prompt")?,
            sort_order: row.try_get("sort_order")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for Attempt {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Attempt {
            id: row.try_get("id")?,
            learner_id: row.try_get("learner_id")?,
            exercise_id: row.try_get("exercise_id")?,
            correct: row.try_get("correct")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for SkillMasteryState {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SkillMasteryState {
            learner_id: row.try_get("learner_id")?,
            skill_id: row.try_get("skill_id")?,
            mastery_probability: row.try_get("mastery_probability")?,
            confidence_score: row.try_get("confidence_score")?,
            attempts_count: row.try_get("attempts_count")?,
            last_attempt_at: row.try_get("last_attempt_at")?,
            next_review_at: row.try_get("next_review_at")?,
        })
    }
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for ReviewScheduleEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ReviewScheduleEntry {
            learner_id: row.try_get("learner_id")?,
            skill_id: row.try_get("skill_id")?,
            next_review_at: row.try_get("next_review_at")?,
        })
    }
}

/// A domain's exercises in curriculum order.
#[derive(Debug, Clone)]
pub struct DomainCurriculum {
    pub domain_id: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub id: String,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterySummary {
    pub skill_id: String,
    pub skill_name: String,
    pub mastery_probability: f64,
    pub confidence_score: f64,
    pub attempts_count: i64,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildProgress {
    pub id: String,
    pub display_name: String,
    pub role: String,
    pub attempts: Vec<AttemptSummary>,
    pub mastery: Vec<MasterySummary>,
}

/// Builds the selector's view of a learner: mastery per skill, with review rows
/// folded in, and the set of skills due at `now`.
///
/// A review row for a skill without a mastery row counts as an untried skill
/// (prior mean, zero confidence). A skill is due when either source says so.
pub fn merge_review_state(
    mastery_rows: &[SkillMasteryState],
    review_rows: &[ReviewScheduleEntry],
    now: DateTime<Utc>,
) -> (HashMap<String, MasteryForSkill>, HashSet<String>) {
    let mut mastery_by_skill: HashMap<String, MasteryForSkill> = mastery_rows
        .iter()
        .map(|m| {
            (
                m.skill_id.clone(),
                MasteryForSkill {
                    mastery_probability: m.mastery_probability,
                    confidence_score: m.confidence_score,
                    next_review_at: m.next_review_at,
                },
            )
        })
        .collect();

    let mut due: HashSet<String> = mastery_by_skill
        .iter()
        .filter(|(_, m)| m.is_due(now))
        .map(|(skill_id, _)| skill_id.clone())
        .collect();

    for r in review_rows {
        let entry = mastery_by_skill.entry(r.skill_id.clone()).or_default();
        entry.next_review_at = Some(r.next_review_at);
        if entry.is_due(now) {
            due.insert(r.skill_id.clone());
        }
    }

    (mastery_by_skill, due)
}

#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

impl Db {
    /// Opens (creating if needed) the database at `database_url` and applies the schema.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url: {database_url}"))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .log_statements(log::LevelFilter::Trace);

        // Every connection to an in-memory database is its own database, so
        // keep exactly one and never recycle it.
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<std::time::Duration>)
                .max_lifetime(None::<std::time::Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        let db = Db { pool };
        db.migrate().await?;
        info!("database ready at {}", database_url);

        Ok(db)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Seeds the demo curriculum and profiles into an empty database.
    pub async fn seed_demo_data_if_empty(&self) -> anyhow::Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM domains")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for (d_order, domain) in CURRICULUM.iter().enumerate() {
            sqlx::query("INSERT INTO domains (id, slug, name) VALUES (?, ?, ?)")
                .bind(domain.id)
                .bind(domain.slug)
                .bind(domain.name)
                .execute(&mut *tx)
                .await?;

            let mut skills: Vec<(Option<&str>, &SeedSkill)> = Vec::new();
            for (u_order, unit) in domain.units.iter().enumerate() {
                sqlx::query("INSERT INTO units (id, domain_id, title, sort_order) VALUES (?, ?, ?, ?)")
                    .bind(unit.id)
                    .bind(domain.id)
                    .bind(unit.title)
                    .bind(u_order as i64)
                    .execute(&mut *tx)
                    .await?;
                skills.extend(unit.skills.iter().map(|s| (Some(unit.id), s)));
            }
            skills.extend(domain.skills.iter().map(|s| (None, s)));

            for (s_order, (unit_id, skill)) in skills.into_iter().enumerate() {
                sqlx::query("INSERT INTO skills (id, domain_id, unit_id, name, sort_order) VALUES (?, ?, ?, ?, ?)")
                    .bind(skill.id)
                    .bind(domain.id)
                    .bind(unit_id)
                    .bind(skill.name)
                    .bind(s_order as i64)
                    .execute(&mut *tx)
                    .await?;

                for (l_order, lesson) in skill.lessons.iter().enumerate() {
                    sqlx::query("INSERT INTO lessons (id, skill_id, title, sort_order) VALUES (?, ?, ?, ?)")
                        .bind(lesson.id)
                        .bind(skill.id)
                        .bind(lesson.title)
                        .bind(l_order as i64)
                        .execute(&mut *tx)
                        .await?;

                    for (e_order, (exercise_id, prompt)) in lesson.exercises.iter().enumerate() {
                        sqlx::query("INSERT INTO exercises (id, lesson_id, prompt, sort_order) VALUES (?, ?, ?, ?)")
                            .bind(*exercise_id)
                            .bind(lesson.id)
                            .bind(*prompt)
                            .bind(e_order as i64)
                            .execute(&mut *tx)
                            .await?;
                    }
                }
            }
            debug!("seeded domain {} ({})", domain.slug, d_order);
        }

        for profile in PROFILES {
            sqlx::query("INSERT INTO profiles (id, display_name, role, parent_id) VALUES (?, ?, ?, ?)")
                .bind(profile.id)
                .bind(profile.display_name)
                .bind(profile.role)
                .bind(profile.parent_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("seeded demo curriculum: {} domains, {} profiles", CURRICULUM.len(), PROFILES.len());
        Ok(())
    }

    async fn domain_id_by_slug(&self, domain_slug: &str) -> anyhow::Result<Option<String>> {
        let id = sqlx::query_scalar("SELECT id FROM domains WHERE slug = ?")
            .bind(domain_slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    /// Exercises of a domain ordered unit -> skill -> lesson -> exercise.
    /// Skills outside any unit come after those inside one.
    pub async fn domain_curriculum(&self, domain_slug: &str) -> anyhow::Result<Option<DomainCurriculum>> {
        let Some(domain_id) = self.domain_id_by_slug(domain_slug).await? else {
            return Ok(None);
        };

        let exercises = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT e.id, e.lesson_id, l.skill_id, e.prompt, e.sort_order
            FROM exercises e
            JOIN lessons l ON l.id = e.lesson_id
            JOIN skills s ON s.id = l.skill_id
            LEFT JOIN units u ON u.id = s.unit_id
            WHERE s.domain_id = ?
            ORDER BY
                (u.id IS NULL) ASC,
                u.sort_order ASC, u.id ASC,
                s.sort_order ASC, s.id ASC,
                l.sort_order ASC, l.id ASC,
                e.sort_order ASC, e.id ASC
            "#,
        )
        .bind(&domain_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(DomainCurriculum { domain_id, exercises }))
    }

    /// Ids of every exercise the learner has answered correctly at least once.
    pub async fn correct_exercise_ids(&self, learner_id: &str) -> anyhow::Result<HashSet<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT exercise_id FROM attempts WHERE learner_id = ? AND correct = 1",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn mastery_rows(&self, learner_id: &str, domain_id: &str) -> anyhow::Result<Vec<SkillMasteryState>> {
        let rows = sqlx::query_as::<_, SkillMasteryState>(
            r#"
            SELECT m.learner_id, m.skill_id, m.mastery_probability, m.confidence_score,
                   m.attempts_count, m.last_attempt_at, m.next_review_at
            FROM skill_mastery m
            JOIN skills s ON s.id = m.skill_id
            WHERE m.learner_id = ? AND s.domain_id = ?
            "#,
        )
        .bind(learner_id)
        .bind(domain_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn review_rows(&self, learner_id: &str, domain_id: &str) -> anyhow::Result<Vec<ReviewScheduleEntry>> {
        let rows = sqlx::query_as::<_, ReviewScheduleEntry>(
            r#"
            SELECT r.learner_id, r.skill_id, r.next_review_at
            FROM review_schedule r
            JOIN skills s ON s.id = r.skill_id
            WHERE r.learner_id = ? AND s.domain_id = ?
            "#,
        )
        .bind(learner_id)
        .bind(domain_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn skill_mastery(&self, learner_id: &str, skill_id: &str) -> anyhow::Result<Option<SkillMasteryState>> {
        let row = sqlx::query_as::<_, SkillMasteryState>(
            r#"
            SELECT learner_id, skill_id, mastery_probability, confidence_score,
                   attempts_count, last_attempt_at, next_review_at
            FROM skill_mastery
            WHERE learner_id = ? AND skill_id = ?
            "#,
        )
        .bind(learner_id)
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn review_entry(&self, learner_id: &str, skill_id: &str) -> anyhow::Result<Option<ReviewScheduleEntry>> {
        let row = sqlx::query_as::<_, ReviewScheduleEntry>(
            "SELECT learner_id, skill_id, next_review_at FROM review_schedule WHERE learner_id = ? AND skill_id = ?",
        )
        .bind(learner_id)
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// A learner's attempt log, oldest first.
    pub async fn attempts(&self, learner_id: &str) -> anyhow::Result<Vec<Attempt>> {
        let rows = sqlx::query_as::<_, Attempt>(
            "SELECT id, learner_id, exercise_id, correct, created_at FROM attempts WHERE learner_id = ? ORDER BY created_at, rowid",
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Next exercise for a learner in a domain, or `None` if the domain is
    /// unknown or has nothing left to offer after excluding `last_exercise_id`.
    pub async fn next_exercise(
        &self,
        learner_id: &str,
        domain_slug: &str,
        last_exercise_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Exercise>> {
        let Some(curriculum) = self.domain_curriculum(domain_slug).await? else {
            debug!("next_exercise: unknown domain {}", domain_slug);
            return Ok(None);
        };
        if curriculum.exercises.is_empty() {
            return Ok(None);
        }

        let correct = self.correct_exercise_ids(learner_id).await?;
        let mastery_rows = self.mastery_rows(learner_id, &curriculum.domain_id).await?;
        let review_rows = self.review_rows(learner_id, &curriculum.domain_id).await?;
        let (mastery_by_skill, due) = merge_review_state(&mastery_rows, &review_rows, now);

        let next = select_next_exercise_with_mastery(
            &curriculum.exercises,
            &correct,
            &mastery_by_skill,
            &due,
            last_exercise_id,
        );
        debug!(
            "next_exercise: learner={} domain={} due={} -> {:?}",
            learner_id,
            domain_slug,
            due.len(),
            next.map(|e| e.id.as_str())
        );
        Ok(next.cloned())
    }

    /// Records an answer and refreshes the learner's mastery and review schedule for the skill.
    pub async fn submit_answer(
        &self,
        learner_id: &str,
        exercise_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SkillMasteryState> {
        let skill_id: String = sqlx::query_scalar(
            "SELECT l.skill_id FROM exercises e JOIN lessons l ON l.id = e.lesson_id WHERE e.id = ?",
        )
        .bind(exercise_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| NotFound::new("exercise", exercise_id))?;

        let mut tx = self.pool.begin().await?;

        // Append first so this transaction holds the write lock before the counts are read.
        sqlx::query("INSERT INTO attempts (id, learner_id, exercise_id, correct, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(learner_id)
            .bind(exercise_id)
            .bind(correct)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        // Mastery is always recomputed from the log, never incremented in place.
        let (total, total_correct): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(a.correct), 0)
            FROM attempts a
            JOIN exercises e ON e.id = a.exercise_id
            JOIN lessons l ON l.id = e.lesson_id
            WHERE a.learner_id = ? AND l.skill_id = ?
            "#,
        )
        .bind(learner_id)
        .bind(&skill_id)
        .fetch_one(&mut *tx)
        .await?;

        let update = update_mastery_from_counts(total - 1, total_correct - i64::from(correct), correct)?;
        let next_review_at = schedule_next_review(correct, update.mastery_probability, now);

        sqlx::query(
            r#"
            INSERT INTO skill_mastery
                (learner_id, skill_id, mastery_probability, confidence_score, attempts_count,
                 last_attempt_at, next_review_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (learner_id, skill_id) DO UPDATE SET
                mastery_probability = excluded.mastery_probability,
                confidence_score = excluded.confidence_score,
                attempts_count = excluded.attempts_count,
                last_attempt_at = excluded.last_attempt_at,
                next_review_at = excluded.next_review_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(learner_id)
        .bind(&skill_id)
        .bind(update.mastery_probability)
        .bind(update.confidence_score)
        .bind(update.attempts_count)
        .bind(now)
        .bind(next_review_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO review_schedule (learner_id, skill_id, next_review_at)
            VALUES (?, ?, ?)
            ON CONFLICT (learner_id, skill_id) DO UPDATE SET next_review_at = excluded.next_review_at
            "#,
        )
        .bind(learner_id)
        .bind(&skill_id)
        .bind(next_review_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            "answer learner={} exercise={} correct={} -> p={:.3} n={} next={}",
            learner_id, exercise_id, correct, update.mastery_probability, update.attempts_count, next_review_at
        );

        Ok(SkillMasteryState {
            learner_id: learner_id.to_string(),
            skill_id,
            mastery_probability: update.mastery_probability,
            confidence_score: update.confidence_score,
            attempts_count: update.attempts_count,
            last_attempt_at: Some(now),
            next_review_at: Some(next_review_at),
        })
    }

    pub async fn start_session(&self, learner_id: &str, domain: &str, now: DateTime<Utc>) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO learning_sessions (id, learner_id, domain, status, started_at) VALUES (?, ?, ?, 'active', ?)",
        )
        .bind(&id)
        .bind(learner_id)
        .bind(domain)
        .bind(now)
        .execute(&self.pool)
        .await?;
        info!("session {} started for {} in {}", id, learner_id, domain);
        Ok(id)
    }

    pub async fn end_session(&self, learner_id: &str, session_id: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let result = sqlx::query(
            "UPDATE learning_sessions SET status = 'completed', ended_at = ? WHERE id = ? AND learner_id = ?",
        )
        .bind(now)
        .bind(session_id)
        .bind(learner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NotFound::new("session", session_id).into());
        }
        Ok(())
    }

    pub async fn session_status(&self, session_id: &str) -> anyhow::Result<Option<String>> {
        let status = sqlx::query_scalar("SELECT status FROM learning_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(status)
    }

    /// XP/streak state; a learner with no row (or an unknown domain) starts at zero.
    pub async fn xp_state(&self, learner_id: &str, domain_slug: &str) -> anyhow::Result<XpStreakState> {
        let row = sqlx::query(
            r#"
            SELECT x.xp, x.streak, x.challenge_day, x.committed, x.last_completed_date
            FROM xp_streaks x
            JOIN domains d ON d.id = x.domain_id
            WHERE x.learner_id = ? AND d.slug = ?
            "#,
        )
        .bind(learner_id)
        .bind(domain_slug)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(XpStreakState::default());
        };

        Ok(XpStreakState {
            xp: row.try_get("xp")?,
            streak: row.try_get("streak")?,
            challenge_day: row.try_get("challenge_day")?,
            committed: row.try_get("committed")?,
            last_completed_date: row.try_get::<Option<NaiveDate>, _>("last_completed_date")?,
        })
    }

    /// When the XP row was last written, if it exists.
    pub async fn xp_updated_at(&self, learner_id: &str, domain_slug: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
        let at = sqlx::query_scalar(
            r#"
            SELECT x.updated_at
            FROM xp_streaks x
            JOIN domains d ON d.id = x.domain_id
            WHERE x.learner_id = ? AND d.slug = ?
            "#,
        )
        .bind(learner_id)
        .bind(domain_slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(at)
    }

    pub async fn save_xp_state(
        &self,
        learner_id: &str,
        domain_slug: &str,
        state: &XpStreakState,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let domain_id = self
            .domain_id_by_slug(domain_slug)
            .await?
            .ok_or_else(|| NotFound::new("domain", domain_slug))?;

        sqlx::query(
            r#"
            INSERT INTO xp_streaks
                (learner_id, domain_id, xp, streak, challenge_day, committed, last_completed_date, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (learner_id, domain_id) DO UPDATE SET
                xp = excluded.xp,
                streak = excluded.streak,
                challenge_day = excluded.challenge_day,
                committed = excluded.committed,
                last_completed_date = excluded.last_completed_date,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(learner_id)
        .bind(domain_id)
        .bind(state.xp)
        .bind(state.streak)
        .bind(state.challenge_day)
        .bind(state.committed)
        .bind(state.last_completed_date)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Today's view of the learner's progress, after applying missed-day rules.
    pub async fn progress_for_day(
        &self,
        learner_id: &str,
        domain_slug: &str,
        today: NaiveDate,
        style: ChallengeStyle,
        now: DateTime<Utc>,
    ) -> anyhow::Result<(XpStreakState, bool)> {
        let state = self.xp_state(learner_id, domain_slug).await?;
        let (next, reset) = state.apply_missed_days(today, style);
        if reset {
            info!("missed-day reset for {} in {} ({:?})", learner_id, domain_slug, style);
            self.save_xp_state(learner_id, domain_slug, &next, now).await?;
        }
        Ok((next, reset))
    }

    pub async fn complete_mission(
        &self,
        learner_id: &str,
        domain_slug: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> anyhow::Result<XpStreakState> {
        let next = self.xp_state(learner_id, domain_slug).await?.complete_mission(today);
        self.save_xp_state(learner_id, domain_slug, &next, now).await?;
        Ok(next)
    }

    pub async fn commit_challenge(&self, learner_id: &str, domain_slug: &str, now: DateTime<Utc>) -> anyhow::Result<XpStreakState> {
        let next = self.xp_state(learner_id, domain_slug).await?.commit();
        self.save_xp_state(learner_id, domain_slug, &next, now).await?;
        Ok(next)
    }

    /// Recent attempts and per-skill mastery for each child of `parent_id`.
    pub async fn parent_overview(&self, parent_id: &str) -> anyhow::Result<Vec<ChildProgress>> {
        let children = sqlx::query("SELECT id, display_name, role FROM profiles WHERE parent_id = ? ORDER BY id")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(children.len());
        for child in children {
            let id: String = child.try_get("id")?;
            let display_name: String = child.try_get("display_name")?;
            let role: String = child.try_get("role")?;

            let attempts = sqlx::query(
                r#"
                SELECT a.id, a.correct, a.created_at, e.prompt
                FROM attempts a
                JOIN exercises e ON e.id = a.exercise_id
                WHERE a.learner_id = ?
                ORDER BY a.created_at DESC, a.rowid DESC
                LIMIT ?
                "#,
            )
            .bind(&id)
            .bind(PARENT_ATTEMPT_LIMIT)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                Ok(AttemptSummary {
                    id: row.try_get("id")?,
                    correct: row.try_get("correct")?,
                    created_at: row.try_get("created_at")?,
                    prompt: row.try_get("prompt")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

            let mastery = sqlx::query(
                r#"
                SELECT m.skill_id, s.name, m.mastery_probability, m.confidence_score,
                       m.attempts_count, m.last_attempt_at, m.next_review_at
                FROM skill_mastery m
                JOIN skills s ON s.id = m.skill_id
                WHERE m.learner_id = ?
                ORDER BY s.domain_id, s.sort_order, s.id
                "#,
            )
            .bind(&id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                Ok(MasterySummary {
                    skill_id: row.try_get("skill_id")?,
                    skill_name: row.try_get("name")?,
                    mastery_probability: row.try_get("mastery_probability")?,
                    confidence_score: row.try_get("confidence_score")?,
                    attempts_count: row.try_get("attempts_count")?,
                    last_attempt_at: row.try_get("last_attempt_at")?,
                    next_review_at: row.try_get("next_review_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

            result.push(ChildProgress {
                display_name: if display_name.is_empty() { role.clone() } else { display_name },
                id,
                role,
                attempts,
                mastery,
            });
        }
        Ok(result)
    }
}
