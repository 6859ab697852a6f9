//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the `PositionRepository` and `CompanyRepository` ports from the core crate.
//! It handles all interactions with PostgreSQL using `sqlx`.
//!
//! Every public operation is one unit of work bounded by the configured
//! timeout. Multi-statement writes run in a single transaction; dropping an
//! uncommitted `Transaction` (on `?` or on timeout) rolls it back.

use async_trait::async_trait;
use positions_core::domain::{
    Company, NewPosition, NewQuestion, Page, PageRequest, Position, PositionUpdate, Question,
    QuestionUpdate, RawInterview,
};
use positions_core::ports::{CompanyRepository, PortError, PortResult, PositionRepository};
use sqlx::{Acquire, FromRow, PgConnection, PgPool};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the repository ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    timeout: Duration,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Runs one unit of work under the configured timeout.
    async fn within<T, F>(&self, operation: &str, work: F) -> PortResult<T>
    where
        F: Future<Output = PortResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                error!("Database operation '{}' timed out after {:?}", operation, self.timeout);
                Err(PortError::Unexpected(format!("{} timed out", operation)))
            }
        }
    }
}

/// Logs a store error with context and hides it behind `PortError::Unexpected`.
fn unexpected(context: &'static str) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| {
        error!("{}: {}", context, e);
        PortError::Unexpected(e.to_string())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PositionRecord {
    public_id: String,
    name: String,
    status: i32,
    description: Option<String>,
    recruiter_public_id: String,
    company_public_id: Option<String>,
    company_name: Option<String>,
    company_logo: Option<String>,
    company_description: Option<String>,
    skills: Vec<String>,
}
impl PositionRecord {
    fn to_domain(self) -> Position {
        let company = match (self.company_public_id, self.company_name) {
            (Some(public_id), Some(name)) => Some(Company {
                public_id,
                name,
                logo: self.company_logo,
                description: self.company_description,
            }),
            _ => None,
        };
        Position {
            public_id: self.public_id,
            name: self.name,
            status: self.status,
            skills: self.skills,
            company,
            recruiter_public_id: Some(self.recruiter_public_id),
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct CompanyRecord {
    public_id: String,
    name: String,
    logo: Option<String>,
    description: Option<String>,
}
impl CompanyRecord {
    fn to_domain(self) -> Company {
        Company {
            public_id: self.public_id,
            name: self.name,
            logo: self.logo,
            description: self.description,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    public_id: String,
    position_public_id: String,
    name: String,
    read_duration: i32,
    answer_duration: i32,
}
impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            public_id: self.public_id,
            position_public_id: self.position_public_id,
            name: self.name,
            read_duration: self.read_duration,
            answer_duration: self.answer_duration,
        }
    }
}

#[derive(FromRow)]
struct InterviewRecord {
    public_id: String,
    candidate_public_id: String,
    result: Option<String>,
}
impl InterviewRecord {
    fn to_domain(self) -> RawInterview {
        RawInterview {
            public_id: self.public_id,
            candidate_public_id: Some(self.candidate_public_id),
            result: self.result,
        }
    }
}

//=========================================================================================
// SQL Shared by the Position Listings
//=========================================================================================

/// Position columns joined with the owning company and the aggregated skill names.
/// Must be followed by a `WHERE` clause and then `POSITION_GROUPING`.
const POSITION_SELECT: &str = "
    SELECT p.public_id, p.name, p.status, p.description, p.recruiter_public_id,
           c.public_id AS company_public_id, c.name AS company_name,
           c.logo AS company_logo, c.description AS company_description,
           COALESCE(
               array_agg(s.name ORDER BY s.name) FILTER (WHERE s.name IS NOT NULL),
               '{}'
           ) AS skills
    FROM positions p
    LEFT JOIN recruiters r ON r.public_id = p.recruiter_public_id
    LEFT JOIN companies c ON c.public_id = r.company_public_id
    LEFT JOIN position_skills ps ON ps.position_id = p.id
    LEFT JOIN skills s ON s.id = ps.skill_id";

const POSITION_GROUPING: &str = "GROUP BY p.id, c.id";

const QUESTION_COLUMNS: &str =
    "public_id, position_public_id, name, read_duration, answer_duration";

//=========================================================================================
// Transaction Helpers
//=========================================================================================

/// Resolves a position's internal id, `NotFound` if it does not exist.
async fn position_id(conn: &mut PgConnection, public_id: &str) -> PortResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM positions WHERE public_id = $1")
        .bind(public_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected("Error retrieving position ID"))?
        .ok_or_else(|| PortError::NotFound(format!("position {}", public_id)))
}

/// Returns the id of the named skill, inserting the skill if it is new.
async fn find_or_create_skill(conn: &mut PgConnection, name: &str) -> PortResult<i64> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM skills WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(unexpected("Error checking skill existence"))?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO skills (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(unexpected("Error inserting new skill"))?;

    match inserted {
        Some(id) => Ok(id),
        // Another transaction committed the same name between our two statements.
        None => sqlx::query_scalar::<_, i64>("SELECT id FROM skills WHERE name = $1")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(unexpected("Error re-reading skill")),
    }
}

async fn attach_skills(
    conn: &mut PgConnection,
    position_id: i64,
    skills: &[String],
) -> PortResult<()> {
    for name in skills {
        let skill_id = find_or_create_skill(conn, name).await?;
        sqlx::query(
            "INSERT INTO position_skills (position_id, skill_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(position_id)
        .bind(skill_id)
        .execute(&mut *conn)
        .await
        .map_err(unexpected("Error adding skill to position"))?;
    }
    Ok(())
}

impl DbAdapter {
    /// Lists positions of one owner (company or recruiter), searching name or description.
    /// `owner_filter` is a SQL predicate over `p`/`r` with `$1` as the owner id.
    async fn owned_positions(
        &self,
        owner_filter: &'static str,
        owner: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.within("list owned positions", async {
            let pattern = format!("%{}%", search);

            let count = sqlx::query_scalar::<_, i64>(&format!(
                "SELECT COUNT(*) FROM positions p
                 LEFT JOIN recruiters r ON r.public_id = p.recruiter_public_id
                 WHERE {} AND (p.name ILIKE $2 OR p.description ILIKE $2)",
                owner_filter
            ))
            .bind(owner)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected("Error retrieving position count"))?;

            let records = sqlx::query_as::<_, PositionRecord>(&format!(
                "{} WHERE {} AND (p.name ILIKE $2 OR p.description ILIKE $2) {}
                 ORDER BY p.id LIMIT $3 OFFSET $4",
                POSITION_SELECT, owner_filter, POSITION_GROUPING
            ))
            .bind(owner)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected("Error retrieving positions"))?;

            Ok(Page {
                items: records.into_iter().map(|r| r.to_domain()).collect(),
                count,
            })
        })
        .await
    }
}

//=========================================================================================
// `PositionRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PositionRepository for DbAdapter {
    async fn list_positions(&self, search: &str, page: PageRequest) -> PortResult<Page<Position>> {
        self.within("list positions", async {
            let pattern = format!("%{}%", search);

            let records = sqlx::query_as::<_, PositionRecord>(&format!(
                "{} WHERE p.name ILIKE $1 {} ORDER BY p.id LIMIT $2 OFFSET $3",
                POSITION_SELECT, POSITION_GROUPING
            ))
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected("Error occurred while retrieving positions"))?;

            // Not in the same snapshot as the page above; concurrent writes may skew it.
            let count =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM positions WHERE name ILIKE $1")
                    .bind(&pattern)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(unexpected("Error occurred while retrieving position count"))?;

            Ok(Page {
                items: records.into_iter().map(|r| r.to_domain()).collect(),
                count,
            })
        })
        .await
    }

    async fn get_position(&self, public_id: &str) -> PortResult<Position> {
        self.within("get position", async {
            let record = sqlx::query_as::<_, PositionRecord>(&format!(
                "{} WHERE p.public_id = $1 {}",
                POSITION_SELECT, POSITION_GROUPING
            ))
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("Error occurred while getting position"))?
            .ok_or_else(|| PortError::NotFound(format!("position {}", public_id)))?;
            Ok(record.to_domain())
        })
        .await
    }

    async fn exists(&self, public_id: &str) -> PortResult<bool> {
        self.within("check position existence", async {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM positions WHERE public_id = $1)",
            )
            .bind(public_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected("Error occurred while checking position existence"))
        })
        .await
    }

    async fn create_position(&self, position: &NewPosition) -> PortResult<String> {
        self.within("create position", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(unexpected("Error occurred while starting transaction"))?;

            let public_id = Uuid::new_v4().to_string();
            let id = sqlx::query_scalar::<_, i64>(
                "INSERT INTO positions (public_id, description, name, status, recruiter_public_id)
                 VALUES ($1, $2, $3, $4, $5) RETURNING id",
            )
            .bind(&public_id)
            .bind(&position.description)
            .bind(&position.name)
            .bind(position.status)
            .bind(&position.recruiter_public_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected("Error occurred while creating position"))?;

            attach_skills(&mut tx, id, &position.skills).await?;

            tx.commit()
                .await
                .map_err(unexpected("Error occurred while committing transaction"))?;
            Ok(public_id)
        })
        .await
    }

    async fn update_position(&self, public_id: &str, update: &PositionUpdate) -> PortResult<()> {
        self.within("update position", async {
            let result = sqlx::query(
                "UPDATE positions
                 SET name = COALESCE($1, name),
                     description = COALESCE($2, description),
                     status = COALESCE($3, status)
                 WHERE public_id = $4",
            )
            .bind(&update.name)
            .bind(&update.description)
            .bind(update.status)
            .bind(public_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected("Error occurred while updating position"))?;

            if result.rows_affected() == 0 {
                return Err(PortError::NotFound(format!("position {}", public_id)));
            }
            Ok(())
        })
        .await
    }

    async fn positions_by_company(
        &self,
        company_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.owned_positions("r.company_public_id = $1", company_public_id, search, page)
            .await
    }

    async fn positions_by_recruiter(
        &self,
        recruiter_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.owned_positions("p.recruiter_public_id = $1", recruiter_public_id, search, page)
            .await
    }

    async fn create_skills_for_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        self.within("add skills", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(unexpected("Error beginning transaction"))?;

            let id = position_id(&mut tx, public_id).await?;
            attach_skills(&mut tx, id, skills).await?;

            tx.commit()
                .await
                .map_err(unexpected("Error committing transaction"))
        })
        .await
    }

    async fn delete_skills_from_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        self.within("remove skills", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(unexpected("Error beginning transaction"))?;

            let id = position_id(&mut tx, public_id).await?;

            for name in skills {
                let skill_id = sqlx::query_scalar::<_, i64>("SELECT id FROM skills WHERE name = $1")
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(unexpected("Error retrieving skill ID"))?;
                let Some(skill_id) = skill_id else {
                    continue;
                };

                // A savepoint per skill keeps one failed delete from aborting the transaction.
                let mut savepoint = Acquire::begin(&mut tx)
                    .await
                    .map_err(unexpected("Error creating savepoint"))?;
                let deleted = sqlx::query(
                    "DELETE FROM position_skills WHERE position_id = $1 AND skill_id = $2",
                )
                .bind(id)
                .bind(skill_id)
                .execute(&mut *savepoint)
                .await;

                match deleted {
                    Ok(_) => savepoint
                        .commit()
                        .await
                        .map_err(unexpected("Error releasing savepoint"))?,
                    Err(e) => {
                        warn!("Error deleting skill {} from position {}: {}", name, public_id, e);
                        savepoint
                            .rollback()
                            .await
                            .map_err(unexpected("Error rolling back savepoint"))?;
                    }
                }
            }

            tx.commit()
                .await
                .map_err(unexpected("Error committing transaction"))
        })
        .await
    }

    async fn add_questions_to_position(
        &self,
        public_id: &str,
        questions: &[NewQuestion],
    ) -> PortResult<Vec<Question>> {
        self.within("add questions", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(unexpected("Error occurred while starting transaction"))?;

            let id = position_id(&mut tx, public_id).await?;

            let mut created = Vec::with_capacity(questions.len());
            for question in questions {
                let question_public_id = Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO questions
                         (public_id, name, position_public_id, position_id,
                          read_duration, answer_duration)
                     VALUES ($1, $2, $3, $4, $5, $6)",
                )
                .bind(&question_public_id)
                .bind(&question.name)
                .bind(public_id)
                .bind(id)
                .bind(question.read_duration)
                .bind(question.answer_duration)
                .execute(&mut *tx)
                .await
                .map_err(unexpected("Error adding question to position"))?;

                created.push(Question {
                    public_id: question_public_id,
                    position_public_id: public_id.to_string(),
                    name: question.name.clone(),
                    read_duration: question.read_duration,
                    answer_duration: question.answer_duration,
                });
            }

            tx.commit()
                .await
                .map_err(unexpected("Error occurred while committing transaction"))?;
            Ok(created)
        })
        .await
    }

    async fn position_questions(&self, public_id: &str) -> PortResult<Vec<Question>> {
        self.within("list questions", async {
            let records = sqlx::query_as::<_, QuestionRecord>(&format!(
                "SELECT {} FROM questions WHERE position_public_id = $1 ORDER BY id",
                QUESTION_COLUMNS
            ))
            .bind(public_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected("Error retrieving questions"))?;
            Ok(records.into_iter().map(|r| r.to_domain()).collect())
        })
        .await
    }

    async fn update_question(
        &self,
        question_public_id: &str,
        update: &QuestionUpdate,
    ) -> PortResult<Question> {
        self.within("update question", async {
            let record = sqlx::query_as::<_, QuestionRecord>(&format!(
                "UPDATE questions
                 SET name = COALESCE($1, name),
                     read_duration = COALESCE($2, read_duration),
                     answer_duration = COALESCE($3, answer_duration)
                 WHERE public_id = $4
                 RETURNING {}",
                QUESTION_COLUMNS
            ))
            .bind(&update.name)
            .bind(update.read_duration)
            .bind(update.answer_duration)
            .bind(question_public_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("Error updating question"))?
            .ok_or_else(|| PortError::NotFound(format!("question {}", question_public_id)))?;
            Ok(record.to_domain())
        })
        .await
    }

    async fn delete_question(&self, question_public_id: &str) -> PortResult<()> {
        self.within("delete question", async {
            let result = sqlx::query("DELETE FROM questions WHERE public_id = $1")
                .bind(question_public_id)
                .execute(&self.pool)
                .await
                .map_err(unexpected("Error deleting question"))?;
            if result.rows_affected() == 0 {
                return Err(PortError::NotFound(format!("question {}", question_public_id)));
            }
            Ok(())
        })
        .await
    }

    async fn position_interviews(
        &self,
        public_id: &str,
        page: PageRequest,
    ) -> PortResult<Page<RawInterview>> {
        self.within("list interviews", async {
            let records = sqlx::query_as::<_, InterviewRecord>(
                "SELECT i.public_id, ui.candidate_public_id, i.results AS result
                 FROM interviews i
                 INNER JOIN user_interviews ui ON ui.interview_id = i.id
                 INNER JOIN positions p ON p.id = ui.position_id
                 WHERE p.public_id = $1
                 ORDER BY i.id
                 LIMIT $2 OFFSET $3",
            )
            .bind(public_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected("Error occurred while retrieving interview results"))?;

            let count = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*)
                 FROM interviews i
                 INNER JOIN user_interviews ui ON ui.interview_id = i.id
                 INNER JOIN positions p ON p.id = ui.position_id
                 WHERE p.public_id = $1",
            )
            .bind(public_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected("Error occurred while retrieving interview count"))?;

            Ok(Page {
                items: records.into_iter().map(|r| r.to_domain()).collect(),
                count,
            })
        })
        .await
    }

    async fn create_interview(
        &self,
        position_public_id: &str,
        candidate_public_id: &str,
    ) -> PortResult<String> {
        self.within("create interview", async {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(unexpected("Error occurred while starting transaction"))?;

            let position = position_id(&mut tx, position_public_id).await?;

            let public_id = Uuid::new_v4().to_string();
            let interview = sqlx::query_scalar::<_, i64>(
                "INSERT INTO interviews (public_id) VALUES ($1) RETURNING id",
            )
            .bind(&public_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected("Error creating interview"))?;

            sqlx::query(
                "INSERT INTO user_interviews (interview_id, position_id, candidate_public_id)
                 VALUES ($1, $2, $3)",
            )
            .bind(interview)
            .bind(position)
            .bind(candidate_public_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected("Error linking interview to candidate"))?;

            tx.commit()
                .await
                .map_err(unexpected("Error occurred while committing transaction"))?;
            Ok(public_id)
        })
        .await
    }
}

//=========================================================================================
// `CompanyRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompanyRepository for DbAdapter {
    async fn company_by_recruiter(&self, recruiter_public_id: &str) -> PortResult<Company> {
        self.within("get company", async {
            let record = sqlx::query_as::<_, CompanyRecord>(
                "SELECT c.public_id, c.name, c.logo, c.description
                 FROM companies c
                 INNER JOIN recruiters r ON r.company_public_id = c.public_id
                 WHERE r.public_id = $1",
            )
            .bind(recruiter_public_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("Error occurred while fetching company"))?
            .ok_or_else(|| {
                PortError::NotFound(format!("company for recruiter {}", recruiter_public_id))
            })?;
            Ok(record.to_domain())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use positions_core::domain::STATUS_DRAFT;
    use sqlx::postgres::PgPoolOptions;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p api -- --ignored

    async fn adapter() -> DbAdapter {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("pool creation failed");
        let db = DbAdapter::new(pool, Duration::from_secs(10));
        db.run_migrations().await.expect("migrations failed");
        db
    }

    /// A name no other test run has used, so tests can share one database.
    fn unique(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4().simple())
    }

    fn new_position(name: &str, recruiter: &str, skills: &[&str]) -> NewPosition {
        NewPosition {
            name: name.to_string(),
            description: None,
            status: STATUS_DRAFT,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            recruiter_public_id: recruiter.to_string(),
        }
    }

    async fn association_count(db: &DbAdapter, public_id: &str) -> i64 {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM position_skills ps
             INNER JOIN positions p ON p.id = ps.position_id
             WHERE p.public_id = $1",
        )
        .bind(public_id)
        .fetch_one(&db.pool)
        .await
        .expect("count query failed")
    }

    async fn skill_rows(db: &DbAdapter, name: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM skills WHERE name = $1")
            .bind(name)
            .fetch_one(&db.pool)
            .await
            .expect("count query failed")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn repeated_skill_names_make_one_association_each() {
        let db = adapter().await;
        let go = unique("go");
        let sql = unique("sql");

        let public_id = db
            .create_position(&new_position(
                "Backend Engineer",
                "R1",
                &[go.as_str(), go.as_str(), sql.as_str()],
            ))
            .await
            .expect("create failed");

        assert_eq!(association_count(&db, &public_id).await, 2);
        let mut expected = vec![go, sql];
        expected.sort();
        assert_eq!(db.get_position(&public_id).await.unwrap().skills, expected);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn positions_share_one_skill_row() {
        let db = adapter().await;
        let go = unique("go");

        let first = db
            .create_position(&new_position("Backend Engineer", "R1", &[go.as_str()]))
            .await
            .unwrap();
        let second = db
            .create_position(&new_position("Platform Engineer", "R1", &[]))
            .await
            .unwrap();
        db.create_skills_for_position(&second, &[go.clone()]).await.unwrap();

        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT ps.skill_id FROM position_skills ps
             INNER JOIN positions p ON p.id = ps.position_id
             WHERE p.public_id = ANY($1)",
        )
        .bind(vec![first, second])
        .fetch_all(&db.pool)
        .await
        .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ids[1]);
        assert_eq!(skill_rows(&db, &go).await, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn attach_then_detach_leaves_no_association() {
        let db = adapter().await;
        let rust = unique("rust");
        let public_id = db
            .create_position(&new_position("Backend Engineer", "R1", &[]))
            .await
            .unwrap();

        db.create_skills_for_position(&public_id, &[rust.clone()]).await.unwrap();
        assert_eq!(association_count(&db, &public_id).await, 1);

        db.delete_skills_from_position(&public_id, &[rust.clone(), unique("never-created")])
            .await
            .unwrap();
        assert_eq!(association_count(&db, &public_id).await, 0);
        // The catalog row outlives the association.
        assert_eq!(skill_rows(&db, &rust).await, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn failed_create_leaves_nothing_behind() {
        let db = adapter().await;
        let name = unique("Backend Engineer");
        let good = unique("go");

        // Postgres rejects NUL bytes in text, failing the second skill insert.
        let err = db
            .create_position(&new_position(&name, "R1", &[good.as_str(), "bad\0skill"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));

        let positions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM positions WHERE name = $1")
            .bind(&name)
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(positions, 0);
        assert_eq!(skill_rows(&db, &good).await, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn question_batch_is_all_or_nothing() {
        let db = adapter().await;
        let public_id = db
            .create_position(&new_position("Backend Engineer", "R1", &[]))
            .await
            .unwrap();
        let question = |name: &str| NewQuestion {
            name: name.to_string(),
            read_duration: 30,
            answer_duration: 120,
        };

        let err = db
            .add_questions_to_position(&public_id, &[question("Why Rust?"), question("bad\0name")])
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
        assert!(db.position_questions(&public_id).await.unwrap().is_empty());

        let created = db
            .add_questions_to_position(&public_id, &[question("Why Rust?")])
            .await
            .unwrap();
        assert_eq!(db.position_questions(&public_id).await.unwrap(), created);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn questions_for_unknown_position_are_not_found() {
        let db = adapter().await;
        let missing = unique("position");

        let err = db
            .add_questions_to_position(
                &missing,
                &[NewQuestion {
                    name: "Why Rust?".to_string(),
                    read_duration: 30,
                    answer_duration: 120,
                }],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let rows: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE position_public_id = $1")
                .bind(&missing)
                .fetch_one(&db.pool)
                .await
                .unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn position_without_skills_has_empty_list() {
        let db = adapter().await;
        let name = unique("Skill-less");
        let public_id = db
            .create_position(&new_position(&name, "R1", &[]))
            .await
            .unwrap();

        let position = db.get_position(&public_id).await.unwrap();
        assert!(position.skills.is_empty());
        assert!(position.company.is_none());

        let page = db.list_positions(&name, PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].public_id, public_id);
        assert!(page.items[0].skills.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn company_is_joined_through_recruiter() {
        let db = adapter().await;
        let company = unique("company");
        let recruiter = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO companies (public_id, name) VALUES ($1, 'Acme')")
            .bind(&company)
            .execute(&db.pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO recruiters (public_id, company_public_id) VALUES ($1, $2)")
            .bind(&recruiter)
            .bind(&company)
            .execute(&db.pool)
            .await
            .unwrap();

        let public_id = db
            .create_position(&new_position("Backend Engineer", &recruiter, &[]))
            .await
            .unwrap();

        assert_eq!(db.company_by_recruiter(&recruiter).await.unwrap().name, "Acme");
        let position = db.get_position(&public_id).await.unwrap();
        assert_eq!(position.company.map(|c| c.public_id), Some(company.clone()));

        let page = db
            .positions_by_company(&company, "", PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
        let page = db
            .positions_by_recruiter(&recruiter, "backend", PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.count, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_recruiter_has_no_company() {
        let db = adapter().await;
        let err = db.company_by_recruiter(&unique("recruiter")).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
