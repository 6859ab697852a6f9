//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the repository ports. It mirrors the
//! Postgres adapter's semantics (skill dedup, NotFound sites, all-or-nothing
//! writes) and backs the hermetic test suites.

use async_trait::async_trait;
use positions_core::domain::{
    Company, NewPosition, NewQuestion, Page, PageRequest, Position, PositionUpdate, Question,
    QuestionUpdate, RawInterview,
};
use positions_core::ports::{CompanyRepository, PortError, PortResult, PositionRepository};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

struct PositionRow {
    id: i64,
    public_id: String,
    name: String,
    status: i32,
    description: Option<String>,
    recruiter_public_id: String,
}

struct QuestionRow {
    id: i64,
    position_id: i64,
    question: Question,
}

struct InterviewRow {
    id: i64,
    position_id: i64,
    interview: RawInterview,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    companies: Vec<Company>,
    /// recruiter public id -> company public id
    recruiters: HashMap<String, String>,
    positions: Vec<PositionRow>,
    /// skill name -> skill id
    skills: HashMap<String, i64>,
    /// (position id, skill id)
    position_skills: BTreeSet<(i64, i64)>,
    questions: Vec<QuestionRow>,
    interviews: Vec<InterviewRow>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn position_id(&self, public_id: &str) -> PortResult<i64> {
        self.positions
            .iter()
            .find(|p| p.public_id == public_id)
            .map(|p| p.id)
            .ok_or_else(|| PortError::NotFound(format!("position {}", public_id)))
    }

    fn find_or_create_skill(&mut self, name: &str) -> i64 {
        if let Some(id) = self.skills.get(name) {
            return *id;
        }
        let id = self.next_id();
        self.skills.insert(name.to_string(), id);
        id
    }

    fn attach_skills(&mut self, position_id: i64, skills: &[String]) {
        for name in skills {
            let skill_id = self.find_or_create_skill(name);
            self.position_skills.insert((position_id, skill_id));
        }
    }

    fn company_of(&self, recruiter_public_id: &str) -> Option<Company> {
        let company_id = self.recruiters.get(recruiter_public_id)?;
        self.companies.iter().find(|c| &c.public_id == company_id).cloned()
    }

    fn to_domain(&self, row: &PositionRow) -> Position {
        let mut skills: Vec<String> = self
            .skills
            .iter()
            .filter(|(_, id)| self.position_skills.contains(&(row.id, **id)))
            .map(|(name, _)| name.clone())
            .collect();
        skills.sort();
        Position {
            public_id: row.public_id.clone(),
            name: row.name.clone(),
            status: row.status,
            skills,
            company: self.company_of(&row.recruiter_public_id),
            recruiter_public_id: Some(row.recruiter_public_id.clone()),
            description: row.description.clone(),
        }
    }

    fn page<F>(&self, page: PageRequest, keep: F) -> Page<Position>
    where
        F: Fn(&PositionRow) -> bool,
    {
        let matching: Vec<&PositionRow> = self.positions.iter().filter(|p| keep(p)).collect();
        let items = matching
            .iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|row| self.to_domain(row))
            .collect();
        Page {
            items,
            count: matching.len() as i64,
        }
    }
}

/// Case-insensitive substring match, like `ILIKE '%needle%'`.
fn ilike(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_name_or_description(row: &PositionRow, search: &str) -> bool {
    ilike(&row.name, search) || row.description.as_deref().is_some_and(|d| ilike(d, search))
}

/// Repository over process memory. Clones share nothing; wrap it in an `Arc`.
#[derive(Default)]
pub struct MemoryAdapter {
    state: Mutex<MemoryState>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a company and the recruiters that belong to it.
    pub async fn insert_company(&self, company: Company, recruiters: &[&str]) {
        let mut state = self.state.lock().await;
        for recruiter in recruiters {
            state
                .recruiters
                .insert(recruiter.to_string(), company.public_id.clone());
        }
        state.companies.push(company);
    }

    /// Records an interview the way the interview subsystem would, with an optional raw result.
    pub async fn insert_interview(
        &self,
        position_public_id: &str,
        candidate_public_id: &str,
        result: Option<&str>,
    ) -> PortResult<String> {
        let mut state = self.state.lock().await;
        let position_id = state.position_id(position_public_id)?;
        let id = state.next_id();
        let public_id = Uuid::new_v4().to_string();
        state.interviews.push(InterviewRow {
            id,
            position_id,
            interview: RawInterview {
                public_id: public_id.clone(),
                candidate_public_id: Some(candidate_public_id.to_string()),
                result: result.map(str::to_string),
            },
        });
        Ok(public_id)
    }

    /// The id of a skill row, if the catalog has one with that name.
    pub async fn skill_id(&self, name: &str) -> Option<i64> {
        self.state.lock().await.skills.get(name).copied()
    }

    pub async fn skill_count(&self) -> usize {
        self.state.lock().await.skills.len()
    }
}

#[async_trait]
impl PositionRepository for MemoryAdapter {
    async fn list_positions(&self, search: &str, page: PageRequest) -> PortResult<Page<Position>> {
        let state = self.state.lock().await;
        Ok(state.page(page, |p| ilike(&p.name, search)))
    }

    async fn get_position(&self, public_id: &str) -> PortResult<Position> {
        let state = self.state.lock().await;
        state
            .positions
            .iter()
            .find(|p| p.public_id == public_id)
            .map(|row| state.to_domain(row))
            .ok_or_else(|| PortError::NotFound(format!("position {}", public_id)))
    }

    async fn exists(&self, public_id: &str) -> PortResult<bool> {
        let state = self.state.lock().await;
        Ok(state.positions.iter().any(|p| p.public_id == public_id))
    }

    async fn create_position(&self, position: &NewPosition) -> PortResult<String> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let public_id = Uuid::new_v4().to_string();
        state.positions.push(PositionRow {
            id,
            public_id: public_id.clone(),
            name: position.name.clone(),
            status: position.status,
            description: position.description.clone(),
            recruiter_public_id: position.recruiter_public_id.clone(),
        });
        state.attach_skills(id, &position.skills);
        Ok(public_id)
    }

    async fn update_position(&self, public_id: &str, update: &PositionUpdate) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let row = state
            .positions
            .iter_mut()
            .find(|p| p.public_id == public_id)
            .ok_or_else(|| PortError::NotFound(format!("position {}", public_id)))?;
        if let Some(name) = &update.name {
            row.name = name.clone();
        }
        if let Some(description) = &update.description {
            row.description = Some(description.clone());
        }
        if let Some(status) = update.status {
            row.status = status;
        }
        Ok(())
    }

    async fn positions_by_company(
        &self,
        company_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        let state = self.state.lock().await;
        let recruiters = &state.recruiters;
        Ok(state.page(page, |p| {
            recruiters.get(&p.recruiter_public_id).map(String::as_str) == Some(company_public_id)
                && matches_name_or_description(p, search)
        }))
    }

    async fn positions_by_recruiter(
        &self,
        recruiter_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        let state = self.state.lock().await;
        Ok(state.page(page, |p| {
            p.recruiter_public_id == recruiter_public_id && matches_name_or_description(p, search)
        }))
    }

    async fn create_skills_for_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let id = state.position_id(public_id)?;
        state.attach_skills(id, skills);
        Ok(())
    }

    async fn delete_skills_from_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let id = state.position_id(public_id)?;
        for name in skills {
            if let Some(skill_id) = state.skills.get(name).copied() {
                state.position_skills.remove(&(id, skill_id));
            }
        }
        Ok(())
    }

    async fn add_questions_to_position(
        &self,
        public_id: &str,
        questions: &[NewQuestion],
    ) -> PortResult<Vec<Question>> {
        let mut state = self.state.lock().await;
        let position_id = state.position_id(public_id)?;
        let mut created = Vec::with_capacity(questions.len());
        for question in questions {
            let id = state.next_id();
            let question = Question {
                public_id: Uuid::new_v4().to_string(),
                position_public_id: public_id.to_string(),
                name: question.name.clone(),
                read_duration: question.read_duration,
                answer_duration: question.answer_duration,
            };
            state.questions.push(QuestionRow {
                id,
                position_id,
                question: question.clone(),
            });
            created.push(question);
        }
        Ok(created)
    }

    async fn position_questions(&self, public_id: &str) -> PortResult<Vec<Question>> {
        let state = self.state.lock().await;
        let Ok(position_id) = state.position_id(public_id) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<&QuestionRow> = state
            .questions
            .iter()
            .filter(|q| q.position_id == position_id)
            .collect();
        rows.sort_by_key(|q| q.id);
        Ok(rows.into_iter().map(|q| q.question.clone()).collect())
    }

    async fn update_question(
        &self,
        question_public_id: &str,
        update: &QuestionUpdate,
    ) -> PortResult<Question> {
        let mut state = self.state.lock().await;
        let row = state
            .questions
            .iter_mut()
            .find(|q| q.question.public_id == question_public_id)
            .ok_or_else(|| PortError::NotFound(format!("question {}", question_public_id)))?;
        if let Some(name) = &update.name {
            row.question.name = name.clone();
        }
        if let Some(read) = update.read_duration {
            row.question.read_duration = read;
        }
        if let Some(answer) = update.answer_duration {
            row.question.answer_duration = answer;
        }
        Ok(row.question.clone())
    }

    async fn delete_question(&self, question_public_id: &str) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let before = state.questions.len();
        state.questions.retain(|q| q.question.public_id != question_public_id);
        if state.questions.len() == before {
            return Err(PortError::NotFound(format!("question {}", question_public_id)));
        }
        Ok(())
    }

    async fn position_interviews(
        &self,
        public_id: &str,
        page: PageRequest,
    ) -> PortResult<Page<RawInterview>> {
        let state = self.state.lock().await;
        let Ok(position_id) = state.position_id(public_id) else {
            return Ok(Page { items: Vec::new(), count: 0 });
        };
        let mut rows: Vec<&InterviewRow> = state
            .interviews
            .iter()
            .filter(|i| i.position_id == position_id)
            .collect();
        rows.sort_by_key(|i| i.id);
        let count = rows.len() as i64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|i| i.interview.clone())
            .collect();
        Ok(Page { items, count })
    }

    async fn create_interview(
        &self,
        position_public_id: &str,
        candidate_public_id: &str,
    ) -> PortResult<String> {
        let mut state = self.state.lock().await;
        let position_id = state.position_id(position_public_id)?;
        let id = state.next_id();
        let public_id = Uuid::new_v4().to_string();
        state.interviews.push(InterviewRow {
            id,
            position_id,
            interview: RawInterview {
                public_id: public_id.clone(),
                candidate_public_id: Some(candidate_public_id.to_string()),
                result: None,
            },
        });
        Ok(public_id)
    }
}

#[async_trait]
impl CompanyRepository for MemoryAdapter {
    async fn company_by_recruiter(&self, recruiter_public_id: &str) -> PortResult<Company> {
        let state = self.state.lock().await;
        state
            .company_of(recruiter_public_id)
            .ok_or_else(|| {
                PortError::NotFound(format!("company for recruiter {}", recruiter_public_id))
            })
    }
}
