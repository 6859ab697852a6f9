//! crates/positions_core/src/service.rs
//!
//! The position service sequences repository calls for the HTTP layer.
//! Most operations are straight delegation; the few that add logic are
//! position creation (company enrichment), updates (ownership),
//! interview listing (result decoding) and interview creation (role check).

use crate::domain::{
    dedup_skills, Caller, Interview, InterviewResult, NewPosition, NewQuestion, Page,
    PageRequest, Position, PositionUpdate, Question, QuestionUpdate, Role,
};
use crate::ports::{CompanyRepository, PortError, PortResult, PositionRepository};
use std::sync::Arc;
use tracing::error;

#[derive(Clone)]
pub struct PositionService {
    positions: Arc<dyn PositionRepository>,
    companies: Arc<dyn CompanyRepository>,
}

impl PositionService {
    pub fn new(
        positions: Arc<dyn PositionRepository>,
        companies: Arc<dyn CompanyRepository>,
    ) -> Self {
        Self { positions, companies }
    }

    pub async fn list_positions(
        &self,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.positions.list_positions(search, page).await
    }

    pub async fn get_position(&self, public_id: &str) -> PortResult<Position> {
        self.positions.get_position(public_id).await
    }

    /// Succeeds when the position exists, `NotFound` otherwise.
    pub async fn exists(&self, public_id: &str) -> PortResult<()> {
        if self.positions.exists(public_id).await? {
            Ok(())
        } else {
            Err(PortError::NotFound(format!("position {}", public_id)))
        }
    }

    /// Creates the position, then attaches the recruiter's company.
    /// Skills come back sorted by name, the same order every read returns.
    ///
    /// If the company cannot be loaded the call fails even though the
    /// position row has already been committed.
    pub async fn create_position(&self, mut position: NewPosition) -> PortResult<Position> {
        position.skills = dedup_skills(&position.skills);
        position.skills.sort();
        let public_id = self.positions.create_position(&position).await?;

        let company = self
            .companies
            .company_by_recruiter(&position.recruiter_public_id)
            .await
            .map_err(|e| {
                error!(
                    "Position {} created but company for recruiter {} could not be loaded: {:?}",
                    public_id, position.recruiter_public_id, e
                );
                PortError::Unexpected(format!("company lookup failed: {}", e))
            })?;

        Ok(Position {
            public_id,
            name: position.name,
            status: position.status,
            skills: position.skills,
            company: Some(company),
            recruiter_public_id: Some(position.recruiter_public_id),
            description: position.description,
        })
    }

    /// Applies a partial update. Only the owning recruiter may edit a position.
    pub async fn update_position(
        &self,
        caller: &Caller,
        public_id: &str,
        update: PositionUpdate,
    ) -> PortResult<Position> {
        let current = self.positions.get_position(public_id).await?;
        if current.recruiter_public_id.as_deref() != Some(caller.public_id.as_str()) {
            return Err(PortError::PermissionDenied);
        }
        self.positions.update_position(public_id, &update).await?;
        self.positions.get_position(public_id).await
    }

    pub async fn create_skills_for_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        self.positions
            .create_skills_for_position(public_id, &dedup_skills(skills))
            .await
    }

    pub async fn delete_skills_from_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()> {
        self.positions.delete_skills_from_position(public_id, skills).await
    }

    pub async fn positions_by_company(
        &self,
        company_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.positions
            .positions_by_company(company_public_id, search, page)
            .await
    }

    pub async fn positions_by_recruiter(
        &self,
        recruiter_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>> {
        self.positions
            .positions_by_recruiter(recruiter_public_id, search, page)
            .await
    }

    pub async fn add_questions_to_position(
        &self,
        public_id: &str,
        questions: &[NewQuestion],
    ) -> PortResult<Vec<Question>> {
        self.positions.add_questions_to_position(public_id, questions).await
    }

    pub async fn position_questions(&self, public_id: &str) -> PortResult<Vec<Question>> {
        self.positions.position_questions(public_id).await
    }

    pub async fn update_question(
        &self,
        question_public_id: &str,
        update: QuestionUpdate,
    ) -> PortResult<Question> {
        self.positions.update_question(question_public_id, &update).await
    }

    pub async fn delete_question(&self, question_public_id: &str) -> PortResult<()> {
        self.positions.delete_question(question_public_id).await
    }

    /// Lists a page of interviews with decoded results.
    ///
    /// A single malformed result fails the whole page.
    pub async fn position_interviews(
        &self,
        public_id: &str,
        page: PageRequest,
    ) -> PortResult<Page<Interview>> {
        let raw = self.positions.position_interviews(public_id, page).await?;

        let mut items = Vec::with_capacity(raw.items.len());
        for interview in raw.items {
            let result = match interview.result.as_deref() {
                Some(blob) => Some(serde_json::from_str::<InterviewResult>(blob).map_err(|e| {
                    error!("Failed to decode result of interview {}: {}", interview.public_id, e);
                    PortError::Unexpected(format!("malformed interview result: {}", e))
                })?),
                None => None,
            };
            items.push(Interview {
                public_id: interview.public_id,
                candidate_public_id: interview.candidate_public_id,
                result,
            });
        }

        Ok(Page {
            items,
            count: raw.count,
        })
    }

    /// Starts an interview for the calling candidate.
    pub async fn create_interview(
        &self,
        caller: &Caller,
        position_public_id: &str,
    ) -> PortResult<String> {
        if caller.role != Role::Candidate {
            return Err(PortError::PermissionDenied);
        }
        self.positions
            .create_interview(position_public_id, &caller.public_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Company, RawInterview, STATUS_DRAFT};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Canned repository: returns fixed data and records what it was asked to do.
    #[derive(Default)]
    struct StubRepo {
        exists: bool,
        owner: Option<String>,
        interviews: Vec<RawInterview>,
        created_skills: Mutex<Vec<String>>,
        updates: Mutex<Vec<PositionUpdate>>,
        interview_candidates: Mutex<Vec<String>>,
    }

    impl StubRepo {
        fn position(&self, public_id: &str) -> Position {
            Position {
                public_id: public_id.to_string(),
                name: "Backend Engineer".to_string(),
                status: STATUS_DRAFT,
                skills: vec![],
                company: None,
                recruiter_public_id: self.owner.clone(),
                description: None,
            }
        }
    }

    #[async_trait]
    impl PositionRepository for StubRepo {
        async fn list_positions(&self, _: &str, _: PageRequest) -> PortResult<Page<Position>> {
            Ok(Page { items: vec![], count: 0 })
        }
        async fn get_position(&self, public_id: &str) -> PortResult<Position> {
            Ok(self.position(public_id))
        }
        async fn exists(&self, _: &str) -> PortResult<bool> {
            Ok(self.exists)
        }
        async fn create_position(&self, position: &NewPosition) -> PortResult<String> {
            *self.created_skills.lock().unwrap() = position.skills.clone();
            Ok("P1".to_string())
        }
        async fn update_position(&self, _: &str, update: &PositionUpdate) -> PortResult<()> {
            self.updates.lock().unwrap().push(update.clone());
            Ok(())
        }
        async fn positions_by_company(
            &self,
            _: &str,
            _: &str,
            _: PageRequest,
        ) -> PortResult<Page<Position>> {
            Ok(Page { items: vec![], count: 0 })
        }
        async fn positions_by_recruiter(
            &self,
            _: &str,
            _: &str,
            _: PageRequest,
        ) -> PortResult<Page<Position>> {
            Ok(Page { items: vec![], count: 0 })
        }
        async fn create_skills_for_position(&self, _: &str, skills: &[String]) -> PortResult<()> {
            *self.created_skills.lock().unwrap() = skills.to_vec();
            Ok(())
        }
        async fn delete_skills_from_position(&self, _: &str, _: &[String]) -> PortResult<()> {
            Ok(())
        }
        async fn add_questions_to_position(
            &self,
            _: &str,
            _: &[NewQuestion],
        ) -> PortResult<Vec<Question>> {
            Ok(vec![])
        }
        async fn position_questions(&self, _: &str) -> PortResult<Vec<Question>> {
            Ok(vec![])
        }
        async fn update_question(&self, id: &str, _: &QuestionUpdate) -> PortResult<Question> {
            Err(PortError::NotFound(format!("question {}", id)))
        }
        async fn delete_question(&self, _: &str) -> PortResult<()> {
            Ok(())
        }
        async fn position_interviews(
            &self,
            _: &str,
            _: PageRequest,
        ) -> PortResult<Page<RawInterview>> {
            Ok(Page {
                items: self.interviews.clone(),
                count: self.interviews.len() as i64,
            })
        }
        async fn create_interview(&self, _: &str, candidate: &str) -> PortResult<String> {
            self.interview_candidates.lock().unwrap().push(candidate.to_string());
            Ok("I1".to_string())
        }
    }

    struct StubCompanies(Option<Company>);

    #[async_trait]
    impl CompanyRepository for StubCompanies {
        async fn company_by_recruiter(&self, recruiter: &str) -> PortResult<Company> {
            self.0
                .clone()
                .ok_or_else(|| PortError::NotFound(format!("company for recruiter {}", recruiter)))
        }
    }

    fn acme() -> Company {
        Company {
            public_id: "C1".to_string(),
            name: "Acme".to_string(),
            logo: None,
            description: None,
        }
    }

    fn service(repo: StubRepo, company: Option<Company>) -> (PositionService, Arc<StubRepo>) {
        let repo = Arc::new(repo);
        let service = PositionService::new(repo.clone(), Arc::new(StubCompanies(company)));
        (service, repo)
    }

    fn caller(public_id: &str, role: Role) -> Caller {
        Caller {
            public_id: public_id.to_string(),
            role,
        }
    }

    fn new_position(skills: &[&str]) -> NewPosition {
        NewPosition {
            name: "Backend Engineer".to_string(),
            description: None,
            status: STATUS_DRAFT,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            recruiter_public_id: "R1".to_string(),
        }
    }

    #[tokio::test]
    async fn exists_maps_false_to_not_found() {
        let (svc, _) = service(StubRepo::default(), None);
        assert!(matches!(svc.exists("nope").await, Err(PortError::NotFound(_))));

        let (svc, _) = service(StubRepo { exists: true, ..Default::default() }, None);
        assert!(svc.exists("P1").await.is_ok());
    }

    #[tokio::test]
    async fn create_position_attaches_company_and_dedups_skills() {
        let (svc, repo) = service(StubRepo::default(), Some(acme()));
        let created = svc.create_position(new_position(&["Go", "Go", "SQL"])).await.unwrap();

        assert_eq!(created.public_id, "P1");
        assert_eq!(created.status, STATUS_DRAFT);
        assert_eq!(created.company, Some(acme()));
        assert_eq!(created.skills, vec!["Go", "SQL"]);
        assert_eq!(*repo.created_skills.lock().unwrap(), vec!["Go", "SQL"]);
    }

    #[tokio::test]
    async fn create_position_returns_skills_in_read_order() {
        let (svc, _) = service(StubRepo::default(), Some(acme()));
        let created = svc.create_position(new_position(&["SQL", "Go", "SQL"])).await.unwrap();
        assert_eq!(created.skills, vec!["Go", "SQL"]);
    }

    #[tokio::test]
    async fn create_position_fails_without_company() {
        let (svc, _) = service(StubRepo::default(), None);
        let err = svc.create_position(new_position(&["Go"])).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn interviews_decode_results() {
        let repo = StubRepo {
            interviews: vec![
                RawInterview {
                    public_id: "I1".to_string(),
                    candidate_public_id: Some("U1".to_string()),
                    result: Some(r#"{"questions":[],"score":42}"#.to_string()),
                },
                RawInterview {
                    public_id: "I2".to_string(),
                    candidate_public_id: None,
                    result: None,
                },
            ],
            ..Default::default()
        };
        let (svc, _) = service(repo, None);
        let page = svc.position_interviews("P1", PageRequest::new(1, 10)).await.unwrap();

        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].result.as_ref().map(|r| r.score), Some(42));
        assert!(page.items[1].result.is_none());
    }

    #[tokio::test]
    async fn malformed_result_fails_whole_page() {
        let repo = StubRepo {
            interviews: vec![
                RawInterview {
                    public_id: "I1".to_string(),
                    candidate_public_id: None,
                    result: Some(r#"{"score":1}"#.to_string()),
                },
                RawInterview {
                    public_id: "I2".to_string(),
                    candidate_public_id: None,
                    result: Some("{not json".to_string()),
                },
            ],
            ..Default::default()
        };
        let (svc, _) = service(repo, None);
        let err = svc.position_interviews("P1", PageRequest::new(1, 10)).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn only_owner_may_update() {
        let repo = StubRepo {
            owner: Some("R1".to_string()),
            ..Default::default()
        };
        let (svc, repo) = service(repo, None);
        let update = PositionUpdate {
            status: Some(1),
            ..Default::default()
        };

        let err = svc
            .update_position(&caller("R2", Role::Recruiter), "P1", update.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::PermissionDenied));
        assert!(repo.updates.lock().unwrap().is_empty());

        svc.update_position(&caller("R1", Role::Recruiter), "P1", update.clone())
            .await
            .unwrap();
        assert_eq!(*repo.updates.lock().unwrap(), vec![update]);
    }

    #[tokio::test]
    async fn only_candidates_start_interviews() {
        let (svc, repo) = service(StubRepo::default(), None);

        let err = svc
            .create_interview(&caller("R1", Role::Recruiter), "P1")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::PermissionDenied));

        let id = svc.create_interview(&caller("U1", Role::Candidate), "P1").await.unwrap();
        assert_eq!(id, "I1");
        assert_eq!(*repo.interview_candidates.lock().unwrap(), vec!["U1"]);
    }
}
