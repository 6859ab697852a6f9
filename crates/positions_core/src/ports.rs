//! crates/positions_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the concrete store and of the credential format.

use crate::domain::{
    Caller, Company, NewPosition, NewQuestion, Page, PageRequest, Position, PositionUpdate,
    Question, QuestionUpdate, RawInterview,
};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, decoding).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("permission denied")]
    PermissionDenied,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait PositionRepository: Send + Sync {
    // --- Positions ---
    async fn list_positions(&self, search: &str, page: PageRequest) -> PortResult<Page<Position>>;

    /// Fails with `NotFound` when no row matches; callers usually probe with `exists` first.
    async fn get_position(&self, public_id: &str) -> PortResult<Position>;

    async fn exists(&self, public_id: &str) -> PortResult<bool>;

    /// Inserts the position and all of its skills atomically, returning the new public id.
    async fn create_position(&self, position: &NewPosition) -> PortResult<String>;

    async fn update_position(&self, public_id: &str, update: &PositionUpdate) -> PortResult<()>;

    async fn positions_by_company(
        &self,
        company_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>>;

    async fn positions_by_recruiter(
        &self,
        recruiter_public_id: &str,
        search: &str,
        page: PageRequest,
    ) -> PortResult<Page<Position>>;

    // --- Skills ---
    /// All-or-nothing: any failure leaves the position's skills unchanged.
    async fn create_skills_for_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()>;

    /// Best-effort: a failure detaching one skill is logged and the rest still run.
    async fn delete_skills_from_position(
        &self,
        public_id: &str,
        skills: &[String],
    ) -> PortResult<()>;

    // --- Questions ---
    async fn add_questions_to_position(
        &self,
        public_id: &str,
        questions: &[NewQuestion],
    ) -> PortResult<Vec<Question>>;

    async fn position_questions(&self, public_id: &str) -> PortResult<Vec<Question>>;

    async fn update_question(
        &self,
        question_public_id: &str,
        update: &QuestionUpdate,
    ) -> PortResult<Question>;

    async fn delete_question(&self, question_public_id: &str) -> PortResult<()>;

    // --- Interviews ---
    async fn position_interviews(
        &self,
        public_id: &str,
        page: PageRequest,
    ) -> PortResult<Page<RawInterview>>;

    async fn create_interview(
        &self,
        position_public_id: &str,
        candidate_public_id: &str,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn company_by_recruiter(&self, recruiter_public_id: &str) -> PortResult<Company>;
}

/// Turns a credential issued by the external auth service into a caller identity.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> PortResult<Caller>;
}
