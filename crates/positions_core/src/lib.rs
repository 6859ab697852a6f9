pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    Caller, Company, Interview, InterviewResult, NewPosition, NewQuestion, Page, PageRequest,
    Position, PositionUpdate, Question, QuestionUpdate, RawInterview, Role,
};
pub use ports::{CompanyRepository, PortError, PortResult, PositionRepository, TokenVerifier};
pub use service::PositionService;
