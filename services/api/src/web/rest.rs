//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::config::Config;
use crate::error::ApiError;
use crate::web::envelope::Envelope;
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use positions_core::domain::{
    Caller, Interview, NewPosition, NewQuestion, PageRequest, Position, PositionUpdate, Question,
    QuestionUpdate, STATUS_DRAFT,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_positions,
        get_position_interviews,
        get_position,
        create_position,
        update_position,
        add_skills_to_position,
        delete_skills_from_position,
        get_position_questions,
        add_questions_to_position,
        create_interview,
        update_question,
        delete_question,
        get_positions_by_company,
        get_positions_by_recruiter,
    ),
    components(
        schemas(
            CreatePositionRequest,
            UpdatePositionRequest,
            SkillsRequest,
            QuestionsRequest,
            NewQuestionRequest,
            UpdateQuestionRequest,
            PublicIdResponse,
        )
    ),
    tags(
        (
            name = "Positions API",
            description = "Job positions, their skills, questions and interviews."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreatePositionRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePositionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct SkillsRequest {
    pub skills: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct NewQuestionRequest {
    pub name: String,
    pub read_duration: i32,
    pub answer_duration: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionsRequest {
    pub questions: Vec<NewQuestionRequest>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateQuestionRequest {
    pub name: Option<String>,
    pub read_duration: Option<i32>,
    pub answer_duration: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct PublicIdResponse {
    pub public_id: String,
}

#[derive(Serialize)]
pub struct PositionsPage {
    pub positions: Vec<Position>,
    pub count: i64,
}

#[derive(Serialize)]
pub struct InterviewsPage {
    pub interviews: Vec<Interview>,
    pub count: i64,
}

#[derive(Serialize)]
pub struct PositionQuestions {
    pub position_public_id: String,
    pub questions: Vec<Question>,
}

/// `search`, `page_num` and `page_size` query parameters.
///
/// Paging values are kept as raw strings so that junk falls back to the
/// configured defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub search: Option<String>,
    pub page_num: Option<String>,
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn page(&self, config: &Config) -> PageRequest {
        PageRequest::new(
            positive_or(self.page_num.as_deref(), config.default_page_num),
            positive_or(self.page_size.as_deref(), config.default_page_size),
        )
    }

    pub fn search(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }
}

/// Parses a positive integer, falling back to `default` on junk or values below 1.
fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
        .unwrap_or(default)
}

/// Unwraps a JSON body, turning a rejection into an invalid-input envelope.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>, context: &str) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!("Failed to parse request body when {}: {}", context, e.body_text());
        ApiError::InvalidInput(e.body_text())
    })
}

//=========================================================================================
// Position Handlers
//=========================================================================================

/// List positions whose name contains `search`.
#[utoipa::path(
    get,
    path = "/positions",
    params(
        (
            "search" = Option<String>,
            Query,
            description = "Case-insensitive substring of the position name."
        ),
        ("page_num" = Option<i64>, Query, description = "1-based page number."),
        ("page_size" = Option<i64>, Query, description = "Items per page.")
    ),
    responses(
        (status = 200, description = "A page of positions and the total count"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_positions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .service
        .list_positions(query.search(), query.page(&state.config))
        .await?;
    Ok(Json(Envelope::ok(PositionsPage {
        positions: page.items,
        count: page.count,
    })))
}

/// List the interviews held for a position, with decoded results.
#[utoipa::path(
    get,
    path = "/positions/{position_public_id}/interviews",
    params(
        ("position_public_id" = String, Path, description = "Public id of the position."),
        ("page_num" = Option<i64>, Query, description = "1-based page number."),
        ("page_size" = Option<i64>, Query, description = "Items per page.")
    ),
    responses(
        (status = 200, description = "A page of interviews and the total count"),
        (status = 404, description = "Position not found"),
        (status = 500, description = "Internal server error, including malformed stored results")
    )
)]
pub async fn get_position_interviews(
    State(state): State<Arc<AppState>>,
    Path(position_public_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.exists(&position_public_id).await?;
    let page = state
        .service
        .position_interviews(&position_public_id, query.page(&state.config))
        .await?;
    Ok(Json(Envelope::ok(InterviewsPage {
        interviews: page.items,
        count: page.count,
    })))
}

/// Fetch a single position with its company and skills.
#[utoipa::path(
    get,
    path = "/position/{position_public_id}",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    responses(
        (status = 200, description = "The position"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn get_position(
    State(state): State<Arc<AppState>>,
    Path(position_public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.exists(&position_public_id).await?;
    let position = state.service.get_position(&position_public_id).await?;
    Ok(Json(Envelope::ok(position)))
}

/// Create a position owned by the calling recruiter.
#[utoipa::path(
    post,
    path = "/position",
    request_body = CreatePositionRequest,
    responses(
        (status = 201, description = "Position created, returned with its company"),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_position(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreatePositionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "creating position")?;
    if req.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("position name is empty".to_string()));
    }

    let position = state
        .service
        .create_position(NewPosition {
            name: req.name,
            description: req.description,
            status: STATUS_DRAFT,
            skills: req.skills,
            recruiter_public_id: caller.public_id,
        })
        .await?;
    info!("Position {} created", position.public_id);

    Ok((StatusCode::CREATED, Json(Envelope::ok(position))))
}

/// Partially update a position. Only its owning recruiter may do this.
#[utoipa::path(
    put,
    path = "/position/{position_public_id}",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    request_body = UpdatePositionRequest,
    responses(
        (status = 200, description = "The updated position"),
        (status = 401, description = "Not the owner, or missing token"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn update_position(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(position_public_id): Path<String>,
    payload: Result<Json<UpdatePositionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "updating position")?;
    let position = state
        .service
        .update_position(
            &caller,
            &position_public_id,
            PositionUpdate {
                name: req.name,
                description: req.description,
                status: req.status,
            },
        )
        .await?;
    Ok(Json(Envelope::ok(position)))
}

#[utoipa::path(
    get,
    path = "/company/{company_public_id}/positions",
    params(
        ("company_public_id" = String, Path, description = "Public id of the company."),
        ("search" = Option<String>, Query, description = "Substring of the name or description."),
        ("page_num" = Option<i64>, Query, description = "1-based page number."),
        ("page_size" = Option<i64>, Query, description = "Items per page.")
    ),
    responses((status = 200, description = "A page of the company's positions"))
)]
pub async fn get_positions_by_company(
    State(state): State<Arc<AppState>>,
    Path(company_public_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .service
        .positions_by_company(&company_public_id, query.search(), query.page(&state.config))
        .await?;
    Ok(Json(Envelope::ok(PositionsPage {
        positions: page.items,
        count: page.count,
    })))
}

#[utoipa::path(
    get,
    path = "/recruiter/{recruiter_public_id}/positions",
    params(
        ("recruiter_public_id" = String, Path, description = "Public id (UUID) of the recruiter."),
        ("search" = Option<String>, Query, description = "Substring of the name or description."),
        ("page_num" = Option<i64>, Query, description = "1-based page number."),
        ("page_size" = Option<i64>, Query, description = "Items per page.")
    ),
    responses(
        (status = 200, description = "A page of the recruiter's positions"),
        (status = 400, description = "Recruiter id is not a UUID")
    )
)]
pub async fn get_positions_by_recruiter(
    State(state): State<Arc<AppState>>,
    Path(recruiter_public_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Uuid::parse_str(&recruiter_public_id)
        .map_err(|e| ApiError::InvalidInput(format!("recruiter id: {}", e)))?;
    let page = state
        .service
        .positions_by_recruiter(&recruiter_public_id, query.search(), query.page(&state.config))
        .await?;
    Ok(Json(Envelope::ok(PositionsPage {
        positions: page.items,
        count: page.count,
    })))
}

//=========================================================================================
// Skill Handlers
//=========================================================================================

/// Attach skills to a position, creating unknown skills on the way.
#[utoipa::path(
    post,
    path = "/position/{position_public_id}/skills",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    request_body = SkillsRequest,
    responses(
        (status = 201, description = "Skills attached"),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn add_skills_to_position(
    State(state): State<Arc<AppState>>,
    Path(position_public_id): Path<String>,
    payload: Result<Json<SkillsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "adding skills to position")?;
    state.service.exists(&position_public_id).await?;
    state
        .service
        .create_skills_for_position(&position_public_id, &req.skills)
        .await?;
    Ok((StatusCode::CREATED, Json(Envelope::<()>::empty())))
}

/// Detach skills from a position. Unknown skill names are ignored.
#[utoipa::path(
    delete,
    path = "/position/{position_public_id}/skills",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    request_body = SkillsRequest,
    responses(
        (status = 200, description = "Skills detached"),
        (status = 400, description = "Malformed body"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn delete_skills_from_position(
    State(state): State<Arc<AppState>>,
    Path(position_public_id): Path<String>,
    payload: Result<Json<SkillsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "deleting skills from position")?;
    state.service.exists(&position_public_id).await?;
    state
        .service
        .delete_skills_from_position(&position_public_id, &req.skills)
        .await?;
    Ok(Json(Envelope::<()>::empty()))
}

//=========================================================================================
// Question Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/position/{position_public_id}/questions",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    responses(
        (status = 200, description = "The position's questions"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn get_position_questions(
    State(state): State<Arc<AppState>>,
    Path(position_public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.exists(&position_public_id).await?;
    let questions = state.service.position_questions(&position_public_id).await?;
    Ok(Json(Envelope::ok(PositionQuestions {
        position_public_id,
        questions,
    })))
}

/// Add a batch of questions to a position. Either all are stored or none.
#[utoipa::path(
    post,
    path = "/position/{position_public_id}/questions",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    request_body = QuestionsRequest,
    responses(
        (status = 201, description = "Questions stored, with their generated public ids"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn add_questions_to_position(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<Caller>,
    Path(position_public_id): Path<String>,
    payload: Result<Json<QuestionsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "adding questions to position")?;
    let questions: Vec<NewQuestion> = req
        .questions
        .into_iter()
        .map(|q| NewQuestion {
            name: q.name,
            read_duration: q.read_duration,
            answer_duration: q.answer_duration,
        })
        .collect();

    let questions = state
        .service
        .add_questions_to_position(&position_public_id, &questions)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(PositionQuestions {
            position_public_id,
            questions,
        })),
    ))
}

#[utoipa::path(
    put,
    path = "/question/{question_public_id}",
    params(("question_public_id" = String, Path, description = "Public id of the question.")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "The updated question"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<Caller>,
    Path(question_public_id): Path<String>,
    payload: Result<Json<UpdateQuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload, "updating question")?;
    let question = state
        .service
        .update_question(
            &question_public_id,
            QuestionUpdate {
                name: req.name,
                read_duration: req.read_duration,
                answer_duration: req.answer_duration,
            },
        )
        .await?;
    Ok(Json(Envelope::ok(question)))
}

#[utoipa::path(
    delete,
    path = "/question/{question_public_id}",
    params(("question_public_id" = String, Path, description = "Public id of the question.")),
    responses(
        (status = 200, description = "Question deleted"),
        (status = 404, description = "Question not found")
    )
)]
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<Caller>,
    Path(question_public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_question(&question_public_id).await?;
    Ok(Json(Envelope::<()>::empty()))
}

//=========================================================================================
// Interview Handlers
//=========================================================================================

/// Start an interview for the calling candidate.
#[utoipa::path(
    post,
    path = "/position/{position_public_id}/interview",
    params(("position_public_id" = String, Path, description = "Public id of the position.")),
    responses(
        (status = 201, description = "Interview created", body = PublicIdResponse),
        (status = 401, description = "Caller is not a candidate"),
        (status = 404, description = "Position not found")
    )
)]
pub async fn create_interview(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(position_public_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let public_id = state
        .service
        .create_interview(&caller, &position_public_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(PublicIdResponse { public_id })),
    ))
}
