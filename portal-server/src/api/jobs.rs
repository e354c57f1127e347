use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use portal_types::{CreateJobRequest, FieldError, Job, ToggleResponse};

use super::posts::parse_limit;
use super::{parse_id, require_user, ApiError, ApiResult};
use crate::db::repositories::{JobFilter, JobRepository};
use crate::feed::{parse_timestamp, resolve_limit};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JobParams {
    #[serde(default)]
    query: Option<String>,
    /// Comma-separated, any-of
    #[serde(default)]
    tags: Option<String>,
    #[serde(default)]
    remote: Option<bool>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

impl JobParams {
    fn into_filter(self, state: &AppState) -> Result<JobFilter, ApiError> {
        let limit = resolve_limit(parse_limit(self.limit.as_deref())?, &state.feed)?;

        let before = match self.cursor.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
                ApiError::Validation(vec![FieldError::new(
                    "cursor",
                    format!("malformed cursor '{}'", raw),
                )])
            })?),
        };

        let tags = self
            .tags
            .map(|t| t.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        Ok(JobFilter {
            query: self.query,
            tags,
            remote: self.remote,
            level: self.level,
            before,
            limit,
        })
    }
}

/// GET /api/jobs - Search the job board
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobParams>,
) -> ApiResult<Json<Vec<Job>>> {
    let filter = params.into_filter(&state)?;
    let jobs = JobRepository::new(state.db.pool.clone()).search(&filter)?;
    Ok(Json(jobs))
}

/// GET /api/jobs/:id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id_str): Path<String>,
) -> ApiResult<Json<Job>> {
    let job_id = parse_id(&job_id_str, "job")?;
    let job = JobRepository::new(state.db.pool.clone())
        .get_by_id(&job_id)?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;
    Ok(Json(job))
}

/// POST /api/jobs - Publish a listing
pub async fn create_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let user_id = require_user(&state, &headers)?;
    payload.validate()?;

    let job = JobRepository::new(state.db.pool.clone()).create(payload)?;
    tracing::info!("User {} posted job {}", user_id, job.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// POST /api/jobs/:id/save - Bookmark a listing
pub async fn save_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let user_id = require_user(&state, &headers)?;
    let job_id = parse_id(&job_id_str, "job")?;

    let repo = JobRepository::new(state.db.pool.clone());
    repo.get_by_id(&job_id)?
        .ok_or_else(|| ApiError::NotFound("Job not found".to_string()))?;
    let outcome = repo.save(&user_id, &job_id)?;

    Ok(Json(ToggleResponse {
        message: "Job saved".to_string(),
        outcome,
    }))
}
