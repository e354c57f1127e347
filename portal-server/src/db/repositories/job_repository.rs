use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use portal_types::{CreateJobRequest, Job, ToggleOutcome};

use crate::db::{now, row_datetime, row_json, row_uuid, timestamp, DbPool};

const JOB_COLUMNS: &str =
    "j.id, j.title, j.company, j.location, j.salary_range, j.tags, j.level, j.remote, j.posted_at, j.blurb, j.apply_url";

fn map_job(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: row_uuid(row, 0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        salary_range: row.get(4)?,
        tags: row_json(row, 5)?,
        level: row.get(6)?,
        remote: row.get(7)?,
        posted_at: row_datetime(row, 8)?,
        blurb: row.get(9)?,
        apply_url: row.get(10)?,
    })
}

/// Job board search parameters. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    /// Case-insensitive substring of title or company
    pub query: Option<String>,
    /// Match jobs carrying any of these tags
    pub tags: Vec<String>,
    pub remote: Option<bool>,
    pub level: Option<String>,
    /// Only jobs posted strictly before this instant
    pub before: Option<DateTime<Utc>>,
    pub limit: u32,
}

pub struct JobRepository {
    pool: DbPool,
}

impl JobRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Search jobs, newest first
    pub fn search(&self, filter: &JobFilter) -> Result<Vec<Job>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            clauses.push("(lower(j.title) LIKE ? OR lower(j.company) LIKE ?)".to_string());
            let pattern = format!("%{}%", query.to_lowercase());
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }

        let tags: Vec<String> = filter
            .tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            let placeholders = vec!["?"; tags.len()].join(", ");
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(j.tags) WHERE lower(json_each.value) IN ({placeholders}))"
            ));
            values.extend(tags.into_iter().map(Value::Text));
        }

        if let Some(remote) = filter.remote {
            clauses.push("j.remote = ?".to_string());
            values.push(Value::Integer(i64::from(remote)));
        }

        if let Some(level) = filter.level.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            clauses.push("lower(j.level) = ?".to_string());
            values.push(Value::Text(level.to_lowercase()));
        }

        if let Some(before) = &filter.before {
            clauses.push("j.posted_at < ?".to_string());
            values.push(Value::Text(timestamp(before)));
        }

        let mut sql = format!("SELECT {JOB_COLUMNS} FROM jobs j");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY j.posted_at DESC, j.id DESC LIMIT ?");
        values.push(Value::Integer(i64::from(filter.limit)));

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params_from_iter(values.iter()), map_job)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to search jobs")?;
        Ok(jobs)
    }

    pub fn get_by_id(&self, job_id: &Uuid) -> Result<Option<Job>> {
        let conn = self.pool.get()?;
        let job = conn
            .query_row(
                &format!("SELECT {JOB_COLUMNS} FROM jobs j WHERE j.id = ?"),
                [job_id.to_string()],
                map_job,
            )
            .optional()?;
        Ok(job)
    }

    pub fn create(&self, request: CreateJobRequest) -> Result<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            company: request.company.trim().to_string(),
            location: request.location.trim().to_string(),
            salary_range: request.salary_range.filter(|s| !s.trim().is_empty()),
            tags: request
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            level: request.level.trim().to_string(),
            remote: request.remote,
            posted_at: now(),
            blurb: request.blurb.trim().to_string(),
            apply_url: request.apply_url.trim().to_string(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO jobs (id, title, company, location, salary_range, tags, level, remote, posted_at, blurb, apply_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                job.id.to_string(),
                &job.title,
                &job.company,
                &job.location,
                &job.salary_range,
                serde_json::to_string(&job.tags)?,
                &job.level,
                job.remote,
                timestamp(&job.posted_at),
                &job.blurb,
                &job.apply_url,
            ],
        )
        .context("Failed to create job")?;

        Ok(job)
    }

    /// Bookmark a job; saving twice leaves a single row
    pub fn save(&self, user_id: &Uuid, job_id: &Uuid) -> Result<ToggleOutcome> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT INTO saved_jobs (user_id, job_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, job_id) DO NOTHING",
                (user_id.to_string(), job_id.to_string(), timestamp(&now())),
            )
            .context("Failed to save job")?;
        Ok(ToggleOutcome::from_rows_affected(rows))
    }
}
