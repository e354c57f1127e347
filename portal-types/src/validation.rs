//! Request validation shared by the server and any client that wants to
//! check input before sending it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    CreateCommentRequest, CreateJobRequest, CreatePostRequest, FieldError, RegisterRequest,
    SendMessageRequest,
};

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Failed to compile email regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Failed to compile URL regex"));

pub type ValidationResult = Result<(), Vec<FieldError>>;

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, message));
    }
}

fn finish(errors: Vec<FieldError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl CreatePostRequest {
    /// Drafts only need a title and body; published posts also need a category.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        require(&mut errors, "title", &self.title, "Title is required");
        require(&mut errors, "body", &self.body, "Content is required");
        if !self.is_draft {
            let category = self.category.as_deref().unwrap_or_default();
            require(
                &mut errors,
                "category",
                category,
                "Title, content, and category are required for published posts",
            );
        }
        finish(errors)
    }
}

impl CreateCommentRequest {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        require(&mut errors, "body", &self.body, "Comment cannot be empty");
        finish(errors)
    }
}

impl SendMessageRequest {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        require(&mut errors, "body", &self.body, "Message cannot be empty");
        finish(errors)
    }
}

impl CreateJobRequest {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        require(&mut errors, "title", &self.title, "Title is required");
        require(&mut errors, "company", &self.company, "Company is required");
        require(&mut errors, "location", &self.location, "Location is required");
        require(&mut errors, "level", &self.level, "Level is required");
        require(&mut errors, "blurb", &self.blurb, "Description is required");
        if !URL_RE.is_match(self.apply_url.trim()) {
            errors.push(FieldError::new("apply_url", "Invalid URL"));
        }
        finish(errors)
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        if !EMAIL_RE.is_match(self.email.trim()) {
            errors.push(FieldError::new("email", "Invalid email format"));
        }
        if self.username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        } else if !USERNAME_RE.is_match(&self.username) {
            errors.push(FieldError::new(
                "username",
                "Username can only contain letters, numbers, and underscores",
            ));
        }
        finish(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TagsInput;

    fn post(title: &str, body: &str, category: Option<&str>, is_draft: bool) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            description: None,
            body: body.to_string(),
            tags: TagsInput::default(),
            category: category.map(str::to_string),
            sponsored: false,
            is_draft,
        }
    }

    #[test]
    fn test_published_post_requires_category() {
        let errors = post("Hello", "World", None, false).validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "category");

        assert!(post("Hello", "World", Some("tech"), false).validate().is_ok());
    }

    #[test]
    fn test_draft_skips_category() {
        assert!(post("Hello", "World", None, true).validate().is_ok());
    }

    #[test]
    fn test_post_reports_every_missing_field() {
        let errors = post("  ", "", None, false).validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "body", "category"]);
    }

    #[test]
    fn test_register_rules() {
        let ok = RegisterRequest {
            email: "dev@portal.com".to_string(),
            username: "dev_1".to_string(),
            bio: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".to_string(),
            username: "bad name!".to_string(),
            bio: None,
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_job_apply_url() {
        let mut job = CreateJobRequest {
            title: "Engineer".to_string(),
            company: "Portal".to_string(),
            location: "Remote".to_string(),
            salary_range: None,
            tags: vec![],
            level: "Senior".to_string(),
            remote: true,
            blurb: "Build things".to_string(),
            apply_url: "https://portal.com/jobs/1".to_string(),
        };
        assert!(job.validate().is_ok());

        job.apply_url = "portal dot com".to_string();
        let errors = job.validate().unwrap_err();
        assert_eq!(errors[0].field, "apply_url");
    }
}
