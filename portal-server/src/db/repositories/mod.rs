mod user_repository;
pub(crate) mod post_repository;
mod engagement_repository;
mod follow_repository;
mod notification_repository;
mod thread_repository;
mod job_repository;
mod system_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use engagement_repository::{EngagementRepository, PostRelation};
pub use follow_repository::FollowRepository;
pub use notification_repository::NotificationRepository;
pub use thread_repository::ThreadRepository;
pub use job_repository::{JobFilter, JobRepository};
pub use system_repository::SystemRepository;
