use crate::config::Feed;
use crate::db::Database;
use crate::inbox::WelcomeInbox;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub welcome: WelcomeInbox,
    pub feed: Feed,
}

impl AppState {
    pub fn new(db: Database, feed: Feed) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self {
            db,
            session_manager,
            welcome: WelcomeInbox::new(),
            feed,
        }
    }
}
