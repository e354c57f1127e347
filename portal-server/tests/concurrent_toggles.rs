// Concurrent toggles against a file-backed database.
// In-memory pools hold a single connection, so races need a real file.

use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;

use anyhow::Result;
use uuid::Uuid;

use portal_server::db::repositories::{EngagementRepository, FollowRepository, PostRepository, UserRepository};
use portal_server::db::{now, Database};
use portal_types::{Post, ToggleOutcome};

const WRITERS: usize = 8;

struct TempDb {
    path: PathBuf,
    db: Database,
}

impl TempDb {
    fn new() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("portal_race_{}.db", Uuid::new_v4()));
        let db = Database::new(&path)?;
        db.initialize()?;
        Ok(Self { path, db })
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn published_post(author_id: Uuid) -> Post {
    let at = now();
    Post {
        id: Uuid::new_v4(),
        author_id,
        title: "Race".to_string(),
        description: None,
        body: "Who wins?".to_string(),
        tags: vec![],
        category: "Engineering".to_string(),
        sponsored: false,
        is_draft: false,
        created_at: at,
        updated_at: at,
        likes_count: 0,
        comments_count: 0,
        saves_count: 0,
        shares_count: 0,
    }
}

/// Run `op` from `WRITERS` threads released at the same instant
fn race<F>(op: F) -> Vec<ToggleOutcome>
where
    F: Fn() -> Result<ToggleOutcome> + Send + Sync + 'static,
{
    let op = Arc::new(op);
    let barrier = Arc::new(Barrier::new(WRITERS));
    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let op = Arc::clone(&op);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                op()
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|h| h.join().expect("writer panicked").expect("toggle failed"))
        .collect()
}

#[test]
fn concurrent_likes_apply_exactly_once() -> Result<()> {
    let temp = TempDb::new()?;
    let pool = temp.db.pool.clone();
    let author = UserRepository::new(pool.clone()).create("author@portal.com", "author", None)?;
    let reader = UserRepository::new(pool.clone()).create("reader@portal.com", "reader", None)?;
    let post = published_post(author.id);
    PostRepository::new(pool.clone()).create(&post)?;

    let like_pool = pool.clone();
    let (reader_id, post_id) = (reader.id, post.id);
    let outcomes = race(move || EngagementRepository::new(like_pool.clone()).like(&reader_id, &post_id));

    let applied = outcomes.iter().filter(|o| o.is_applied()).count();
    assert_eq!(applied, 1);

    let stored = PostRepository::new(pool.clone()).get_by_id(&post.id)?.expect("post exists");
    assert_eq!(stored.likes_count, 1);

    let unlike_pool = pool.clone();
    let outcomes = race(move || EngagementRepository::new(unlike_pool.clone()).unlike(&reader_id, &post_id));
    assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 1);

    let stored = PostRepository::new(pool).get_by_id(&post.id)?.expect("post exists");
    assert_eq!(stored.likes_count, 0);
    Ok(())
}

#[test]
fn concurrent_follows_apply_exactly_once() -> Result<()> {
    let temp = TempDb::new()?;
    let pool = temp.db.pool.clone();
    let users = UserRepository::new(pool.clone());
    let alice = users.create("alice@portal.com", "alice", None)?;
    let bob = users.create("bob@portal.com", "bob", None)?;

    let follow_pool = pool.clone();
    let (alice_id, bob_id) = (alice.id, bob.id);
    let outcomes = race(move || FollowRepository::new(follow_pool.clone()).follow(&alice_id, &bob_id));
    assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 1);

    let bob = users.get_by_id(&bob_id)?.expect("bob exists");
    assert_eq!(bob.followers_count, 1);
    let alice = users.get_by_id(&alice_id)?.expect("alice exists");
    assert_eq!(alice.following_count, 1);
    Ok(())
}
