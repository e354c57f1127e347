// Property tests for feed paging and toggle counters

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use portal_server::config::Feed;
use portal_server::db::repositories::{EngagementRepository, PostRepository, UserRepository};
use portal_server::db::{now, Database};
use portal_server::feed::FeedQuery;
use portal_types::{FeedPost, FeedSort, Post};

#[derive(Debug, Clone)]
struct PostShape {
    likes: i64,
    comments: i64,
    minutes_ago: i64,
    is_draft: bool,
}

fn post_shape() -> impl Strategy<Value = PostShape> {
    // Small ranges so timestamp and counter ties are common
    (0i64..4, 0i64..3, 0i64..6, prop::bool::weighted(0.2)).prop_map(
        |(likes, comments, minutes_ago, is_draft)| PostShape {
            likes,
            comments,
            minutes_ago,
            is_draft,
        },
    )
}

fn build_db(shapes: &[PostShape]) -> (Database, HashSet<Uuid>) {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize schema");
    let author = UserRepository::new(db.pool.clone())
        .create("author@portal.com", "author", None)
        .expect("Failed to create author");

    let posts = PostRepository::new(db.pool.clone());
    let base = now();
    let mut published = HashSet::new();
    for shape in shapes {
        let at = base - Duration::minutes(shape.minutes_ago);
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            title: "Generated".to_string(),
            description: None,
            body: "Body".to_string(),
            tags: vec![],
            category: "General".to_string(),
            sponsored: false,
            is_draft: shape.is_draft,
            created_at: at,
            updated_at: at,
            likes_count: shape.likes,
            comments_count: shape.comments,
            saves_count: 0,
            shares_count: 0,
        };
        posts.create(&post).expect("Failed to create post");
        if !shape.is_draft {
            published.insert(post.id);
        }
    }
    (db, published)
}

/// Page through the whole feed, following next cursors
fn collect_pages(db: &Database, sort: FeedSort, limit: i64) -> Vec<Vec<FeedPost>> {
    let repo = PostRepository::new(db.pool.clone());
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let query = FeedQuery::from_params(Some(sort.as_str()), cursor.as_deref(), Some(limit), &Feed::default())
            .expect("valid query");
        let page = repo.feed(&query).expect("feed query");
        cursor = query.next_cursor(&page).map(|c| c.to_string());
        pages.push(page);
        if cursor.is_none() {
            break;
        }
    }
    pages
}

type SortKey = (i64, i64, DateTime<Utc>, Uuid);

fn sort_key(sort: FeedSort, entry: &FeedPost) -> SortKey {
    let post = &entry.post;
    match sort {
        FeedSort::Recent => (0, 0, post.created_at, post.id),
        FeedSort::Trending => (post.likes_count, post.comments_count, post.created_at, post.id),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_paging_visits_each_published_post_once(
        shapes in prop::collection::vec(post_shape(), 0..18),
        limit in 1i64..6,
        trending in any::<bool>(),
    ) {
        let sort = if trending { FeedSort::Trending } else { FeedSort::Recent };
        let (db, published) = build_db(&shapes);
        let pages = collect_pages(&db, sort, limit);

        let mut seen = HashSet::new();
        let mut previous: Option<SortKey> = None;
        for page in &pages {
            prop_assert!(page.len() <= limit as usize);
            for entry in page {
                prop_assert!(!entry.post.is_draft);
                prop_assert!(seen.insert(entry.post.id), "post returned twice");

                let key = sort_key(sort, entry);
                if let Some(prev) = &previous {
                    prop_assert!(*prev > key, "order broken: {:?} then {:?}", prev, key);
                }
                previous = Some(key);
            }
        }
        prop_assert_eq!(seen, published);
    }

    #[test]
    fn prop_like_counter_matches_final_state(
        ops in prop::collection::vec((0usize..3, any::<bool>()), 0..24),
    ) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let users = UserRepository::new(db.pool.clone());
        let author = users.create("author@portal.com", "author", None).unwrap();
        let readers: Vec<Uuid> = (0..3)
            .map(|i| users.create(&format!("r{i}@portal.com"), &format!("reader{i}"), None).unwrap().id)
            .collect();

        let posts = PostRepository::new(db.pool.clone());
        let at = now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            title: "Counted".to_string(),
            description: None,
            body: "Body".to_string(),
            tags: vec![],
            category: "General".to_string(),
            sponsored: false,
            is_draft: false,
            created_at: at,
            updated_at: at,
            likes_count: 0,
            comments_count: 0,
            saves_count: 0,
            shares_count: 0,
        };
        posts.create(&post).unwrap();

        let engagement = EngagementRepository::new(db.pool.clone());
        let mut model: HashMap<usize, bool> = HashMap::new();
        for (reader, like) in ops {
            let was_liked = model.get(&reader).copied().unwrap_or(false);
            let outcome = if like {
                engagement.like(&readers[reader], &post.id).unwrap()
            } else {
                engagement.unlike(&readers[reader], &post.id).unwrap()
            };
            // A toggle applies exactly when it changes the relationship
            prop_assert_eq!(outcome.is_applied(), was_liked != like);
            model.insert(reader, like);

            let stored = posts.get_by_id(&post.id).unwrap().unwrap();
            let expected = model.values().filter(|liked| **liked).count() as i64;
            prop_assert_eq!(stored.likes_count, expected);
            prop_assert!(stored.likes_count >= 0);
        }
    }
}
