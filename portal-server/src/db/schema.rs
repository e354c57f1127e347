/// SQL schema for the Portal database
/// Creates all tables with proper constraints, foreign keys, and indexes.
/// Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix)
/// so text comparison orders them chronologically.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    username TEXT UNIQUE NOT NULL,
    bio TEXT,
    avatar_url TEXT,
    followers_count INTEGER NOT NULL DEFAULT 0 CHECK(followers_count >= 0),
    following_count INTEGER NOT NULL DEFAULT 0 CHECK(following_count >= 0),
    created_at TEXT NOT NULL
);

-- Posts table with denormalized engagement counters
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    body TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    category TEXT NOT NULL DEFAULT '',
    sponsored INTEGER NOT NULL DEFAULT 0,
    is_draft INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    likes_count INTEGER NOT NULL DEFAULT 0 CHECK(likes_count >= 0),
    comments_count INTEGER NOT NULL DEFAULT 0 CHECK(comments_count >= 0),
    saves_count INTEGER NOT NULL DEFAULT 0 CHECK(saves_count >= 0),
    shares_count INTEGER NOT NULL DEFAULT 0 CHECK(shares_count >= 0),
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Feed indexes: one per sort key
CREATE INDEX IF NOT EXISTS idx_posts_recent ON posts(is_draft, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_posts_trending
    ON posts(is_draft, likes_count DESC, comments_count DESC, created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created_at DESC);

-- Likes: at most one row per (user, post)
CREATE TABLE IF NOT EXISTS likes (
    user_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_post_id ON likes(post_id);

-- Saves: at most one row per (user, post)
CREATE TABLE IF NOT EXISTS saves (
    user_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_saves_post_id ON saves(post_id);

-- Comments table
CREATE TABLE IF NOT EXISTS comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id, created_at);

-- Follows table (one-way relationships)
CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL,
    following_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (follower_id, following_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (following_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);

-- Message threads between two users, one unread counter per side
CREATE TABLE IF NOT EXISTS message_threads (
    id TEXT PRIMARY KEY,
    user_a_id TEXT NOT NULL,
    user_b_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    unread_for_user_a INTEGER NOT NULL DEFAULT 0 CHECK(unread_for_user_a >= 0),
    unread_for_user_b INTEGER NOT NULL DEFAULT 0 CHECK(unread_for_user_b >= 0),
    FOREIGN KEY (user_a_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (user_b_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_threads_user_a ON message_threads(user_a_id);
CREATE INDEX IF NOT EXISTS idx_threads_user_b ON message_threads(user_b_id);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    thread_id TEXT NOT NULL,
    sender_id TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (thread_id) REFERENCES message_threads(id) ON DELETE CASCADE,
    FOREIGN KEY (sender_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, created_at);

-- Notifications
CREATE TABLE IF NOT EXISTS notifications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('LIKE', 'COMMENT', 'FOLLOW', 'MENTION', 'SYSTEM')),
    data TEXT NOT NULL DEFAULT '{}',
    is_read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at DESC);

-- Job board
CREATE TABLE IF NOT EXISTS jobs (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    location TEXT NOT NULL,
    salary_range TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    level TEXT NOT NULL,
    remote INTEGER NOT NULL DEFAULT 0,
    posted_at TEXT NOT NULL,
    blurb TEXT NOT NULL,
    apply_url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_posted_at ON jobs(posted_at DESC);

CREATE TABLE IF NOT EXISTS saved_jobs (
    user_id TEXT NOT NULL,
    job_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, job_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (job_id) REFERENCES jobs(id) ON DELETE CASCADE
);

-- Key/value flags (e.g. one-shot welcome actions)
CREATE TABLE IF NOT EXISTS portal_system (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL DEFAULT '{}'
);

-- Sessions for token authentication
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Username of the official account that sends welcome messages and
/// likes every user's first published post
pub const PORTAL_USERNAME: &str = "portal";

/// Demo data for development
/// - the official `portal` account plus four members
/// - published posts and one draft, with likes, saves and comments
/// - follows, welcome threads and notifications
/// - a handful of job listings
///
/// Counters are left at zero here; `Database::seed_demo_data` recomputes them
/// from the junction rows afterwards.
pub const SEED_DATA: &str = r#"
-- ============================================================================
-- USERS
-- ============================================================================
INSERT OR IGNORE INTO users (id, email, username, bio, avatar_url, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440000', 'portal@portal.com', 'portal', 'Official Portal account - Welcome to the community!', NULL, '2024-01-01T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440001', 'alice@portal.com', 'alice', 'Product designer exploring design systems', NULL, '2024-01-02T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'bob@portal.com', 'bob', 'Backend engineer, databases and queues', NULL, '2024-01-03T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'charlie@portal.com', 'charlie', 'Recruiter connecting startups with builders', NULL, '2024-01-04T00:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', 'diana@portal.com', 'diana', 'Data scientist | Coffee and charts', NULL, '2024-01-05T00:00:00.000000Z');

-- ============================================================================
-- POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, author_id, title, description, body, tags, category, sponsored, is_draft, created_at, updated_at) VALUES
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'Design tokens at scale', 'How we stopped arguing about spacing', 'Design tokens gave our team one vocabulary for color, type and spacing.', '["design","systems"]', 'Design', 0, 0, '2024-01-10T10:00:00.000000Z', '2024-01-10T10:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', 'Cursor pagination done right', NULL, 'Offsets drift when rows move. Paginate on the sort key instead.', '["databases","api"]', 'Engineering', 0, 0, '2024-01-09T14:30:00.000000Z', '2024-01-09T14:30:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440003', 'Hiring: what we look for', NULL, 'Curiosity, clear writing, and shipped work beat any resume keyword.', '["careers"]', 'Careers', 0, 0, '2024-01-08T09:15:00.000000Z', '2024-01-08T09:15:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440004', 'Charts that lie', 'Truncated axes and other crimes', 'A y-axis that does not start at zero can turn noise into a trend.', '["data","visualization"]', 'Data', 0, 0, '2024-01-07T16:45:00.000000Z', '2024-01-07T16:45:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440005', '550e8400-e29b-41d4-a716-446655440002', 'Counters and idempotency', NULL, 'Let the unique constraint decide whether the counter moves.', '["databases"]', 'Engineering', 0, 0, '2024-01-06T08:00:00.000000Z', '2024-01-06T08:00:00.000000Z'),
    ('650e8400-e29b-41d4-a716-446655440006', '550e8400-e29b-41d4-a716-446655440001', 'Unfinished thoughts on motion', NULL, 'Draft: easing curves and when to skip animation entirely.', '[]', '', 0, 1, '2024-01-11T12:00:00.000000Z', '2024-01-11T12:00:00.000000Z');

-- ============================================================================
-- ENGAGEMENT
-- ============================================================================
INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440001', '2024-01-10T11:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440001', '2024-01-10T12:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', '650e8400-e29b-41d4-a716-446655440001', '2024-01-10T13:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440002', '2024-01-09T15:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', '650e8400-e29b-41d4-a716-446655440002', '2024-01-09T16:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440004', '2024-01-07T17:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440004', '2024-01-07T18:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440005', '2024-01-06T09:00:00.000000Z');

INSERT OR IGNORE INTO saves (user_id, post_id, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440002', '2024-01-09T17:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', '650e8400-e29b-41d4-a716-446655440001', '2024-01-10T14:00:00.000000Z');

INSERT OR IGNORE INTO comments (id, post_id, author_id, body, created_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', 'We adopted tokens last quarter. Never going back.', '2024-01-10T11:30:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440004', 'What about ties on the timestamp?', '2024-01-09T15:30:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', 'Add the id as a tie breaker.', '2024-01-09T15:45:00.000000Z'),
    ('750e8400-e29b-41d4-a716-446655440004', '650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440003', 'Saving this for the next board meeting.', '2024-01-07T19:00:00.000000Z');

-- ============================================================================
-- SOCIAL GRAPH
-- ============================================================================
INSERT OR IGNORE INTO follows (follower_id, following_id, created_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', '2024-01-05T10:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', '2024-01-05T11:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '2024-01-05T12:00:00.000000Z'),
    ('550e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440002', '2024-01-05T13:00:00.000000Z');

-- ============================================================================
-- INBOX
-- ============================================================================
-- Welcome threads from the official account, unread for the member (side B)
INSERT OR IGNORE INTO message_threads (id, user_a_id, user_b_id, created_at, updated_at, unread_for_user_a, unread_for_user_b) VALUES
    ('850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440000', '550e8400-e29b-41d4-a716-446655440001', '2024-01-02T00:05:00.000000Z', '2024-01-02T00:05:00.000000Z', 0, 1),
    ('850e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440000', '550e8400-e29b-41d4-a716-446655440002', '2024-01-03T00:05:00.000000Z', '2024-01-03T00:05:00.000000Z', 0, 1),
    ('850e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440003', '2024-01-08T10:00:00.000000Z', '2024-01-08T10:10:00.000000Z', 1, 0);

INSERT OR IGNORE INTO messages (id, thread_id, sender_id, body, created_at) VALUES
    ('950e8400-e29b-41d4-a716-446655440001', '850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440000', 'Welcome to Portal! We are excited to have you join our professional community.', '2024-01-02T00:05:00.000000Z'),
    ('950e8400-e29b-41d4-a716-446655440002', '850e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440000', 'Welcome to Portal! We are excited to have you join our professional community.', '2024-01-03T00:05:00.000000Z'),
    ('950e8400-e29b-41d4-a716-446655440003', '850e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', 'Loved your hiring post. Are you looking for designers?', '2024-01-08T10:00:00.000000Z'),
    ('950e8400-e29b-41d4-a716-446655440004', '850e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440003', 'Always! Send me your portfolio.', '2024-01-08T10:10:00.000000Z');

INSERT OR IGNORE INTO notifications (id, user_id, type, data, is_read, created_at) VALUES
    ('a50e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', 'LIKE', '{"username":"bob","postTitle":"Design tokens at scale","postId":"650e8400-e29b-41d4-a716-446655440001"}', 0, '2024-01-10T11:00:00.000000Z'),
    ('a50e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440001', 'COMMENT', '{"username":"bob","postTitle":"Design tokens at scale","postId":"650e8400-e29b-41d4-a716-446655440001","commentBody":"We adopted tokens last quarter. Never going back."}', 1, '2024-01-10T11:30:00.000000Z'),
    ('a50e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440002', 'FOLLOW', '{"username":"alice","userId":"550e8400-e29b-41d4-a716-446655440001"}', 0, '2024-01-05T10:00:00.000000Z'),
    ('a50e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440001', 'SYSTEM', '{"message":"Complete your profile to get discovered"}', 0, '2024-01-02T00:10:00.000000Z');

-- ============================================================================
-- JOBS
-- ============================================================================
INSERT OR IGNORE INTO jobs (id, title, company, location, salary_range, tags, level, remote, posted_at, blurb, apply_url) VALUES
    ('b50e8400-e29b-41d4-a716-446655440001', 'Senior Backend Engineer', 'Streamline', 'Berlin', '€80k - €100k', '["rust","postgres"]', 'Senior', 1, '2024-01-10T09:00:00.000000Z', 'Own our ingestion pipeline end to end.', 'https://streamline.example/jobs/backend'),
    ('b50e8400-e29b-41d4-a716-446655440002', 'Product Designer', 'Northwind', 'New York', '$120k - $150k', '["design","figma"]', 'Mid', 0, '2024-01-09T09:00:00.000000Z', 'Shape the first version of our mobile app.', 'https://northwind.example/careers/designer'),
    ('b50e8400-e29b-41d4-a716-446655440003', 'Data Analyst', 'Brightside', 'London', NULL, '["sql","python"]', 'Junior', 1, '2024-01-08T09:00:00.000000Z', 'Turn product events into decisions.', 'https://brightside.example/apply/analyst');
"#;
