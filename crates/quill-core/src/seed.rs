//! Deterministic fixture data
//!
//! Installs a small, fixed dataset with well-known ids and credentials so
//! clients and tests can log in and address records without discovery.
//! Creation times are staggered so default sorts are stable.

use crate::models::{
    slugify, Comment, Like, LikeTarget, Post, PostStatus, Tag, User, UserRole,
};
use crate::password::mark_password;
use crate::store::Store;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

pub const TEST_USER_ID: &str = "user-1";
pub const ADMIN_USER_ID: &str = "admin-1";
pub const INACTIVE_USER_ID: &str = "inactive-1";

/// Counts of what [`seed_fixtures`] installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tags: usize,
    pub posts: usize,
    pub comments: usize,
    pub likes: usize,
}

struct UserFixture {
    id: &'static str,
    username: &'static str,
    email: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: UserRole,
    is_active: bool,
}

const USERS: &[UserFixture] = &[
    UserFixture {
        id: TEST_USER_ID,
        username: "testuser",
        email: "test@example.com",
        password: "test123",
        first_name: "Test",
        last_name: "User",
        role: UserRole::User,
        is_active: true,
    },
    UserFixture {
        id: ADMIN_USER_ID,
        username: "admin",
        email: "admin@example.com",
        password: "admin123",
        first_name: "Admin",
        last_name: "User",
        role: UserRole::Admin,
        is_active: true,
    },
    UserFixture {
        id: INACTIVE_USER_ID,
        username: "inactive",
        email: "inactive@example.com",
        password: "inactive123",
        first_name: "Inactive",
        last_name: "User",
        role: UserRole::User,
        is_active: false,
    },
];

// (id, name, slug, color)
const TAGS: &[(&str, &str, &str, &str)] = &[
    ("tag-1", "JavaScript", "javascript", "#f7df1e"),
    ("tag-2", "React", "react", "#61dafb"),
    ("tag-3", "Node.js", "nodejs", "#339933"),
];

struct PostFixture {
    id: &'static str,
    title: &'static str,
    content: &'static str,
    status: PostStatus,
    author_id: &'static str,
    tag_ids: &'static [&'static str],
    view_count: u64,
}

const POSTS: &[PostFixture] = &[
    PostFixture {
        id: "post-1",
        title: "Test Post by User",
        content: "This is a test post created by the regular test user.",
        status: PostStatus::Published,
        author_id: TEST_USER_ID,
        tag_ids: &["tag-1", "tag-2"],
        view_count: 5,
    },
    PostFixture {
        id: "admin-post",
        title: "Admin Post",
        content: "This post was written by the administrator.",
        status: PostStatus::Published,
        author_id: ADMIN_USER_ID,
        tag_ids: &["tag-1", "tag-3"],
        view_count: 10,
    },
    PostFixture {
        id: "post-3",
        title: "Draft Post",
        content: "This post is still a draft and stays out of the public listing.",
        status: PostStatus::Draft,
        author_id: TEST_USER_ID,
        tag_ids: &["tag-2"],
        view_count: 0,
    },
];

// (id, author, post, parent, content)
const COMMENTS: &[(&str, &str, &str, Option<&str>, &str)] = &[
    ("comment-1", TEST_USER_ID, "post-1", None, "This is a test comment"),
    ("comment-2", ADMIN_USER_ID, "post-1", None, "This is an admin comment"),
    (
        "comment-3",
        ADMIN_USER_ID,
        "post-1",
        Some("comment-1"),
        "This is a reply to the test comment",
    ),
];

// (id, user, target type, target)
const LIKES: &[(&str, &str, LikeTarget, &str)] = &[
    ("like-1", ADMIN_USER_ID, LikeTarget::Post, "post-1"),
    ("like-2", TEST_USER_ID, LikeTarget::Comment, "comment-1"),
];

/// Populate an empty store with the fixture dataset
pub async fn seed_fixtures(store: &dyn Store) -> Result<SeedSummary> {
    let base = Utc::now() - Duration::days(30);
    let at = |step: i64| -> DateTime<Utc> { base + Duration::hours(step) };
    let mut summary = SeedSummary::default();

    for fixture in USERS {
        let mut user = User::new(
            fixture.username,
            fixture.email,
            mark_password(fixture.password),
            fixture.role,
        );
        user.id = fixture.id.to_string();
        user.first_name = fixture.first_name.to_string();
        user.last_name = fixture.last_name.to_string();
        user.is_active = fixture.is_active;
        user.created_at = at(0);
        user.updated_at = user.created_at;
        store.insert_user(user).await?;
        summary.users += 1;
    }

    for (id, name, slug, color) in TAGS {
        let mut tag = Tag::new(*name, *color);
        tag.id = id.to_string();
        tag.slug = slug.to_string();
        tag.created_at = at(0);
        store.insert_tag(tag).await?;
        summary.tags += 1;
    }

    for (step, fixture) in (1..).zip(POSTS) {
        let mut post = Post::new(
            fixture.title,
            fixture.content,
            None,
            fixture.status,
            fixture.author_id,
            fixture.tag_ids.iter().map(|t| t.to_string()).collect(),
        );
        post.id = fixture.id.to_string();
        post.slug = slugify(fixture.title);
        post.view_count = fixture.view_count;
        post.created_at = at(step);
        post.updated_at = post.created_at;
        store.insert_post(post).await?;
        summary.posts += 1;
    }

    for (step, (id, author, post, parent, content)) in (10..).zip(COMMENTS) {
        let mut comment = Comment::new(*content, *author, *post, parent.map(str::to_string));
        comment.id = id.to_string();
        comment.created_at = at(step);
        comment.updated_at = comment.created_at;
        store.insert_comment(comment).await?;
        summary.comments += 1;
    }

    for (id, user, target_type, target) in LIKES {
        let mut like = Like::new(*user, *target_type, *target);
        like.id = id.to_string();
        store.insert_like(like).await?;
        summary.likes += 1;
    }

    info!(
        users = summary.users,
        tags = summary.tags,
        posts = summary.posts,
        comments = summary.comments,
        likes = summary.likes,
        "Seeded fixture data"
    );
    Ok(summary)
}
