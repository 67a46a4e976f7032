//! Typed filter predicates and sort orders for list queries
//!
//! Each entity has a closed set of predicates: exact matches, case-insensitive
//! substring matches, and matches on a related record's field. A query is a
//! conjunction of predicates plus one sort order.

use crate::models::{Comment, Post, PostStatus, Tag, User};
use serde::Deserialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = crate::QuillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(crate::QuillError::ValidationError(format!(
                "Unknown sort order: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F> Sort<F> {
    pub fn new(field: F, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPredicate {
    Status(PostStatus),
    AuthorId(String),
    /// Related-field match on the author's username
    AuthorUsername(String),
    /// Related-field match on any attached tag's name
    TagName(String),
    /// Related-field match on any attached tag's slug
    TagSlug(String),
    TitleContains(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    ViewCount,
}

impl PostSortField {
    /// Unknown field names fall back to creation time
    pub fn parse(field: &str) -> Self {
        match field {
            "title" => PostSortField::Title,
            "viewCount" => PostSortField::ViewCount,
            "updatedAt" => PostSortField::UpdatedAt,
            _ => PostSortField::CreatedAt,
        }
    }

    fn compare(self, a: &Post, b: &Post) -> Ordering {
        match self {
            PostSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            PostSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            PostSortField::Title => a.title.cmp(&b.title),
            PostSortField::ViewCount => a.view_count.cmp(&b.view_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub predicates: Vec<PostPredicate>,
    pub sort: Sort<PostSortField>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: Sort::new(PostSortField::CreatedAt, SortDirection::Desc),
        }
    }
}

impl PostQuery {
    pub fn with(mut self, predicate: PostPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn sorted_by(mut self, sort: Sort<PostSortField>) -> Self {
        self.sort = sort;
        self
    }

    /// Evaluate every predicate. Related lookups are supplied by the store.
    pub fn matches<'a>(
        &self,
        post: &Post,
        author: &dyn Fn(&str) -> Option<&'a User>,
        tag: &dyn Fn(&str) -> Option<&'a Tag>,
    ) -> bool {
        self.predicates.iter().all(|predicate| match predicate {
            PostPredicate::Status(status) => post.status == *status,
            PostPredicate::AuthorId(id) => &post.author_id == id,
            PostPredicate::AuthorUsername(username) => author(&post.author_id)
                .map(|u| &u.username == username)
                .unwrap_or(false),
            PostPredicate::TagName(name) => post
                .tag_ids
                .iter()
                .filter_map(|id| tag(id))
                .any(|t| &t.name == name),
            PostPredicate::TagSlug(slug) => post
                .tag_ids
                .iter()
                .filter_map(|id| tag(id))
                .any(|t| &t.slug == slug),
            PostPredicate::TitleContains(needle) => contains_ci(&post.title, needle),
        })
    }

    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        self.sort.direction.apply(self.sort.field.compare(a, b))
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentPredicate {
    PostId(String),
    AuthorId(String),
    NotDeleted,
    /// Only comments without a parent
    TopLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentSortField {
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentQuery {
    pub predicates: Vec<CommentPredicate>,
    pub sort: Sort<CommentSortField>,
}

impl Default for CommentQuery {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: Sort::new(CommentSortField::CreatedAt, SortDirection::Desc),
        }
    }
}

impl CommentQuery {
    pub fn with(mut self, predicate: CommentPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn sorted_by(mut self, sort: Sort<CommentSortField>) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.predicates.iter().all(|predicate| match predicate {
            CommentPredicate::PostId(id) => &comment.post_id == id,
            CommentPredicate::AuthorId(id) => &comment.author_id == id,
            CommentPredicate::NotDeleted => !comment.is_deleted,
            CommentPredicate::TopLevel => comment.parent_comment_id.is_none(),
        })
    }

    pub fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        let ordering = match self.sort.field {
            CommentSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        self.sort.direction.apply(ordering)
    }
}

// ============================================================================
// Users and tags
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPredicate {
    UsernameContains(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub predicates: Vec<UserPredicate>,
}

impl UserQuery {
    pub fn with(mut self, predicate: UserPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.predicates.iter().all(|predicate| match predicate {
            UserPredicate::UsernameContains(needle) => contains_ci(&user.username, needle),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPredicate {
    NameContains(String),
}

impl TagPredicate {
    pub fn matches(&self, tag: &Tag) -> bool {
        match self {
            TagPredicate::NameContains(needle) => contains_ci(&tag.name, needle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn post(title: &str, status: PostStatus, views: u64) -> Post {
        let mut post = Post::new(title, "body", None, status, "user-1", vec!["tag-1".to_string()]);
        post.view_count = views;
        post
    }

    #[test]
    fn test_post_predicates() {
        let author = User::new("testuser", "test@example.com", "pw", UserRole::User);
        let mut tag = Tag::new("JavaScript", "#f7df1e");
        tag.id = "tag-1".to_string();
        let mut p = post("Learning Rust", PostStatus::Published, 0);
        p.author_id = author.id.clone();

        let lookup_user = |id: &str| (id == author.id).then_some(&author);
        let lookup_tag = |id: &str| (id == tag.id).then_some(&tag);

        let query = PostQuery::default()
            .with(PostPredicate::Status(PostStatus::Published))
            .with(PostPredicate::AuthorUsername("testuser".to_string()))
            .with(PostPredicate::TagName("JavaScript".to_string()))
            .with(PostPredicate::TitleContains("rust".to_string()));
        assert!(query.matches(&p, &lookup_user, &lookup_tag));

        let drafts = PostQuery::default().with(PostPredicate::Status(PostStatus::Draft));
        assert!(!drafts.matches(&p, &lookup_user, &lookup_tag));

        let other_tag = PostQuery::default().with(PostPredicate::TagSlug("react".to_string()));
        assert!(!other_tag.matches(&p, &lookup_user, &lookup_tag));
    }

    #[test]
    fn test_post_sort() {
        let a = post("Alpha", PostStatus::Published, 3);
        let b = post("Beta", PostStatus::Published, 1);

        let by_title = PostQuery::default().sorted_by(Sort::new(PostSortField::Title, SortDirection::Asc));
        assert_eq!(by_title.compare(&a, &b), Ordering::Less);

        let by_views = PostQuery::default()
            .sorted_by(Sort::new(PostSortField::ViewCount, SortDirection::Desc));
        assert_eq!(by_views.compare(&a, &b), Ordering::Less);
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(PostSortField::parse("title"), PostSortField::Title);
        assert_eq!(PostSortField::parse("viewCount"), PostSortField::ViewCount);
        assert_eq!(PostSortField::parse("bogus"), PostSortField::CreatedAt);
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
    }

    #[test]
    fn test_comment_predicates() {
        let mut reply = Comment::new("reply", "user-1", "post-1", Some("comment-1".to_string()));
        let query = CommentQuery::default()
            .with(CommentPredicate::PostId("post-1".to_string()))
            .with(CommentPredicate::NotDeleted);
        assert!(query.matches(&reply));

        let top_level = query.clone().with(CommentPredicate::TopLevel);
        assert!(!top_level.matches(&reply));

        reply.is_deleted = true;
        assert!(!query.matches(&reply));
    }

    #[test]
    fn test_user_and_tag_search_is_case_insensitive() {
        let user = User::new("TestUser", "t@example.com", "pw", UserRole::User);
        let query = UserQuery::default().with(UserPredicate::UsernameContains("testu".to_string()));
        assert!(query.matches(&user));

        let tag = Tag::new("JavaScript", "#f7df1e");
        assert!(TagPredicate::NameContains("java".to_string()).matches(&tag));
        assert!(!TagPredicate::NameContains("rust".to_string()).matches(&tag));
    }
}
