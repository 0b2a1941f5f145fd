//! Threaded comments attached to movies or directors.

use crate::error::ValidationError;
use crate::identity::{EntityType, RowTimestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The entity a comment is attached to.
///
/// Persisted as a `(commentable_type, commentable_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum CommentTarget {
    Movie(Uuid),
    Director(Uuid),
}

impl CommentTarget {
    /// Rebuild a target from its persisted discriminator and id.
    pub fn from_parts(commentable_type: &str, id: Uuid) -> Result<Self, ValidationError> {
        match commentable_type {
            "movie" => Ok(Self::Movie(id)),
            "director" => Ok(Self::Director(id)),
            other => Err(ValidationError::UnknownCommentTarget {
                value: other.to_string(),
            }),
        }
    }

    /// Split into the persisted discriminator and id.
    pub fn as_parts(&self) -> (&'static str, Uuid) {
        (self.entity_type().as_str(), self.id())
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Movie(_) => EntityType::Movie,
            Self::Director(_) => EntityType::Director,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Self::Movie(id) | Self::Director(id) => *id,
        }
    }
}

/// A row of the `comments` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub user_id: Uuid,
    pub target: CommentTarget,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: RowTimestamp,
    pub updated_at: RowTimestamp,
}

/// A comment with its replies, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Number of comments in this thread including the root.
    pub fn count(&self) -> usize {
        1 + self.replies.iter().map(CommentThread::count).sum::<usize>()
    }
}

/// Build reply trees from flat comment rows.
///
/// Roots are comments without a parent, plus comments whose parent is not in
/// the input (the parent was deleted or belongs to another page). Siblings
/// keep creation order; ties fall back to input order.
pub fn build_threads(mut comments: Vec<Comment>) -> Vec<CommentThread> {
    comments.sort_by_key(|c| c.created_at);

    let known: std::collections::HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_comment_id {
            Some(parent) if parent != comment.id && known.contains(&parent) => {
                children.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children))
        .collect()
}

fn attach_replies(comment: Comment, children: &mut HashMap<Uuid, Vec<Comment>>) -> CommentThread {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach_replies(child, children))
        .collect();
    CommentThread { comment, replies }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(minute: u32) -> RowTimestamp {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(12, minute, 0))
            .unwrap()
    }

    fn comment(id: u128, parent: Option<u128>, minute: u32) -> Comment {
        Comment {
            id: Uuid::from_u128(id),
            content: format!("comment {}", id),
            user_id: Uuid::nil(),
            target: CommentTarget::Movie(Uuid::from_u128(99)),
            parent_comment_id: parent.map(Uuid::from_u128),
            created_at: at(minute),
            updated_at: at(minute),
        }
    }

    #[test]
    fn test_target_parts_roundtrip() {
        let id = Uuid::from_u128(7);
        let target = CommentTarget::from_parts("director", id).unwrap();
        assert_eq!(target, CommentTarget::Director(id));
        assert_eq!(target.as_parts(), ("director", id));
    }

    #[test]
    fn test_target_rejects_unknown_type() {
        let err = CommentTarget::from_parts("review", Uuid::nil()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownCommentTarget {
                value: "review".to_string()
            }
        );
    }

    #[test]
    fn test_build_threads_nests_replies() {
        let rows = vec![
            comment(3, Some(1), 3),
            comment(1, None, 1),
            comment(2, None, 2),
            comment(4, Some(3), 4),
        ];
        let threads = build_threads(rows);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, Uuid::from_u128(1));
        assert_eq!(threads[0].count(), 3);
        assert_eq!(threads[0].replies[0].replies[0].comment.id, Uuid::from_u128(4));
        assert!(threads[1].replies.is_empty());
    }

    #[test]
    fn test_build_threads_promotes_orphans() {
        let rows = vec![comment(5, Some(404), 1), comment(6, Some(6), 2)];
        let threads = build_threads(rows);
        assert_eq!(threads.len(), 2);
        assert_eq!(threads.iter().map(CommentThread::count).sum::<usize>(), 2);
    }
}
