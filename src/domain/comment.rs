use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub username: String,
    pub parent_id: Option<i64>,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

/// Deepest reply level accepted. Top-level comments sit at depth 0.
pub const MAX_REPLY_DEPTH: i32 = 50;

/// Assembles a flat list of comments on one post into reply trees.
///
/// Siblings are ordered oldest first. A comment whose parent is not in the
/// list is promoted to a root. Walks with an explicit stack, so the depth of
/// the input does not bound the call stack.
pub fn build_thread(comments: Vec<Comment>) -> Vec<CommentNode> {
    let known: HashSet<i64> = comments.iter().map(|comment| comment.id).collect();

    let mut children: HashMap<Option<i64>, Vec<Comment>> = HashMap::new();
    for comment in comments {
        let parent = comment.parent_id.filter(|id| known.contains(id));
        children.entry(parent).or_default().push(comment);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let mut roots = Vec::new();
    let mut top_level = children.remove(&None).unwrap_or_default().into_iter();
    let mut open: Vec<OpenNode> = Vec::new();

    loop {
        let next = match open.last_mut() {
            Some(node) => node.pending.next(),
            None => top_level.next(),
        };

        if let Some(comment) = next {
            let pending = children
                .remove(&Some(comment.id))
                .unwrap_or_default()
                .into_iter();
            open.push(OpenNode {
                comment,
                pending,
                replies: Vec::new(),
            });
            continue;
        }

        let Some(done) = open.pop() else { break };
        let node = CommentNode {
            comment: done.comment,
            replies: done.replies,
        };
        match open.last_mut() {
            Some(parent) => parent.replies.push(node),
            None => roots.push(node),
        }
    }

    roots
}

/// A comment whose replies are still being assembled.
struct OpenNode {
    comment: Comment,
    pending: std::vec::IntoIter<Comment>,
    replies: Vec<CommentNode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    fn comment(id: i64, parent_id: Option<i64>, minutes: i64) -> Comment {
        Comment {
            id,
            post_id: 1,
            user_id: 1,
            username: "alice".to_string(),
            parent_id,
            text: format!("comment {}", id),
            created_at: datetime!(2024-03-01 12:00 UTC) + Duration::minutes(minutes),
        }
    }

    #[test]
    fn nests_replies_under_parents() {
        let thread = build_thread(vec![
            comment(4, Some(2), 4),
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, None, 2),
            comment(5, Some(1), 5),
        ]);

        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].comment.id, 1);
        assert_eq!(thread[1].comment.id, 3);

        let replies: Vec<i64> = thread[0].replies.iter().map(|node| node.comment.id).collect();
        assert_eq!(replies, vec![2, 5]);
        assert_eq!(thread[0].replies[0].replies[0].comment.id, 4);
        assert!(thread[1].replies.is_empty());
    }

    #[test]
    fn siblings_with_equal_timestamps_order_by_id() {
        let thread = build_thread(vec![comment(9, None, 0), comment(7, None, 0)]);
        let ids: Vec<i64> = thread.iter().map(|node| node.comment.id).collect();
        assert_eq!(ids, vec![7, 9]);
    }

    #[test]
    fn orphans_become_roots() {
        let thread = build_thread(vec![comment(2, Some(99), 0)]);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].comment.id, 2);
    }

    #[test]
    fn deep_reply_chains_do_not_recurse() {
        let depth = 10_000;
        let chain: Vec<Comment> = (1..=depth)
            .map(|id| comment(id, if id == 1 { None } else { Some(id - 1) }, id))
            .collect();

        let mut level = build_thread(chain);
        let mut seen = 0;
        // Unwind one level at a time so dropping the tree stays shallow too.
        while let Some(mut node) = level.pop() {
            seen += 1;
            assert_eq!(node.comment.id, seen);
            assert!(level.is_empty());
            level = std::mem::take(&mut node.replies);
        }
        assert_eq!(seen, depth);
    }

    #[test]
    fn empty_input_gives_empty_thread() {
        assert!(build_thread(Vec::new()).is_empty());
    }

    #[test]
    fn serializes_replies_inline() {
        let thread = build_thread(vec![comment(1, None, 0), comment(2, Some(1), 1)]);
        let value = serde_json::to_value(&thread).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["replies"][0]["id"], 2);
        assert_eq!(value[0]["replies"][0]["parent_id"], 1);
    }
}
