//! Revision history for posts: one append-only row per net content change,
//! holding a line diff against the previous revision and a full snapshot of
//! the combined form.

use std::collections::HashMap;

use dissimilar::Chunk;
use sea_orm::sea_query::Expr;
use sea_orm::ConnectionTrait;

use crate::entity::prelude::*;
use crate::ids::{RevisionId, UserId};

// Lines are mapped into plane-15 private use characters; the plane holds
// 65534 code points, far beyond the largest combined form.
const LINE_BASE: u32 = 0xF0000;

fn encode<'a>(text: &'a str, table: &mut Vec<&'a str>, index: &mut HashMap<&'a str, char>) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.split('\n')
        .map(|line| {
            *index.entry(line).or_insert_with(|| {
                table.push(line);
                char::from_u32(LINE_BASE + (table.len() as u32 - 1)).unwrap_or('\u{FFFD}')
            })
        })
        .collect()
}

/// Line-based diff between two texts. Each distinct line is mapped to a
/// single private-use char so the char-level diff aligns to line boundaries,
/// then the chunks decode back into `' '`/`'-'`/`'+'`-prefixed lines.
pub fn line_diff(prev: &str, curr: &str) -> String {
    let mut table = Vec::new();
    let mut index = HashMap::new();
    let a = encode(prev, &mut table, &mut index);
    let b = encode(curr, &mut table, &mut index);

    let mut out = String::new();
    for chunk in dissimilar::diff(&a, &b) {
        let (prefix, encoded) = match chunk {
            Chunk::Equal(s) => (' ', s),
            Chunk::Delete(s) => ('-', s),
            Chunk::Insert(s) => ('+', s),
        };
        for c in encoded.chars() {
            let i = (c as u32).wrapping_sub(LINE_BASE) as usize;
            out.push(prefix);
            out.push_str(table.get(i).copied().unwrap_or(""));
            out.push('\n');
        }
    }
    out
}

/// Reconstructs the text the diff was computed from: its `' '` and `'-'` lines.
pub fn diff_prior(diff: &str) -> String {
    reconstruct(diff, '-')
}

/// Reconstructs the text the diff produces: its `' '` and `'+'` lines.
pub fn diff_current(diff: &str) -> String {
    reconstruct(diff, '+')
}

fn reconstruct(diff: &str, keep: char) -> String {
    let mut lines = Vec::new();
    for line in diff.split('\n') {
        let mut chars = line.chars();
        match chars.next() {
            Some(prefix) if prefix == ' ' || prefix == keep => lines.push(chars.as_str()),
            _ => {}
        }
    }
    lines.join("\n")
}

/// Creates a revision from a post. Compares the combined form against the
/// latest revision and records one only if the content actually changed.
/// Returns `None` on a no-op save.
pub(crate) async fn create_revision<C: ConnectionTrait>(
    conn: &C,
    post: &PostModel,
    author: UserId,
) -> Result<Option<PostRevisionModel>, DbErr> {
    // comments are only notable at creation; their edits do not version
    if post.kind == PostKind::Comment {
        return Ok(None);
    }

    let last = PostRevision::find()
        .filter(PostRevisionColumn::PostId.eq(post.id))
        .order_by_desc(PostRevisionColumn::Date)
        .one(conn)
        .await?;
    let prev = last.map(|rev| rev.content).unwrap_or_default();

    let content = post.combine();
    if content == prev {
        return Ok(None);
    }

    let revision = PostRevisionActiveModel {
        id: Set(RevisionId::new()),
        post_id: Set(post.id),
        author_id: Set(author),
        date: Set(post.lastedit_date),
        diff: Set(line_diff(&prev, &content)),
        content: Set(content),
    }
    .insert(conn)
    .await?;

    Post::update_many()
        .col_expr(
            PostColumn::RevisionCount,
            Expr::col(PostColumn::RevisionCount).add(1),
        )
        .filter(PostColumn::Id.eq(post.id))
        .exec(conn)
        .await?;

    Ok(Some(revision))
}

pub(crate) async fn list_revisions<C: ConnectionTrait>(
    conn: &C,
    post_id: crate::ids::PostId,
) -> Result<Vec<PostRevisionModel>, DbErr> {
    PostRevision::find()
        .filter(PostRevisionColumn::PostId.eq(post_id))
        .order_by_asc(PostRevisionColumn::Date)
        .all(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_diff_reconstructs_both_sides() {
        let prev = "alpha\nbeta\ngamma";
        let curr = "alpha\ndelta\ngamma\nepsilon";

        let diff = line_diff(prev, curr);

        assert_eq!(diff_prior(&diff), prev);
        assert_eq!(diff_current(&diff), curr);
        assert!(diff.lines().any(|l| l == "-beta"));
        assert!(diff.lines().any(|l| l == "+delta"));
    }

    #[test]
    fn test_line_diff_from_empty() {
        let diff = line_diff("", "first\nsecond");

        assert_eq!(diff_prior(&diff), "");
        assert_eq!(diff_current(&diff), "first\nsecond");
        assert!(diff.lines().all(|l| l.starts_with('+')));
    }

    #[test]
    fn test_line_diff_identical_is_all_context() {
        let text = "same\nlines";
        let diff = line_diff(text, text);

        assert!(diff.lines().all(|l| l.starts_with(' ')));
        assert_eq!(diff_prior(&diff), text);
        assert_eq!(diff_current(&diff), text);
    }
}
