// Comment service
// Decision: Create and delete go through the graph coordinator; editing text touches one row

use std::collections::HashMap;

use spicescape_core::{guards, AppError, Result};
use uuid::Uuid;

use super::graph::{GraphCoordinator, COMMENT_NOT_FOUND, RECIPE_NOT_FOUND};
use crate::api::comments::{CommentRequest, CommentView};
use crate::api::common::UserSummary;
use crate::api::validation::validate_comment_text;
use crate::storage::{CommentRow, CreateCommentRow, StorageBackend};

pub struct CommentService {
    db: StorageBackend,
    graph: GraphCoordinator,
}

impl CommentService {
    pub fn new(db: StorageBackend) -> Self {
        let graph = GraphCoordinator::new(db.clone());
        Self { db, graph }
    }

    /// Comments on a recipe, oldest first
    pub async fn list_for_recipe(&self, recipe_id: Uuid) -> Result<Vec<CommentView>> {
        if self.db.get_recipe(recipe_id).await?.is_none() {
            return Err(AppError::not_found(RECIPE_NOT_FOUND));
        }
        let rows = self.db.list_comments_for_recipe(recipe_id).await?;
        comment_views(&self.db, rows).await
    }

    pub async fn create(&self, user_id: Uuid, recipe_id: Uuid, text: String) -> Result<CommentRow> {
        self.graph
            .create_comment(CreateCommentRow {
                parent_post: recipe_id,
                made_by: user_id,
                text,
            })
            .await
    }

    pub async fn get(&self, comment_id: Uuid) -> Result<CommentView> {
        let row = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))?;

        comment_views(&self.db, vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))
    }

    /// Replace the text of a comment written by `user_id`
    pub async fn edit(&self, user_id: Uuid, comment_id: Uuid, req: CommentRequest) -> Result<CommentRow> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))?;
        guards::ensure_owner(
            comment.made_by,
            user_id,
            "You are not authorized to modify this comment",
        )?;

        let text = validate_comment_text(req.text.as_deref())?;
        self.db
            .update_comment(comment.id, text)
            .await?
            .ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND))
    }

    pub async fn delete(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        self.graph.delete_comment(user_id, comment_id).await?;
        Ok(())
    }
}

/// Attach author summaries to comment rows, keeping their order.
/// Comments whose author is gone are left out until reconcile removes them.
pub(crate) async fn comment_views(
    db: &StorageBackend,
    rows: Vec<CommentRow>,
) -> Result<Vec<CommentView>> {
    let mut author_ids: Vec<Uuid> = rows.iter().map(|c| c.made_by).collect();
    author_ids.sort();
    author_ids.dedup();

    let authors: HashMap<Uuid, UserSummary> = db
        .get_users_by_ids(&author_ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let author = authors.get(&row.made_by)?.clone();
            Some(CommentView::new(row, author))
        })
        .collect())
}
