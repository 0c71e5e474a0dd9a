use crate::{
    error::{AppError, AppResult},
    models::{reaction, Comment, Post, Reaction},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Statement,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn value(self) -> i16 {
        match self {
            ReactionKind::Like => reaction::VALUE_LIKE,
            ReactionKind::Dislike => reaction::VALUE_DISLIKE,
        }
    }
}

/// Result of a toggle: whether the actor's reaction of this kind is now
/// present, and the live count of that kind on the target.
#[derive(Debug, Clone, Copy)]
pub struct ReactionToggle {
    pub active: bool,
    pub count: u64,
}

pub struct ReactionService {
    db: DatabaseConnection,
}

impl ReactionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Flip the actor's reaction on a target.
    ///
    /// A repeat of the same kind removes the reaction; anything else upserts
    /// the single (user, target) row, which atomically replaces an opposing
    /// reaction, so like and dislike can never coexist. Counts are read live;
    /// no counter is denormalized for reactions.
    pub async fn toggle(
        &self,
        user_id: i32,
        target_type: &str,
        target_id: i32,
        kind: ReactionKind,
    ) -> AppResult<ReactionToggle> {
        self.verify_target(target_type, target_id).await?;

        let existing = Reaction::find()
            .filter(reaction::Column::UserId.eq(user_id))
            .filter(reaction::Column::TargetType.eq(target_type))
            .filter(reaction::Column::TargetId.eq(target_id))
            .one(&self.db)
            .await?;

        let active = if existing.map(|r| r.value) == Some(kind.value()) {
            Reaction::delete_many()
                .filter(reaction::Column::UserId.eq(user_id))
                .filter(reaction::Column::TargetType.eq(target_type))
                .filter(reaction::Column::TargetId.eq(target_id))
                .exec(&self.db)
                .await?;
            false
        } else {
            self.db
                .execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "INSERT INTO reactions (user_id, target_type, target_id, value, created_at)
                     VALUES ($1, $2, $3, $4, NOW())
                     ON CONFLICT (user_id, target_type, target_id)
                     DO UPDATE SET value = EXCLUDED.value",
                    vec![
                        user_id.into(),
                        target_type.into(),
                        target_id.into(),
                        kind.value().into(),
                    ],
                ))
                .await?;
            true
        };

        let count = self.count(target_type, target_id, kind).await?;
        Ok(ReactionToggle { active, count })
    }

    /// Live count of one reaction kind on a target.
    pub async fn count(
        &self,
        target_type: &str,
        target_id: i32,
        kind: ReactionKind,
    ) -> AppResult<u64> {
        let count = Reaction::find()
            .filter(reaction::Column::TargetType.eq(target_type))
            .filter(reaction::Column::TargetId.eq(target_id))
            .filter(reaction::Column::Value.eq(kind.value()))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn verify_target(&self, target_type: &str, target_id: i32) -> AppResult<()> {
        match target_type {
            reaction::TARGET_POST => {
                Post::find_by_id(target_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
            }
            reaction::TARGET_COMMENT => {
                let comment = Comment::find_by_id(target_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;

                // Reacting to comments of a locked post is rejected the same
                // way as replying to them; a locked thread is frozen.
                let post = Post::find_by_id(comment.post_id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                if post.is_locked {
                    return Err(AppError::Locked);
                }
            }
            _ => {
                return Err(AppError::Validation("Invalid target type".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_maps_to_positive_value() {
        assert_eq!(ReactionKind::Like.value(), 1);
    }

    #[test]
    fn dislike_maps_to_negative_value() {
        assert_eq!(ReactionKind::Dislike.value(), -1);
    }

    #[test]
    fn repeat_of_same_kind_toggles_off() {
        let existing = Some(ReactionKind::Like.value());
        assert_eq!(existing, Some(ReactionKind::Like.value()));
    }

    #[test]
    fn opposing_kind_replaces() {
        let existing = Some(ReactionKind::Dislike.value());
        assert_ne!(existing, Some(ReactionKind::Like.value()));
    }
}
