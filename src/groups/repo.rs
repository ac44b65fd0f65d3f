use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub created_at: OffsetDateTime,
}

impl Group {
    /// Create a group with its initial member set in one transaction.
    pub async fn create(
        db: &PgPool,
        name: &str,
        member_ids: &[Uuid],
    ) -> anyhow::Result<(Group, Vec<Uuid>)> {
        let mut tx = db.begin().await?;
        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        for user_id in member_ids {
            sqlx::query("INSERT INTO groups_users (group_id, user_id) VALUES ($1, $2)")
                .bind(group.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok((group, member_ids.to_vec()))
    }

    /// Load a group together with its member ids. The member set is what
    /// authorization is decided against.
    pub async fn find_with_members(
        db: &PgPool,
        id: Uuid,
    ) -> anyhow::Result<Option<(Group, Vec<Uuid>)>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, created_at FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;

        let Some(group) = group else {
            return Ok(None);
        };

        let member_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM groups_users WHERE group_id = $1",
        )
        .bind(group.id)
        .fetch_all(db)
        .await?;

        Ok(Some((group, member_ids)))
    }

    /// Rename the group and replace its member set atomically.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        member_ids: &[Uuid],
    ) -> anyhow::Result<(Group, Vec<Uuid>)> {
        let mut tx = db.begin().await?;
        let group = sqlx::query_as::<_, Group>(
            "UPDATE groups SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM groups_users WHERE group_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for user_id in member_ids {
            sqlx::query("INSERT INTO groups_users (group_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok((group, member_ids.to_vec()))
    }
}
