use crate::error::Result;
use axum::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;
use super::group_models::{Group, GroupChanges, Member, NewGroup};

/// Persistence for groups. Every write that guards an invariant is a single
/// conditional operation so concurrent requests cannot interleave between
/// the check and the write.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Group>>;

    /// Newest first, ties broken by id.
    async fn find_newest(&self, limit: usize) -> Result<Vec<Group>>;

    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>>;

    async fn find_by_creator_email(&self, email: &str) -> Result<Vec<Group>>;

    async fn create(&self, group: NewGroup) -> Result<Group>;

    /// Returns `None` if the group is gone or the current member count
    /// exceeds a lowered `max_members`.
    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>>;

    async fn delete(&self, group_id: Uuid) -> Result<bool>;

    /// Appends `member` only if, at write time, the group starts after `now`,
    /// is below capacity and has no member with the same email.
    async fn add_member_if_eligible(
        &self,
        group_id: Uuid,
        member: &Member,
        now: DateTime<Utc>,
    ) -> Result<Option<Group>>;
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    group_name: String,
    category: String,
    description: String,
    location: String,
    max_members: i32,
    start_date: DateTime<Utc>,
    image_url: String,
    created_by_name: String,
    created_by_email: String,
    members: Json<Vec<Member>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: row.id,
            group_name: row.group_name,
            category: row.category,
            description: row.description,
            location: row.location,
            max_members: row.max_members,
            start_date: row.start_date,
            image_url: row.image_url,
            created_by: Member {
                name: row.created_by_name,
                email: row.created_by_email,
            },
            members: row.members.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupStore for GroupRepository {
    async fn find_all(&self) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT * FROM groups ORDER BY created_at ASC, id ASC"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn find_newest(&self, limit: usize) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT * FROM groups ORDER BY created_at DESC, id ASC LIMIT $1"
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT * FROM groups WHERE id = $1"
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    async fn find_by_creator_email(&self, email: &str) -> Result<Vec<Group>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT * FROM groups WHERE created_by_email = $1 ORDER BY created_at ASC, id ASC"
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn create(&self, group: NewGroup) -> Result<Group> {
        let row = sqlx::query_as::<_, GroupRow>(
            "INSERT INTO groups (group_name, category, description, location, max_members,
                                 start_date, image_url, created_by_name, created_by_email, members)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *"
        )
        .bind(&group.group_name)
        .bind(&group.category)
        .bind(&group.description)
        .bind(&group.location)
        .bind(group.max_members)
        .bind(group.start_date)
        .bind(&group.image_url)
        .bind(&group.created_by.name)
        .bind(&group.created_by.email)
        .bind(Json(&group.members))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            "UPDATE groups
             SET group_name = COALESCE($1, group_name),
                 category = COALESCE($2, category),
                 description = COALESCE($3, description),
                 location = COALESCE($4, location),
                 max_members = COALESCE($5, max_members),
                 start_date = COALESCE($6, start_date),
                 image_url = COALESCE($7, image_url),
                 updated_at = NOW()
             WHERE id = $8
               AND ($5::int4 IS NULL OR jsonb_array_length(members) <= $5::int4)
             RETURNING *"
        )
        .bind(changes.group_name.as_deref())
        .bind(changes.category.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.location.as_deref())
        .bind(changes.max_members)
        .bind(changes.start_date)
        .bind(changes.image_url.as_deref())
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Group::from))
    }

    async fn delete(&self, group_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_member_if_eligible(
        &self,
        group_id: Uuid,
        member: &Member,
        now: DateTime<Utc>,
    ) -> Result<Option<Group>> {
        // Row lock + requalification under READ COMMITTED keeps the whole
        // predicate atomic with the append.
        let row = sqlx::query_as::<_, GroupRow>(
            "UPDATE groups
             SET members = members || jsonb_build_array(jsonb_build_object('name', $2::text, 'email', $3::text)),
                 updated_at = NOW()
             WHERE id = $1
               AND start_date > $4
               AND jsonb_array_length(members) < max_members
               AND NOT members @> jsonb_build_array(jsonb_build_object('email', $3::text))
             RETURNING *"
        )
        .bind(group_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Group::from))
    }
}
