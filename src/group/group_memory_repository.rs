use crate::error::{AppError, Result};
use axum::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};
use uuid::Uuid;
use super::{
    group_models::{Group, GroupChanges, Member, NewGroup},
    group_repository::GroupStore,
};

/// Process-local group store. Conditional writes run under the entry's
/// shard write guard.
#[derive(Clone, Default)]
pub struct InMemoryGroupRepository {
    groups: Arc<DashMap<Uuid, Group>>,
    last_created_micros: Arc<AtomicI64>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // Strictly increasing so creation order is never ambiguous.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let prev = self
            .last_created_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or_else(|prev| prev);

        DateTime::from_timestamp_micros(now.max(prev + 1)).unwrap_or_else(Utc::now)
    }

    // Same floor as the `max_members >= 1` CHECK on the groups table.
    fn check_capacity(max_members: i32) -> Result<()> {
        if max_members < 1 {
            return Err(AppError::InternalError(format!(
                "groups.max_members must be at least 1, got {}",
                max_members
            )));
        }
        Ok(())
    }

    fn sorted(&self, mut groups: Vec<Group>) -> Vec<Group> {
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        groups
    }
}

#[async_trait]
impl GroupStore for InMemoryGroupRepository {
    async fn find_all(&self) -> Result<Vec<Group>> {
        let groups = self.groups.iter().map(|entry| entry.value().clone()).collect();
        Ok(self.sorted(groups))
    }

    async fn find_newest(&self, limit: usize) -> Result<Vec<Group>> {
        let mut groups: Vec<Group> = self.groups.iter().map(|entry| entry.value().clone()).collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        groups.truncate(limit);
        Ok(groups)
    }

    async fn find_by_id(&self, group_id: Uuid) -> Result<Option<Group>> {
        Ok(self.groups.get(&group_id).map(|entry| entry.value().clone()))
    }

    async fn find_by_creator_email(&self, email: &str) -> Result<Vec<Group>> {
        let groups = self
            .groups
            .iter()
            .filter(|entry| entry.value().created_by.email == email)
            .map(|entry| entry.value().clone())
            .collect();
        Ok(self.sorted(groups))
    }

    async fn create(&self, group: NewGroup) -> Result<Group> {
        Self::check_capacity(group.max_members)?;
        let created_at = self.next_created_at();
        let group = Group {
            id: Uuid::new_v4(),
            group_name: group.group_name,
            category: group.category,
            description: group.description,
            location: group.location,
            max_members: group.max_members,
            start_date: group.start_date,
            image_url: group.image_url,
            created_by: group.created_by,
            members: group.members,
            created_at,
            updated_at: created_at,
        };

        self.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update(&self, group_id: Uuid, changes: &GroupChanges) -> Result<Option<Group>> {
        if let Some(max_members) = changes.max_members {
            Self::check_capacity(max_members)?;
        }

        let Some(mut entry) = self.groups.get_mut(&group_id) else {
            return Ok(None);
        };

        let group = entry.value_mut();
        if let Some(max_members) = changes.max_members {
            if group.members.len() as i64 > max_members as i64 {
                return Ok(None);
            }
        }

        changes.apply_to(group);
        group.updated_at = Utc::now();
        Ok(Some(group.clone()))
    }

    async fn delete(&self, group_id: Uuid) -> Result<bool> {
        Ok(self.groups.remove(&group_id).is_some())
    }

    async fn add_member_if_eligible(
        &self,
        group_id: Uuid,
        member: &Member,
        now: DateTime<Utc>,
    ) -> Result<Option<Group>> {
        let Some(mut entry) = self.groups.get_mut(&group_id) else {
            return Ok(None);
        };

        let group = entry.value_mut();
        if now >= group.start_date || group.is_full() || group.has_member(&member.email) {
            return Ok(None);
        }

        group.members.push(member.clone());
        group.updated_at = Utc::now();
        Ok(Some(group.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_group(max_members: i32) -> NewGroup {
        NewGroup {
            group_name: "Board Game Night".into(),
            category: "Board Games".into(),
            description: "Strategy and party games every Friday evening.".into(),
            location: "Library annex".into(),
            max_members,
            start_date: Utc::now() + Duration::days(2),
            image_url: "https://example.com/games.png".into(),
            created_by: Member { name: "Ada".into(), email: "ada@example.com".into() },
            members: vec![],
        }
    }

    fn member(email: &str) -> Member {
        Member { name: email.split('@').next().unwrap().into(), email: email.into() }
    }

    #[tokio::test]
    async fn test_creation_order_is_strict() {
        let repo = InMemoryGroupRepository::new();
        let a = repo.create(new_group(5)).await.unwrap();
        let b = repo.create(new_group(5)).await.unwrap();
        assert!(b.created_at > a.created_at);

        let newest = repo.find_newest(1).await.unwrap();
        assert_eq!(newest[0].id, b.id);
    }

    #[tokio::test]
    async fn test_conditional_append() {
        let repo = InMemoryGroupRepository::new();
        let group = repo.create(new_group(1)).await.unwrap();
        let now = Utc::now();

        let joined = repo.add_member_if_eligible(group.id, &member("b@example.com"), now).await.unwrap();
        assert_eq!(joined.unwrap().members.len(), 1);

        let rejected = repo.add_member_if_eligible(group.id, &member("c@example.com"), now).await.unwrap();
        assert!(rejected.is_none());
    }

    #[tokio::test]
    async fn test_update_refuses_capacity_below_member_count() {
        let repo = InMemoryGroupRepository::new();
        let group = repo.create(new_group(3)).await.unwrap();
        let now = Utc::now();
        repo.add_member_if_eligible(group.id, &member("b@example.com"), now).await.unwrap();
        repo.add_member_if_eligible(group.id, &member("c@example.com"), now).await.unwrap();

        let changes = GroupChanges { max_members: Some(1), ..Default::default() };
        assert!(repo.update(group.id, &changes).await.unwrap().is_none());
        assert_eq!(repo.find_by_id(group.id).await.unwrap().unwrap().max_members, 3);
    }

    #[tokio::test]
    async fn test_rejects_capacity_below_one() {
        let repo = InMemoryGroupRepository::new();
        let err = repo.create(new_group(0)).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
        assert!(repo.find_all().await.unwrap().is_empty());

        let group = repo.create(new_group(2)).await.unwrap();
        let changes = GroupChanges { max_members: Some(0), ..Default::default() };
        assert!(matches!(repo.update(group.id, &changes).await, Err(AppError::InternalError(_))));
        assert_eq!(repo.find_by_id(group.id).await.unwrap().unwrap().max_members, 2);
    }
}
