use crate::{
    auth::Identity,
    category::category_service::CategoryService,
    error::{AppError, Result},
};
use chrono::{DateTime, Utc};
use std::{collections::HashSet, sync::Arc};
use uuid::Uuid;
use validator::Validate;
use super::{
    group_dto::{CreateGroupRequest, UpdateGroupRequest},
    group_models::{CategoryCount, Group, GroupChanges, GroupStats, GroupStatus, Member, NewGroup},
    group_repository::GroupStore,
};

pub const FEATURED_LIMIT: usize = 6;
const TOP_CATEGORY_LIMIT: usize = 4;

/// Owns every mutation of group state and the rules around it.
#[derive(Clone)]
pub struct GroupService {
    repo: Arc<dyn GroupStore>,
    categories: CategoryService,
}

impl GroupService {
    pub fn new(repo: Arc<dyn GroupStore>, categories: CategoryService) -> Self {
        Self { repo, categories }
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        self.repo.find_all().await
    }

    pub async fn featured_groups(&self) -> Result<Vec<Group>> {
        self.repo.find_newest(FEATURED_LIMIT).await
    }

    pub async fn get_group(&self, group_id: Uuid) -> Result<Group> {
        self.repo
            .find_by_id(group_id)
            .await?
            .ok_or_else(group_not_found)
    }

    pub async fn list_groups_by_creator(&self, email: &str) -> Result<Vec<Group>> {
        self.repo.find_by_creator_email(email).await
    }

    pub async fn create_group(
        &self,
        creator: Identity,
        payload: CreateGroupRequest,
        now: DateTime<Utc>,
    ) -> Result<Group> {
        let payload = payload.normalized();
        payload.validate()?;
        self.ensure_category(&payload.category).await?;
        ensure_future_start(payload.start_date, now)?;

        let members = payload.members.unwrap_or_default();
        let mut seen = HashSet::new();
        if !members.iter().all(|m| seen.insert(m.email.as_str())) {
            return Err(AppError::Validation("Member emails must be unique".to_string()));
        }
        if members.len() as i64 > payload.max_members as i64 {
            return Err(AppError::Validation(
                "Initial members exceed the maximum member count".to_string(),
            ));
        }

        let group = self
            .repo
            .create(NewGroup {
                group_name: payload.group_name,
                category: payload.category,
                description: payload.description,
                location: payload.location,
                max_members: payload.max_members,
                start_date: payload.start_date,
                image_url: payload.image_url,
                created_by: creator.into(),
                members,
            })
            .await?;

        tracing::info!("Group {} created by {}", group.id, group.created_by.email);
        Ok(group)
    }

    pub async fn update_group(
        &self,
        group_id: Uuid,
        actor: &Identity,
        payload: UpdateGroupRequest,
        now: DateTime<Utc>,
    ) -> Result<Group> {
        let payload = payload.normalized();
        payload.validate()?;

        let group = self.get_group(group_id).await?;
        ensure_owner(&group, actor, "update")?;

        if let Some(category) = &payload.category {
            self.ensure_category(category).await?;
        }
        if let Some(start_date) = payload.start_date {
            ensure_future_start(start_date, now)?;
        }
        if let Some(max_members) = payload.max_members {
            ensure_capacity_fits(&group, max_members)?;
        }

        let changes = GroupChanges {
            group_name: payload.group_name,
            category: payload.category,
            description: payload.description,
            location: payload.location,
            max_members: payload.max_members,
            start_date: payload.start_date,
            image_url: payload.image_url,
        };

        match self.repo.update(group_id, &changes).await? {
            Some(updated) => Ok(updated),
            // Lost a race: the group was deleted or gained members meanwhile.
            None => {
                let current = self.get_group(group_id).await?;
                ensure_capacity_fits(&current, changes.max_members.unwrap_or(current.max_members))?;
                Err(AppError::InvalidState("Group changed during update, please retry".to_string()))
            }
        }
    }

    pub async fn delete_group(&self, group_id: Uuid, actor: &Identity) -> Result<()> {
        let group = self.get_group(group_id).await?;
        ensure_owner(&group, actor, "delete")?;

        if !self.repo.delete(group_id).await? {
            return Err(group_not_found());
        }

        tracing::info!("Group {} deleted by {}", group_id, actor.email);
        Ok(())
    }

    pub async fn join_group(
        &self,
        group_id: Uuid,
        joiner: Identity,
        now: DateTime<Utc>,
    ) -> Result<Group> {
        let group = self.get_group(group_id).await?;
        check_joinable(&group, &joiner.email, now)?;

        let member = Member::from(joiner);
        match self.repo.add_member_if_eligible(group_id, &member, now).await? {
            Some(updated) => {
                tracing::info!(
                    "{} joined group {} ({}/{})",
                    member.email,
                    group_id,
                    updated.members.len(),
                    updated.max_members
                );
                Ok(updated)
            }
            None => {
                // The conditional write did not apply; report why from fresh state.
                let current = self.get_group(group_id).await?;
                check_joinable(&current, &member.email, now)?;
                Err(AppError::InvalidState("Could not join this group, please retry".to_string()))
            }
        }
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<GroupStats> {
        let groups = self.repo.find_all().await?;
        Ok(summarize(&groups, now))
    }

    async fn ensure_category(&self, category: &str) -> Result<()> {
        if self.categories.contains(category).await? {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Unknown category '{}'", category)))
        }
    }
}

fn group_not_found() -> AppError {
    AppError::NotFound("Group not found".to_string())
}

fn ensure_owner(group: &Group, actor: &Identity, action: &str) -> Result<()> {
    if group.is_owned_by(&actor.email) {
        return Ok(());
    }

    tracing::warn!("{} attempted to {} group {} owned by someone else", actor.email, action, group.id);
    Err(AppError::Forbidden(format!("You are not authorized to {} this group", action)))
}

fn ensure_future_start(start_date: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if start_date > now {
        Ok(())
    } else {
        Err(AppError::Validation("Start date must be in the future".to_string()))
    }
}

fn ensure_capacity_fits(group: &Group, max_members: i32) -> Result<()> {
    if max_members < 1 {
        return Err(AppError::Validation("Maximum members must be at least 1".to_string()));
    }
    if group.members.len() as i64 > max_members as i64 {
        return Err(AppError::InvalidState(format!(
            "Maximum members cannot be lower than the current member count ({})",
            group.members.len()
        )));
    }
    Ok(())
}

/// Join rules in the order they are reported.
fn check_joinable(group: &Group, email: &str, now: DateTime<Utc>) -> Result<()> {
    if group.status_at(now) == GroupStatus::Past {
        return Err(AppError::InvalidState("This group is no longer active".to_string()));
    }
    if group.is_full() {
        return Err(AppError::InvalidState("This group is already full".to_string()));
    }
    if group.has_member(email) {
        return Err(AppError::InvalidState("You are already a member of this group".to_string()));
    }
    Ok(())
}

fn summarize(groups: &[Group], now: DateTime<Utc>) -> GroupStats {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for group in groups {
        match counts.iter_mut().find(|c| c.category == group.category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount {
                category: group.category.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    counts.truncate(TOP_CATEGORY_LIMIT);

    GroupStats {
        total_groups: groups.len(),
        active_groups: groups
            .iter()
            .filter(|g| g.status_at(now) == GroupStatus::Active)
            .count(),
        total_members: groups.iter().map(|g| g.members.len()).sum(),
        top_categories: counts,
    }
}
