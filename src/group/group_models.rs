use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Identity;

/// A `{name, email}` pair, used both for members and for the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Member {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

impl From<Identity> for Member {
    fn from(identity: Identity) -> Self {
        Self {
            name: identity.name,
            email: identity.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub group_name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub max_members: i32,
    pub start_date: DateTime<Utc>,
    pub image_url: String,
    pub created_by: Member,
    pub members: Vec<Member>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupStatus {
    Active,
    Past,
}

impl Group {
    pub fn status_at(&self, now: DateTime<Utc>) -> GroupStatus {
        if now < self.start_date {
            GroupStatus::Active
        } else {
            GroupStatus::Past
        }
    }

    pub fn is_full(&self) -> bool {
        self.members.len() as i64 >= self.max_members as i64
    }

    pub fn has_member(&self, email: &str) -> bool {
        self.members.iter().any(|m| m.email == email)
    }

    pub fn is_owned_by(&self, email: &str) -> bool {
        self.created_by.email == email
    }
}

/// Fields for a group about to be persisted.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub group_name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub max_members: i32,
    pub start_date: DateTime<Utc>,
    pub image_url: String,
    pub created_by: Member,
    pub members: Vec<Member>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct GroupChanges {
    pub group_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub max_members: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
}

impl GroupChanges {
    pub fn apply_to(&self, group: &mut Group) {
        if let Some(v) = &self.group_name {
            group.group_name = v.clone();
        }
        if let Some(v) = &self.category {
            group.category = v.clone();
        }
        if let Some(v) = &self.description {
            group.description = v.clone();
        }
        if let Some(v) = &self.location {
            group.location = v.clone();
        }
        if let Some(v) = self.max_members {
            group.max_members = v;
        }
        if let Some(v) = self.start_date {
            group.start_date = v;
        }
        if let Some(v) = &self.image_url {
            group.image_url = v.clone();
        }
    }
}

/// A group as returned over HTTP, with read-time derived state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    #[serde(flatten)]
    pub group: Group,
    pub member_count: usize,
    pub is_full: bool,
    pub status: GroupStatus,
}

impl GroupResponse {
    pub fn at(group: Group, now: DateTime<Utc>) -> Self {
        Self {
            member_count: group.members.len(),
            is_full: group.is_full(),
            status: group.status_at(now),
            group,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub total_groups: usize,
    pub active_groups: usize,
    pub total_members: usize,
    pub top_categories: Vec<CategoryCount>,
}

/// Accepts either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_start_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn deserialize_start_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_start_date(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid startDate '{}': expected RFC 3339 or YYYY-MM-DD", raw))
    })
}

pub fn deserialize_optional_start_date<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_start_date(&raw).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid startDate '{}': expected RFC 3339 or YYYY-MM-DD", raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn group(max_members: i32, members: usize, start_in: Duration) -> Group {
        let now = Utc::now();
        Group {
            id: Uuid::new_v4(),
            group_name: "Sunday Sketchers".into(),
            category: "Drawing & Painting".into(),
            description: "Weekly sketching in the park for all levels".into(),
            location: "Central Park".into(),
            max_members,
            start_date: now + start_in,
            image_url: "https://example.com/a.png".into(),
            created_by: Member { name: "Ada".into(), email: "ada@example.com".into() },
            members: (0..members)
                .map(|i| Member { name: format!("m{i}"), email: format!("m{i}@example.com") })
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_is_derived_from_start_date() {
        let g = group(5, 0, Duration::days(1));
        assert_eq!(g.status_at(Utc::now()), GroupStatus::Active);
        assert_eq!(g.status_at(g.start_date), GroupStatus::Past);
        assert_eq!(g.status_at(g.start_date + Duration::seconds(1)), GroupStatus::Past);
    }

    #[test]
    fn test_is_full() {
        assert!(!group(2, 1, Duration::days(1)).is_full());
        assert!(group(2, 2, Duration::days(1)).is_full());
    }

    #[test]
    fn test_parse_start_date_formats() {
        assert_eq!(
            parse_start_date("2030-05-01"),
            Some(Utc.with_ymd_and_hms(2030, 5, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_start_date("2030-05-01T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2030, 5, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(parse_start_date("next tuesday"), None);
    }

    #[test]
    fn test_response_wire_shape() {
        let g = group(3, 1, Duration::days(1));
        let id = g.id;
        let json = serde_json::to_value(GroupResponse::at(g, Utc::now())).unwrap();

        assert_eq!(json["_id"], id.to_string());
        assert_eq!(json["groupName"], "Sunday Sketchers");
        assert_eq!(json["maxMembers"], 3);
        assert_eq!(json["createdBy"]["email"], "ada@example.com");
        assert_eq!(json["memberCount"], 1);
        assert_eq!(json["isFull"], false);
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_changes_leave_unset_fields() {
        let mut g = group(3, 0, Duration::days(1));
        let changes = GroupChanges {
            location: Some("Riverside".into()),
            ..Default::default()
        };
        changes.apply_to(&mut g);
        assert_eq!(g.location, "Riverside");
        assert_eq!(g.group_name, "Sunday Sketchers");
    }
}
