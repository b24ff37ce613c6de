use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::group_models::{deserialize_optional_start_date, deserialize_start_date, Member};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 5, max = 100))]
    pub group_name: String,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(min = 20, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(range(min = 2, max = 100))]
    pub max_members: i32,
    #[serde(deserialize_with = "deserialize_start_date")]
    #[schema(value_type = String, example = "2030-05-01")]
    pub start_date: DateTime<Utc>,
    #[validate(url, custom(function = "validate_http_scheme"))]
    pub image_url: String,
    #[validate(nested)]
    pub members: Option<Vec<Member>>,
}

impl CreateGroupRequest {
    pub fn normalized(mut self) -> Self {
        self.group_name = self.group_name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.image_url = self.image_url.trim().to_string();
        self
    }
}

/// Partial update. Identifier, owner and member list are not part of the
/// payload, so any such keys in the body are dropped during deserialization.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupRequest {
    #[validate(length(min = 5, max = 100))]
    pub group_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub category: Option<String>,
    #[validate(length(min = 20, max = 2000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub location: Option<String>,
    #[validate(range(min = 2, max = 100))]
    pub max_members: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_optional_start_date")]
    #[schema(value_type = Option<String>, example = "2030-05-01")]
    pub start_date: Option<DateTime<Utc>>,
    #[validate(url, custom(function = "validate_http_scheme"))]
    pub image_url: Option<String>,
}

impl UpdateGroupRequest {
    pub fn normalized(mut self) -> Self {
        fn trim(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string())
        }

        self.group_name = trim(self.group_name);
        self.category = trim(self.category);
        self.description = trim(self.description);
        self.location = trim(self.location);
        self.image_url = trim(self.image_url);
        self
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_http_scheme(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        let mut err = ValidationError::new("http_url");
        err.message = Some("Must be a valid URL starting with http:// or https://".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> serde_json::Value {
        json!({
            "groupName": "  Weekend Hikers  ",
            "category": "Hiking",
            "description": "Trail walks every weekend around the valley.",
            "location": "Valley Trailhead",
            "maxMembers": 10,
            "startDate": "2099-06-01",
            "imageUrl": "https://example.com/hike.jpg",
            "createdBy": { "name": "Mallory", "email": "mallory@example.com" }
        })
    }

    #[test]
    fn test_valid_create_request() {
        let req: CreateGroupRequest = serde_json::from_value(valid_body()).unwrap();
        let req = req.normalized();
        assert_eq!(req.group_name, "Weekend Hikers");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_short_name_after_trim() {
        let mut body = valid_body();
        body["groupName"] = json!("  abc   ");
        let req: CreateGroupRequest = serde_json::from_value(body).unwrap();
        assert!(req.normalized().validate().is_err());
    }

    #[test]
    fn test_rejects_zero_max_members() {
        let mut body = valid_body();
        body["maxMembers"] = json!(0);
        let req: CreateGroupRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("max_members"));
    }

    #[test]
    fn test_rejects_non_http_image_url() {
        let mut body = valid_body();
        body["imageUrl"] = json!("ftp://example.com/hike.jpg");
        let req: CreateGroupRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("image_url"));
    }

    #[test]
    fn test_rejects_invalid_member_email() {
        let mut body = valid_body();
        body["members"] = json!([{ "name": "Bob", "email": "not-an-email" }]);
        let req: CreateGroupRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_ignores_owner_and_identifier_keys() {
        let req: UpdateGroupRequest = serde_json::from_value(json!({
            "_id": "00000000-0000-0000-0000-000000000000",
            "createdBy": { "name": "Eve", "email": "eve@example.com" },
            "userEmail": "eve@example.com",
            "location": "Old Mill"
        }))
        .unwrap();
        assert_eq!(req.location.as_deref(), Some("Old Mill"));
        assert!(req.group_name.is_none());
        assert!(req.start_date.is_none());
    }
}
