use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// BaseData user profile.
///
/// Fields this tool does not know about are kept in `extra` so a PUT sends
/// the record back as it was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub employment_date: Option<NaiveDate>,
    #[serde(default)]
    pub english_level: i32,
    pub office_location_id: Option<Uuid>,
    pub room_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

/// Firebase auth user record, as far as this tool cares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseUser {
    #[serde(rename = "localId")]
    pub uid: String,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub disabled: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}
