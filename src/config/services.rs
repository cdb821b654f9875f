use serde::Deserialize;

/// ================================
/// Downstream APIs
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub base_data: BaseDataConfig,
    pub les: LesConfig,
    pub firebase: FirebaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BaseDataConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LesConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FirebaseConfig {
    pub project_id: String,
    pub bucket: String,
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_storage_url")]
    pub storage_url: String,
    #[serde(default = "default_avatar_folder")]
    pub avatar_folder: String,
    #[serde(default = "default_avatar_content_type")]
    pub avatar_content_type: String,
    /// Photo given to users created by `create_empty_user`.
    pub default_photo_url: Option<String>,
}

fn default_identity_url() -> String {
    "https://identitytoolkit.googleapis.com".to_owned()
}

fn default_storage_url() -> String {
    "https://firebasestorage.googleapis.com".to_owned()
}

fn default_avatar_folder() -> String {
    "images/avatars".to_owned()
}

fn default_avatar_content_type() -> String {
    "application/octet-stream".to_owned()
}
