use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    AuthProvider, ContentSource, ContentStatus, Permissions, PrivacySettings, ProfileVisibility,
    Role, SearchType,
};

// -- JWT Claims --

/// Session token claims. Issued by the auth handlers and decoded by the
/// request middleware; the role claim is informational, authorization
/// re-reads the stored user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub provider: AuthProvider,
    pub exp: usize,
}

// -- Envelopes --

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

// -- Users --

/// The `{id, name, email}` projection used wherever another record
/// references a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A user as shown to admins and to the user themselves. Never carries
/// password hashes, OTPs or reset tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Permissions,
    pub privacy_settings: PrivacySettings,
    pub display_name: Option<String>,
    pub use_display_name_in_chats: bool,
    pub is_verified: bool,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub provider: AuthProvider,
    pub is_verified: bool,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub message: String,
    pub user: Claims,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// -- Privacy --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettingsPatch {
    pub profile_visibility: Option<ProfileVisibility>,
    pub data_sharing: Option<bool>,
    pub ai_model_training: Option<bool>,
    pub third_party_integrations: Option<bool>,
}

impl PrivacySettingsPatch {
    pub fn apply(&self, current: PrivacySettings) -> PrivacySettings {
        PrivacySettings {
            profile_visibility: self.profile_visibility.unwrap_or(current.profile_visibility),
            data_sharing: self.data_sharing.unwrap_or(current.data_sharing),
            ai_model_training: self.ai_model_training.unwrap_or(current.ai_model_training),
            third_party_integrations: self
                .third_party_integrations
                .unwrap_or(current.third_party_integrations),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePrivacyRequest {
    pub privacy_settings: Option<PrivacySettingsPatch>,
    pub display_name: Option<String>,
    pub use_display_name_in_chats: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub privacy_settings: PrivacySettings,
    pub display_name: String,
    pub use_display_name_in_chats: bool,
}

// -- Admin --

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsPatch {
    pub can_approve_content: Option<bool>,
    pub can_edit_content: Option<bool>,
    pub can_delete_content: Option<bool>,
    pub can_manage_users: Option<bool>,
}

impl PermissionsPatch {
    pub fn apply(&self, current: Permissions) -> Permissions {
        Permissions {
            can_approve_content: self.can_approve_content.unwrap_or(current.can_approve_content),
            can_edit_content: self.can_edit_content.unwrap_or(current.can_edit_content),
            can_delete_content: self.can_delete_content.unwrap_or(current.can_delete_content),
            can_manage_users: self.can_manage_users.unwrap_or(current.can_manage_users),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: Option<Uuid>,
    pub role: Option<Role>,
    pub permissions: Option<PermissionsPatch>,
}

// -- Content --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub source: ContentSource,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub submitted_by: Option<UserSummary>,
    pub reviewed_by: Option<UserSummary>,
    pub status: ContentStatus,
    pub review_notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub source: Option<ContentSource>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial edit. Fields left out keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateContentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub source: Option<ContentSource>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub review_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewContentRequest {
    pub content_id: Option<Uuid>,
    pub status: Option<ContentStatus>,
    pub review_notes: Option<String>,
}

// -- Groups --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub admin: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub group_id: Option<Uuid>,
    pub member_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupRequest {
    pub group_id: Option<Uuid>,
    pub member_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GroupActionResponse {
    pub success: bool,
    pub message: String,
    pub group: GroupResponse,
}

// -- Chat messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendChatMessageRequest {
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender: String,
    pub sender_email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// -- Journal --

#[derive(Debug, Deserialize)]
pub struct CreateJournalEntryRequest {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryResponse {
    pub id: Uuid,
    pub mood: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct JournalSavedResponse {
    pub message: String,
    pub entry: JournalEntryResponse,
}

// -- Resources --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub query: String,
    pub search_type: SearchType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSearchRequest {
    pub query: Option<String>,
    pub search_type: Option<SearchType>,
}

// -- AI conversation --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiConversationRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AiConversationResponse {
    pub content: String,
}
