/// Database row types. Distinct from the mindnest-types wire models so the
/// storage layer stays independent of the HTTP surface.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use mindnest_types::models::{
    AuthProvider, ContentSource, ContentStatus, Permissions, PrivacySettings, Role, SearchType,
};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// `None` for accounts created through Google sign-in.
    pub password_hash: Option<String>,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub reset_token_hash: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub role: Role,
    pub permissions: Permissions,
    pub privacy: PrivacySettings,
    pub display_name: Option<String>,
    pub use_display_name_in_chats: bool,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Name shown next to this user's chat messages.
    pub fn chat_name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(display) if self.use_display_name_in_chats && !display.trim().is_empty() => display,
            _ if !self.name.trim().is_empty() => &self.name,
            _ => &self.email,
        }
    }
}

pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ContentRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub body: String,
    pub source: ContentSource,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub submitted_by: Option<UserRef>,
    pub reviewed_by: Option<UserRef>,
    pub status: ContentStatus,
    pub review_notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

pub struct NewContent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub body: String,
    pub source: ContentSource,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub submitted_by: Uuid,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields an editor may change. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub source: Option<ContentSource>,
    pub source_url: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupRow {
    pub id: Uuid,
    pub name: String,
    pub admin: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub group_id: Uuid,
    pub sender: String,
    pub sender_email: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct JournalEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SearchRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query: String,
    pub search_type: SearchType,
    pub timestamp: DateTime<Utc>,
}
