use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a stored or submitted string is not one of an enum's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Enums that travel as fixed strings, both on the wire and in SQLite columns.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant { kind: stringify!($name), value: s.to_string() }),
                }
            }
        }
    };
}

string_enum! {
    Role {
        User => "user",
        Admin => "admin",
        ContentValidator => "content_validator",
    }
}

string_enum! {
    /// Lifecycle of a moderation-queue item.
    ContentStatus {
        Pending => "Pending",
        Approved => "Approved",
        Rejected => "Rejected",
        NeedsRevision => "Needs Revision",
    }
}

string_enum! {
    ContentSource {
        GoogleScholar => "Google Scholar",
        GoogleBooks => "Google Books",
        ManualSubmission => "Manual Submission",
    }
}

string_enum! {
    Mood {
        Happy => "Happy",
        Sad => "Sad",
        Excited => "Excited",
        Angry => "Angry",
        Anxious => "Anxious",
        Relaxed => "Relaxed",
        Tired => "Tired",
        Confident => "Confident",
        Frustrated => "Frustrated",
        Grateful => "Grateful",
        Lonely => "Lonely",
        Motivated => "Motivated",
    }
}

string_enum! {
    ProfileVisibility {
        Public => "public",
        Private => "private",
        Friends => "friends",
    }
}

string_enum! {
    SearchType {
        Google => "google",
        Scholar => "scholar",
        Books => "books",
    }
}

string_enum! {
    /// How the account signs in.
    AuthProvider {
        Credentials => "credentials",
        Google => "google",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl Default for ContentStatus {
    fn default() -> Self {
        ContentStatus::Pending
    }
}

impl Default for SearchType {
    fn default() -> Self {
        SearchType::Google
    }
}

impl ContentStatus {
    /// Statuses a reviewer may assign. `Pending` is only ever the initial state.
    pub fn is_review_outcome(&self) -> bool {
        !matches!(self, ContentStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_approve_content: bool,
    pub can_edit_content: bool,
    pub can_delete_content: bool,
    pub can_manage_users: bool,
}

impl Permissions {
    pub fn all() -> Self {
        Self {
            can_approve_content: true,
            can_edit_content: true,
            can_delete_content: true,
            can_manage_users: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    /// Anonymized research use.
    pub data_sharing: bool,
    pub ai_model_training: bool,
    pub third_party_integrations: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Public,
            data_sharing: true,
            ai_model_training: true,
            third_party_integrations: true,
        }
    }
}
