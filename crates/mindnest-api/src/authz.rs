use uuid::Uuid;

use mindnest_db::models::UserRow;
use mindnest_types::models::{Permissions, Role};

use crate::error::ApiError;
use crate::{AppState, with_db};

/// Privileged operations. Checked against the stored account, so role and
/// permission changes apply from the next request on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// List, read, create and edit content.
    ModerateContent,
    ReviewContent,
    DeleteContent,
    ManageUsers,
}

impl Access {
    pub fn allows(self, role: Role, permissions: &Permissions) -> bool {
        let moderator = matches!(role, Role::Admin | Role::ContentValidator);
        match self {
            Access::ModerateContent => moderator,
            Access::ReviewContent => moderator && permissions.can_approve_content,
            Access::DeleteContent => {
                moderator && (role == Role::Admin || permissions.can_delete_content)
            }
            Access::ManageUsers => role == Role::Admin && permissions.can_manage_users,
        }
    }

    fn denial(self) -> &'static str {
        match self {
            Access::ModerateContent => "Not authorized",
            Access::ReviewContent => "Not authorized to review content",
            Access::DeleteContent => "Not authorized to delete content",
            Access::ManageUsers => "Not authorized to manage users",
        }
    }
}

/// Loads the caller and checks `access`. Returns the stored user on success.
pub async fn authorize(state: &AppState, user_id: Uuid, access: Access) -> Result<UserRow, ApiError> {
    let user = with_db(state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    if !access.allows(user.role, &user.permissions) {
        return Err(ApiError::forbidden(access.denial()));
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(approve: bool, delete: bool, manage: bool) -> Permissions {
        Permissions {
            can_approve_content: approve,
            can_edit_content: false,
            can_delete_content: delete,
            can_manage_users: manage,
        }
    }

    #[test]
    fn plain_users_get_nothing() {
        let all = Permissions::all();
        for access in [Access::ModerateContent, Access::ReviewContent, Access::DeleteContent, Access::ManageUsers] {
            assert!(!access.allows(Role::User, &all), "{access:?}");
        }
    }

    #[test]
    fn validators_need_flags_for_review_and_delete() {
        let none = perms(false, false, false);
        assert!(Access::ModerateContent.allows(Role::ContentValidator, &none));
        assert!(!Access::ReviewContent.allows(Role::ContentValidator, &none));
        assert!(!Access::DeleteContent.allows(Role::ContentValidator, &none));

        let flagged = perms(true, true, true);
        assert!(Access::ReviewContent.allows(Role::ContentValidator, &flagged));
        assert!(Access::DeleteContent.allows(Role::ContentValidator, &flagged));
        assert!(!Access::ManageUsers.allows(Role::ContentValidator, &flagged));
    }

    #[test]
    fn admins_delete_without_flag_but_manage_needs_it() {
        let none = perms(false, false, false);
        assert!(Access::DeleteContent.allows(Role::Admin, &none));
        assert!(!Access::ReviewContent.allows(Role::Admin, &none));
        assert!(!Access::ManageUsers.allows(Role::Admin, &none));
        assert!(Access::ManageUsers.allows(Role::Admin, &perms(false, false, true)));
    }
}
