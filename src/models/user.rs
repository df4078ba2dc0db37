use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    /// Older records store blocked accounts as "fired"
    #[serde(alias = "fired", alias = "blocked")]
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

/// The only user fields the authorization layer reads
#[derive(Debug, Clone, Deserialize)]
pub struct UserRole {
    pub email: String,
    /// Kept untyped: anything other than the string "admin" (missing, unknown,
    /// or not a string at all) is not admin
    #[serde(default)]
    pub role: Option<Bson>,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(&self.role, Some(Bson::String(role)) if role == Role::Admin.as_str())
    }
}

/// Body of `PATCH /user/{id}`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    pub status: UserStatus,
}

/// Body of `PATCH /user/role/{id}`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// Body of `PUT /user/update/{id}`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AdminCheckResponse {
    pub admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_fired_status_reads_as_inactive() {
        let req: UpdateStatusRequest = serde_json::from_value(json!({ "status": "fired" })).unwrap();
        assert_eq!(req.status, UserStatus::Inactive);
        assert_eq!(req.status.as_str(), "inactive");
    }

    #[test]
    fn unknown_roles_are_rejected_in_requests() {
        let parsed = serde_json::from_value::<UpdateRoleRequest>(json!({ "role": "superuser" }));
        assert!(parsed.is_err());

        let parsed: UpdateRoleRequest = serde_json::from_value(json!({ "role": "admin" })).unwrap();
        assert_eq!(parsed.role, Role::Admin);
    }

    #[test]
    fn only_admin_role_is_admin() {
        let record = |role: Option<&str>| UserRole {
            email: "a@b.c".into(),
            role: role.map(Bson::from),
        };
        assert!(record(Some("admin")).is_admin());
        assert!(!record(Some("user")).is_admin());
        assert!(!record(Some("Admin")).is_admin());
        assert!(!record(None).is_admin());
    }

    #[test]
    fn non_string_roles_load_and_are_not_admin() {
        use mongodb::bson::{doc, from_document};

        for role in [Bson::Int32(1), Bson::Document(doc! { "name": "admin" }), Bson::Null] {
            let record: UserRole =
                from_document(doc! { "email": "odd@example.com", "role": role.clone() }).unwrap();
            assert!(!record.is_admin(), "role {:?}", role);
        }

        let record: UserRole = from_document(doc! { "email": "root@example.com", "role": "admin" }).unwrap();
        assert!(record.is_admin());
    }
}
