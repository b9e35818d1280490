//! User identity and roles.

use serde::{Deserialize, Serialize};

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "empleado")]
    Employee,
    #[serde(rename = "cliente")]
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "empleado",
            Role::Client => "cliente",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User profile carried in the `user` claim of a credential.
///
/// Serialized with the backend's field names, which is also the format of
/// the persisted `user` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "edad", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(
        rename = "documento_identidad",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Identity {
    /// Shallow merge: fields present in `update` overwrite, the rest are kept.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(email) = &update.email {
            self.email = email.clone();
        }
        if let Some(age) = update.age {
            self.age = Some(age);
        }
        if let Some(document_id) = &update.document_id {
            self.document_id = Some(document_id.clone());
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
    }
}

/// Partial profile sent to `PUT /auth/profile/{id}`. Absent fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "edad", default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(
        rename = "documento_identidad",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    #[serde(rename = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.document_id.is_none()
            && self.phone.is_none()
    }
}
