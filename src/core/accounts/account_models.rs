use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which table an account lives in. Also decides the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    User,
    Doctor,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::User => "user",
            AccountKind::Doctor => "doctor",
        }
    }
}

/// A patient account. The password is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub landmark: String,
    pub location: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    pub medications: String,
    pub allergies: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doctor {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub specialization: String,
    pub license_number: String,
    pub location: String,
    pub affiliation: String,
    pub created_at: DateTime<Utc>,
}

/// Registration form for a patient.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub landmark: String,
    #[serde(default)]
    pub location: String,
    pub password: String,
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub allergies: String,
}

impl NewUser {
    pub const FIELDS: [&'static str; 11] = [
        "full_name",
        "email",
        "phone",
        "landmark",
        "location",
        "password",
        "age",
        "gender",
        "condition",
        "medications",
        "allergies",
    ];
    pub const REQUIRED: [&'static str; 5] = ["full_name", "email", "phone", "password", "age"];
}

/// Registration form for a doctor.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub specialization: String,
    pub license_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub affiliation: String,
}

impl NewDoctor {
    pub const FIELDS: [&'static str; 8] = [
        "full_name",
        "email",
        "phone",
        "password",
        "specialization",
        "license_number",
        "location",
        "affiliation",
    ];
    pub const REQUIRED: [&'static str; 6] = [
        "full_name",
        "email",
        "phone",
        "password",
        "specialization",
        "license_number",
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub const FIELDS: [&'static str; 2] = ["email", "password"];
}

/// What a session remembers about the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionIdentity {
    pub account_id: i64,
    pub display_name: String,
    pub kind: AccountKind,
}

impl From<&User> for SessionIdentity {
    fn from(user: &User) -> Self {
        Self {
            account_id: user.id,
            display_name: user.full_name.clone(),
            kind: AccountKind::User,
        }
    }
}

impl From<&Doctor> for SessionIdentity {
    fn from(doctor: &Doctor) -> Self {
        Self {
            account_id: doctor.id,
            display_name: doctor.full_name.clone(),
            kind: AccountKind::Doctor,
        }
    }
}
