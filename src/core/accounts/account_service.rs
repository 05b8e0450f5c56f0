use super::account_models::{Doctor, NewDoctor, NewUser, SessionIdentity, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Email already registered, Please Login .")]
    DuplicateEmail,
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,
    #[error("Invalid registration: {0}")]
    Validation(String),
    #[error("Account {0} not found")]
    NotFound(i64),
    #[error("Account storage error: {0}")]
    Storage(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Persistence for patient and doctor accounts.
///
/// Implementations must reject a second account with the same email in the
/// same table with [`AccountError::DuplicateEmail`].
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert_user(&self, user: &NewUser, created_at: DateTime<Utc>)
        -> Result<User, AccountError>;

    async fn insert_doctor(
        &self,
        doctor: &NewDoctor,
        created_at: DateTime<Utc>,
    ) -> Result<Doctor, AccountError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, AccountError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, AccountError>;

    async fn get_doctor(&self, id: i64) -> Result<Option<Doctor>, AccountError>;
}

#[async_trait]
impl AccountStore for Box<dyn AccountStore> {
    async fn insert_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, AccountError> {
        (**self).insert_user(user, created_at).await
    }

    async fn insert_doctor(
        &self,
        doctor: &NewDoctor,
        created_at: DateTime<Utc>,
    ) -> Result<Doctor, AccountError> {
        (**self).insert_doctor(doctor, created_at).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        (**self).find_user_by_email(email).await
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, AccountError> {
        (**self).find_doctor_by_email(email).await
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AccountError> {
        (**self).get_user(id).await
    }

    async fn get_doctor(&self, id: i64) -> Result<Option<Doctor>, AccountError> {
        (**self).get_doctor(id).await
    }
}

/// Server-side sessions keyed by an opaque token.
pub trait SessionStore: Send + Sync {
    /// Stores the identity and returns the new token.
    fn create(&self, identity: SessionIdentity) -> String;
    fn get(&self, token: &str) -> Option<SessionIdentity>;
    fn remove(&self, token: &str);
}

// ============================================================================
// SERVICE
// ============================================================================

fn require(field: &str, value: &str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        Err(AccountError::Validation(format!("'{}' is required", field)))
    } else {
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), AccountError> {
    require("email", email)?;
    if email.contains('@') {
        Ok(())
    } else {
        Err(AccountError::Validation(
            "'email' must be an email address".to_string(),
        ))
    }
}

pub struct AccountService<S: AccountStore> {
    store: S,
}

impl<S: AccountStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn register_user(&self, mut form: NewUser) -> Result<User, AccountError> {
        form.email = form.email.trim().to_string();
        require("full_name", &form.full_name)?;
        validate_email(&form.email)?;
        require("phone", &form.phone)?;
        require("password", &form.password)?;

        if self.store.find_user_by_email(&form.email).await?.is_some() {
            return Err(AccountError::DuplicateEmail);
        }

        let user = self.store.insert_user(&form, Utc::now()).await?;
        tracing::info!(account_id = user.id, "User registered");
        Ok(user)
    }

    pub async fn register_doctor(&self, mut form: NewDoctor) -> Result<Doctor, AccountError> {
        form.email = form.email.trim().to_string();
        require("full_name", &form.full_name)?;
        validate_email(&form.email)?;
        require("phone", &form.phone)?;
        require("password", &form.password)?;
        require("specialization", &form.specialization)?;
        require("license_number", &form.license_number)?;

        if self.store.find_doctor_by_email(&form.email).await?.is_some() {
            return Err(AccountError::DuplicateEmail);
        }

        let doctor = self.store.insert_doctor(&form, Utc::now()).await?;
        tracing::info!(account_id = doctor.id, "Doctor registered");
        Ok(doctor)
    }

    /// Checks credentials against doctors first, then users.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionIdentity, AccountError> {
        let email = email.trim();

        if let Some(doctor) = self.store.find_doctor_by_email(email).await? {
            if doctor.password == password {
                tracing::info!(account_id = doctor.id, "Doctor logged in");
                return Ok(SessionIdentity::from(&doctor));
            }
        }

        if let Some(user) = self.store.find_user_by_email(email).await? {
            if user.password == password {
                tracing::info!(account_id = user.id, "User logged in");
                return Ok(SessionIdentity::from(&user));
            }
        }

        tracing::warn!("Failed login attempt");
        Err(AccountError::InvalidCredentials)
    }

    pub async fn user(&self, id: i64) -> Result<User, AccountError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    pub async fn doctor(&self, id: i64) -> Result<Doctor, AccountError> {
        self.store
            .get_doctor(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }
}
