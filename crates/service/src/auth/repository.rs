use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_partner_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_partner(
        &self,
        email: &str,
        name: &str,
        company_name: Option<&str>,
    ) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, partner_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(
        &self,
        partner_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: partner_id
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_partner_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn create_partner(
            &self,
            email: &str,
            name: &str,
            company_name: Option<&str>,
        ) -> Result<AuthUser, AuthError> {
            let _ = company_name;
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: name.to_string(),
                role: models::partner::ROLE_PARTNER.to_string(),
                admin_view: false,
            };
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, partner_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&partner_id).cloned())
        }

        async fn upsert_password(
            &self,
            partner_id: Uuid,
            password_hash: String,
            password_algorithm: String,
        ) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { partner_id, password_hash, password_algorithm };
            creds.insert(partner_id, c.clone());
            Ok(c)
        }
    }
}
