use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn to_auth_user(p: models::partner::Model) -> AuthUser {
    AuthUser {
        id: p.id,
        email: p.email,
        name: p.name,
        role: p.role,
        admin_view: p.admin_view,
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_partner_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let res = models::partner::Entity::find()
            .filter(models::partner::Column::Email.eq(email.to_string()))
            .filter(models::partner::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(to_auth_user))
    }

    async fn create_partner(
        &self,
        email: &str,
        name: &str,
        company_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let created = models::partner::create(
            &self.db,
            email,
            name,
            company_name,
            models::partner::ROLE_PARTNER,
        )
        .await
        .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(to_auth_user(created))
    }

    async fn get_credentials(&self, partner_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::partner_credentials::Entity::find_by_id(partner_id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials {
            partner_id: c.partner_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        }))
    }

    async fn upsert_password(
        &self,
        partner_id: Uuid,
        password_hash: String,
        password_algorithm: String,
    ) -> Result<Credentials, AuthError> {
        let c = models::partner_credentials::upsert_password(
            &self.db,
            partner_id,
            password_hash,
            &password_algorithm,
        )
        .await
        .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials {
            partner_id: c.partner_id,
            password_hash: c.password_hash,
            password_algorithm: c.password_algorithm,
        })
    }
}
