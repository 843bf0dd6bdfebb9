//! User lifecycle service

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{DomainError, User};
use crate::store::{AccountStore, UserStore};

use super::accounts::AccountService;
use super::validation::validate_user_fields;

/// New or updated user field set.
#[derive(Debug, Clone)]
pub struct UserFields {
    pub last_name: String,
    pub first_name: String,
    pub patronymic_name: Option<String>,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone_number: String,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    accounts: Arc<dyn AccountStore>,
    account_service: AccountService,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        accounts: Arc<dyn AccountStore>,
        account_service: AccountService,
    ) -> Self {
        Self {
            users,
            accounts,
            account_service,
        }
    }

    fn validate(fields: &UserFields) -> Result<(), DomainError> {
        validate_user_fields(
            &fields.last_name,
            &fields.first_name,
            fields.patronymic_name.as_deref(),
            fields.birth_date,
            &fields.email,
            &fields.phone_number,
        )
    }

    pub async fn create_user(&self, fields: UserFields) -> Result<User, DomainError> {
        Self::validate(&fields)?;

        let user = User::new(
            fields.last_name,
            fields.first_name,
            fields.patronymic_name,
            fields.birth_date,
            fields.email,
            fields.phone_number,
        );
        let user = self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or(DomainError::UserNotFound(id))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.users.list().await?)
    }

    /// Replace a user's mutable fields. The identifier never changes.
    pub async fn update_user(&self, id: Uuid, fields: UserFields) -> Result<User, DomainError> {
        Self::validate(&fields)?;
        let mut user = self.get_user(id).await?;

        user.last_name = fields.last_name;
        user.first_name = fields.first_name;
        user.patronymic_name = fields.patronymic_name;
        user.birth_date = fields.birth_date;
        user.email = fields.email;
        user.phone_number = fields.phone_number;

        Ok(self.users.save(&user).await?)
    }

    /// Delete a user and every account they own. Each account deletion
    /// settles any remaining balance with a DEBIT transaction first.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), DomainError> {
        let user = self.get_user(id).await?;

        for account in self.accounts.find_by_owner(user.id).await? {
            self.account_service.delete_account(account.id).await?;
        }

        self.users.delete(user.id).await?;
        tracing::info!(user_id = %user.id, "user deleted");
        Ok(())
    }
}
