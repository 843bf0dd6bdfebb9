//! User entity

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. Owns zero or more accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub patronymic_name: Option<String>,
    pub birth_date: NaiveDate,
    pub email: String,
    pub phone_number: String,
}

impl User {
    pub fn new(
        last_name: String,
        first_name: String,
        patronymic_name: Option<String>,
        birth_date: NaiveDate,
        email: String,
        phone_number: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            last_name,
            first_name,
            patronymic_name,
            birth_date,
            email,
            phone_number,
        }
    }
}
