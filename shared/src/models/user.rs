//! User profile models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::not_blank;

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Editable part of a profile; the role is not self-assignable
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(required, custom = "not_blank")]
    pub name: Option<String>,
    pub contact: Option<String>,
    pub address: Option<String>,
}
