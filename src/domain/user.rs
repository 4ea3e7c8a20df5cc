use super::entity::{Audit, Entity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// An account holder. `username` is unique among live rows only; a trashed
/// user's name may be taken by a new row.
///
/// `balance` is the single mutable ledger field. The non-negativity guard
/// lives in the deduction path, not here: a direct update may set any value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub audit: Audit,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub balance: Decimal,
}

impl Entity for User {
    const KIND: &'static str = "users";

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}

/// Fields for creating a user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub balance: Decimal,
}

impl From<NewUser> for User {
    fn from(new: NewUser) -> Self {
        Self {
            audit: Audit::new(),
            username: new.username,
            password: new.password,
            role: new.role,
            balance: new.balance,
        }
    }
}

/// Partial update: only the supplied fields are replaced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub balance: Option<Decimal>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(balance) = self.balance {
            user.balance = balance;
        }
    }
}
