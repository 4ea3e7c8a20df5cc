use crate::domain::entity::{AuditContext, Entity, EntityId, Page, PageRequest};
use crate::domain::ports::SharedStore;
use crate::domain::user::{NewUser, User, UserPatch};
use crate::error::{BillingError, Result};
use rust_decimal::Decimal;
use tracing::debug;

/// User CRUD plus the balance ledger.
///
/// Uniqueness of `username` is a live-rows-only pre-check before insert;
/// there is no guard spanning the check and the write, so concurrent creates
/// of the same name can race (matching the system this reimplements).
pub struct UserService {
    store: SharedStore<User>,
}

impl UserService {
    pub fn new(store: SharedStore<User>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<User>> {
        self.store.list_live().await
    }

    pub async fn get_page(&self, page: PageRequest) -> Result<Page<User>> {
        self.store.list_live_page(page).await
    }

    pub async fn get_one(&self, id: EntityId) -> Result<User> {
        self.store
            .find_live(id)
            .await?
            .ok_or_else(|| BillingError::not_found(User::KIND, id))
    }

    pub async fn create(&self, new: NewUser, ctx: &AuditContext) -> Result<User> {
        let clashes = self
            .store
            .list_live_where(&|u: &User| u.username == new.username)
            .await?;
        if !clashes.is_empty() {
            return Err(BillingError::already_exists(
                User::KIND,
                "username",
                new.username,
            ));
        }
        self.store.insert(User::from(new), ctx).await
    }

    pub async fn update(&self, id: EntityId, patch: UserPatch, ctx: &AuditContext) -> Result<User> {
        let mut user = self.get_one(id).await?;
        if let Some(username) = &patch.username {
            let clashes = self
                .store
                .list_live_where(&|u: &User| u.username == *username && u.id() != Some(id))
                .await?;
            if !clashes.is_empty() {
                return Err(BillingError::already_exists(
                    User::KIND,
                    "username",
                    username.clone(),
                ));
            }
        }
        patch.apply(&mut user);
        self.store.update(user, ctx).await
    }

    pub async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<User> {
        self.store
            .trash(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(User::KIND, id))
    }

    pub async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<User> {
        self.store
            .restore(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(User::KIND, id))
    }

    /// Current balance of a live user.
    pub async fn balance(&self, id: EntityId) -> Result<Decimal> {
        Ok(self.get_one(id).await?.balance)
    }

    /// Deducts `amount` if the balance covers it.
    ///
    /// Returns `Ok(false)` without mutating anything when funds are short;
    /// that is a business outcome, not an error. The lookup is lenient: a
    /// trashed user found by raw id is still eligible. The read and the
    /// write-back are separate store calls, so two concurrent deductions can
    /// both observe the pre-deduction balance.
    pub async fn deduct(&self, id: EntityId, amount: Decimal, ctx: &AuditContext) -> Result<bool> {
        if amount < Decimal::ZERO {
            return Err(BillingError::InvalidArgument(
                "deduction amount must be non-negative".to_string(),
            ));
        }
        let mut user = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| BillingError::not_found(User::KIND, id))?;

        if user.balance < amount {
            debug!(user = id, %amount, balance = %user.balance, "deduction rejected, insufficient funds");
            return Ok(false);
        }
        user.balance -= amount;
        self.store.update(user, ctx).await?;
        debug!(user = id, %amount, "balance deducted");
        Ok(true)
    }
}
