use super::entity::{AuditContext, Entity, EntityId, Page, PageRequest, Scope};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Caller-supplied row filter for the listing paths. The explicit lifetime
/// lets callers pass borrowing closures.
pub type Predicate<'a, T> = dyn Fn(&T) -> bool + Sync + 'a;

/// Caller-supplied field selector for [`EntityStore::sum`].
pub type FieldSelector<'a, T> = dyn Fn(&T) -> Decimal + Sync + 'a;

/// Generic soft-delete store, one instance per entity kind.
///
/// Trashed rows stay in storage: `find`, `trash` and `restore` see every row,
/// everything else is restricted to live rows. Each method is atomic with
/// respect to the backing store; sequences of calls are not (the services'
/// check-then-act patterns are documented races).
///
/// The store never enforces uniqueness; that pre-check belongs to the caller.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Row by id regardless of deleted state.
    async fn find(&self, id: EntityId) -> Result<Option<T>>;

    /// Row by id, `None` when absent or trashed. The default read path for
    /// business operations.
    async fn find_live(&self, id: EntityId) -> Result<Option<T>>;

    /// All live rows in id order.
    async fn list_live(&self) -> Result<Vec<T>>;

    /// Live rows matching a caller-supplied predicate, in id order.
    async fn list_live_where(&self, predicate: &Predicate<'_, T>) -> Result<Vec<T>>;

    /// One zero-based page of live rows plus the total live count. A page
    /// past the end yields an empty item list with the correct total.
    async fn list_live_page(&self, page: PageRequest) -> Result<Page<T>>;

    /// Assigns identity and timestamps, stamps the audit context, persists
    /// with `deleted = false`, returns the stored form.
    async fn insert(&self, entity: T, ctx: &AuditContext) -> Result<T>;

    /// Persists field changes for an existing id, refreshing the modified
    /// timestamp and actor. `NotFound` when the id was never assigned.
    async fn update(&self, entity: T, ctx: &AuditContext) -> Result<T>;

    /// Flips `deleted` to true on the row with that id, regardless of its
    /// current state, refreshing the modified timestamp and actor. `None`
    /// when no such row exists at all.
    async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>>;

    /// Flips `deleted` back to false, refreshing the modified timestamp and
    /// actor. `None` when no such row exists.
    async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>>;

    /// Row count under an explicit deleted-row scope.
    async fn count(&self, scope: Scope) -> Result<u64>;

    /// Sum of a decimal field under an explicit deleted-row scope.
    async fn sum(&self, scope: Scope, field: &FieldSelector<'_, T>) -> Result<Decimal>;
}

/// Stores are shared between the per-entity services and the statistics
/// aggregator, so they travel behind an `Arc`.
pub type SharedStore<T> = Arc<dyn EntityStore<T>>;
