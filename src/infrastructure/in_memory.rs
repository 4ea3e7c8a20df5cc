use crate::domain::entity::{AuditContext, Entity, EntityId, Page, PageRequest, Scope};
use crate::domain::ports::{EntityStore, FieldSelector, Predicate};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Shelf<T> {
    rows: HashMap<EntityId, T>,
    next_id: EntityId,
}

impl<T> Default for Shelf<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: 1,
        }
    }
}

/// A thread-safe in-memory store for one entity kind.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access; each trait
/// method holds the lock for its whole read-then-write, giving the single-row
/// atomicity the port promises. Ideal for tests and ephemeral runs.
pub struct InMemoryStore<T> {
    shelf: Arc<RwLock<Shelf<T>>>,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self {
            shelf: Arc::new(RwLock::new(Shelf::default())),
        }
    }
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            shelf: Arc::clone(&self.shelf),
        }
    }
}

impl<T> InMemoryStore<T> {
    /// Creates a new, empty store. Ids start at 1 and are never reused.
    pub fn new() -> Self {
        Self::default()
    }
}

fn live_sorted<T: Entity>(shelf: &Shelf<T>) -> Vec<T> {
    let mut rows: Vec<T> = shelf
        .rows
        .values()
        .filter(|row| !row.is_deleted())
        .cloned()
        .collect();
    rows.sort_by_key(Entity::id);
    rows
}

#[async_trait]
impl<T: Entity> EntityStore<T> for InMemoryStore<T> {
    async fn find(&self, id: EntityId) -> Result<Option<T>> {
        let shelf = self.shelf.read().await;
        Ok(shelf.rows.get(&id).cloned())
    }

    async fn find_live(&self, id: EntityId) -> Result<Option<T>> {
        let shelf = self.shelf.read().await;
        Ok(shelf
            .rows
            .get(&id)
            .filter(|row| !row.is_deleted())
            .cloned())
    }

    async fn list_live(&self) -> Result<Vec<T>> {
        let shelf = self.shelf.read().await;
        Ok(live_sorted(&shelf))
    }

    async fn list_live_where(&self, predicate: &Predicate<'_, T>) -> Result<Vec<T>> {
        let shelf = self.shelf.read().await;
        let mut rows = live_sorted(&shelf);
        rows.retain(|row| predicate(row));
        Ok(rows)
    }

    async fn list_live_page(&self, page: PageRequest) -> Result<Page<T>> {
        let shelf = self.shelf.read().await;
        let rows = live_sorted(&shelf);
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn insert(&self, mut entity: T, ctx: &AuditContext) -> Result<T> {
        let mut shelf = self.shelf.write().await;
        let id = shelf.next_id;
        shelf.next_id += 1;

        let now = Utc::now();
        let audit = entity.audit_mut();
        audit.id = Some(id);
        audit.created_at = Some(now);
        audit.modified_at = Some(now);
        audit.created_by = ctx.actor;
        audit.modified_by = ctx.actor;
        audit.deleted = false;

        shelf.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn update(&self, mut entity: T, ctx: &AuditContext) -> Result<T> {
        let mut shelf = self.shelf.write().await;
        let id = entity
            .id()
            .ok_or_else(|| BillingError::InvalidArgument("cannot update an unsaved row".to_string()))?;
        if !shelf.rows.contains_key(&id) {
            return Err(BillingError::not_found(T::KIND, id));
        }

        let audit = entity.audit_mut();
        audit.modified_at = Some(Utc::now());
        audit.modified_by = ctx.actor;

        shelf.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>> {
        let mut shelf = self.shelf.write().await;
        let Some(row) = shelf.rows.get_mut(&id) else {
            return Ok(None);
        };
        let audit = row.audit_mut();
        audit.deleted = true;
        audit.modified_at = Some(Utc::now());
        audit.modified_by = ctx.actor;
        Ok(Some(row.clone()))
    }

    async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>> {
        let mut shelf = self.shelf.write().await;
        let Some(row) = shelf.rows.get_mut(&id) else {
            return Ok(None);
        };
        let audit = row.audit_mut();
        audit.deleted = false;
        audit.modified_at = Some(Utc::now());
        audit.modified_by = ctx.actor;
        Ok(Some(row.clone()))
    }

    async fn count(&self, scope: Scope) -> Result<u64> {
        let shelf = self.shelf.read().await;
        Ok(shelf
            .rows
            .values()
            .filter(|row| scope.admits(*row))
            .count() as u64)
    }

    async fn sum(&self, scope: Scope, field: &FieldSelector<'_, T>) -> Result<Decimal> {
        let shelf = self.shelf.read().await;
        Ok(shelf
            .rows
            .values()
            .filter(|row| scope.admits(*row))
            .map(|row| field(row))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{NewUser, User, UserRole};
    use rust_decimal_macros::dec;

    fn user(name: &str, balance: Decimal) -> User {
        User::from(NewUser {
            username: name.to_string(),
            password: "pw".to_string(),
            role: UserRole::User,
            balance,
        })
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_audit_fields() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::actor(9);

        let a = store.insert(user("a", dec!(1)), &ctx).await.unwrap();
        let b = store.insert(user("b", dec!(2)), &ctx).await.unwrap();

        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(2));
        assert_eq!(a.audit.created_by, Some(9));
        assert!(a.audit.created_at.is_some());
        assert!(!a.is_deleted());
    }

    #[tokio::test]
    async fn trash_hides_from_live_paths_but_not_raw_find() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        let a = store.insert(user("a", dec!(1)), &ctx).await.unwrap();
        let id = a.id().unwrap();

        let trashed = store.trash(id, &ctx).await.unwrap().unwrap();
        assert!(trashed.is_deleted());

        assert!(store.find_live(id).await.unwrap().is_none());
        assert!(store.list_live().await.unwrap().is_empty());
        let raw = store.find(id).await.unwrap().unwrap();
        assert!(raw.is_deleted());
    }

    #[tokio::test]
    async fn restore_brings_a_row_back() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        let a = store.insert(user("a", dec!(1)), &ctx).await.unwrap();
        let id = a.id().unwrap();

        store.trash(id, &ctx).await.unwrap();
        let restored = store.restore(id, &ctx).await.unwrap().unwrap();
        assert!(!restored.is_deleted());
        assert!(store.find_live(id).await.unwrap().is_some());

        assert!(store.restore(999, &ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn trashed_ids_are_never_reused() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        let a = store.insert(user("a", dec!(1)), &ctx).await.unwrap();
        store.trash(a.id().unwrap(), &ctx).await.unwrap();

        let b = store.insert(user("b", dec!(1)), &ctx).await.unwrap();
        assert_eq!(b.id(), Some(2));
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        let mut ghost = user("ghost", dec!(0));
        ghost.audit.id = Some(42);

        let err = store.update(ghost, &ctx).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound { id: 42, .. }));
    }

    #[tokio::test]
    async fn pagination_covers_live_rows_without_gaps() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        for i in 0..7 {
            store
                .insert(user(&format!("u{i}"), dec!(1)), &ctx)
                .await
                .unwrap();
        }
        store.trash(3, &ctx).await.unwrap();

        let page = store
            .list_live_page(PageRequest::new(0, 4).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.items.len(), 4);

        let last = store
            .list_live_page(PageRequest::new(1, 4).unwrap())
            .await
            .unwrap();
        assert_eq!(last.items.len(), 2);

        let beyond = store
            .list_live_page(PageRequest::new(5, 4).unwrap())
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 6);

        let far_beyond = store
            .list_live_page(PageRequest::new(u64::MAX, 2).unwrap())
            .await
            .unwrap();
        assert!(far_beyond.items.is_empty());
        assert_eq!(far_beyond.total, 6);
    }

    #[tokio::test]
    async fn trash_and_restore_stamp_the_acting_context() {
        let store = InMemoryStore::<User>::new();
        let creator = AuditContext::actor(1);
        let a = store.insert(user("a", dec!(1)), &creator).await.unwrap();
        let id = a.id().unwrap();

        let admin = AuditContext::actor(7);
        let trashed = store.trash(id, &admin).await.unwrap().unwrap();
        assert_eq!(trashed.audit.modified_by, Some(7));
        assert_eq!(trashed.audit.created_by, Some(1));

        let restored = store.restore(id, &AuditContext::actor(8)).await.unwrap().unwrap();
        assert_eq!(restored.audit.modified_by, Some(8));
    }

    #[tokio::test]
    async fn aggregates_honor_the_scope() {
        let store = InMemoryStore::<User>::new();
        let ctx = AuditContext::system();
        store.insert(user("a", dec!(10)), &ctx).await.unwrap();
        store.insert(user("b", dec!(20)), &ctx).await.unwrap();
        store.trash(2, &ctx).await.unwrap();

        assert_eq!(store.count(Scope::All).await.unwrap(), 2);
        assert_eq!(store.count(Scope::Live).await.unwrap(), 1);
        assert_eq!(
            store.sum(Scope::All, &|u: &User| u.balance).await.unwrap(),
            dec!(30)
        );
        assert_eq!(
            store.sum(Scope::Live, &|u: &User| u.balance).await.unwrap(),
            dec!(10)
        );
    }
}
