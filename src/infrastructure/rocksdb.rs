use crate::domain::course::Course;
use crate::domain::entity::{AuditContext, Entity, EntityId, Page, PageRequest, Scope};
use crate::domain::payment::Payment;
use crate::domain::ports::{EntityStore, FieldSelector, Predicate};
use crate::domain::user::User;
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use rust_decimal::Decimal;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column family holding the per-kind id sequences.
pub const CF_META: &str = "meta";

/// A persistent store backed by RocksDB, one column family per entity kind
/// plus a meta family for id sequences. Values are JSON; keys are big-endian
/// ids so iteration order is id order.
///
/// `Clone` shares the underlying `Arc<DB>`, so one opened database serves all
/// three entity kinds. Read-modify-write operations serialize on an internal
/// mutex, which is the single-row transaction the port requires.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a database at `path` with the column families for
    /// every entity kind.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [User::KIND, Course::KIND, Payment::KIND, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, families).map_err(BillingError::storage)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            BillingError::storage(std::io::Error::other(format!(
                "column family {name} not found"
            )))
        })
    }

    fn decode<T: Entity>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(BillingError::storage)
    }

    fn encode<T: Entity>(entity: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(entity).map_err(BillingError::storage)
    }

    fn get_raw<T: Entity>(&self, id: EntityId) -> Result<Option<T>> {
        let cf = self.cf(T::KIND)?;
        match self.db.get_cf(cf, id.to_be_bytes()).map_err(BillingError::storage)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_raw<T: Entity>(&self, id: EntityId, entity: &T) -> Result<()> {
        let cf = self.cf(T::KIND)?;
        self.db
            .put_cf(cf, id.to_be_bytes(), Self::encode(entity)?)
            .map_err(BillingError::storage)
    }

    /// Scans a whole column family in id order.
    fn scan<T: Entity>(&self) -> Result<Vec<T>> {
        let cf = self.cf(T::KIND)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(BillingError::storage)?;
            rows.push(Self::decode(&value)?);
        }
        Ok(rows)
    }

    /// Allocates the next id for a kind. Caller must hold `write_lock`.
    fn next_id(&self, kind: &'static str) -> Result<EntityId> {
        let cf = self.cf(CF_META)?;
        let key = kind.as_bytes();
        let current = match self.db.get_cf(cf, key).map_err(BillingError::storage)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    BillingError::storage(std::io::Error::other("corrupt id sequence"))
                })?;
                EntityId::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        self.db
            .put_cf(cf, key, next.to_be_bytes())
            .map_err(BillingError::storage)?;
        Ok(next)
    }

    fn flip_deleted<T: Entity>(
        &self,
        id: EntityId,
        deleted: bool,
        ctx: &AuditContext,
    ) -> Result<Option<T>> {
        let Some(mut row) = self.get_raw::<T>(id)? else {
            return Ok(None);
        };
        let audit = row.audit_mut();
        audit.deleted = deleted;
        audit.modified_at = Some(Utc::now());
        audit.modified_by = ctx.actor;
        self.put_raw(id, &row)?;
        Ok(Some(row))
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for RocksDbStore {
    async fn find(&self, id: EntityId) -> Result<Option<T>> {
        self.get_raw(id)
    }

    async fn find_live(&self, id: EntityId) -> Result<Option<T>> {
        Ok(self.get_raw::<T>(id)?.filter(|row| !row.is_deleted()))
    }

    async fn list_live(&self) -> Result<Vec<T>> {
        let mut rows = self.scan::<T>()?;
        rows.retain(|row| !row.is_deleted());
        Ok(rows)
    }

    async fn list_live_where(&self, predicate: &Predicate<'_, T>) -> Result<Vec<T>> {
        let mut rows = self.scan::<T>()?;
        rows.retain(|row| !row.is_deleted() && predicate(row));
        Ok(rows)
    }

    async fn list_live_page(&self, page: PageRequest) -> Result<Page<T>> {
        let mut rows = self.scan::<T>()?;
        rows.retain(|row| !row.is_deleted());
        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.size() as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn insert(&self, mut entity: T, ctx: &AuditContext) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let id = self.next_id(T::KIND)?;

        let now = Utc::now();
        let audit = entity.audit_mut();
        audit.id = Some(id);
        audit.created_at = Some(now);
        audit.modified_at = Some(now);
        audit.created_by = ctx.actor;
        audit.modified_by = ctx.actor;
        audit.deleted = false;

        self.put_raw(id, &entity)?;
        Ok(entity)
    }

    async fn update(&self, mut entity: T, ctx: &AuditContext) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let id = entity
            .id()
            .ok_or_else(|| BillingError::InvalidArgument("cannot update an unsaved row".to_string()))?;
        if self.get_raw::<T>(id)?.is_none() {
            return Err(BillingError::not_found(T::KIND, id));
        }

        let audit = entity.audit_mut();
        audit.modified_at = Some(Utc::now());
        audit.modified_by = ctx.actor;

        self.put_raw(id, &entity)?;
        Ok(entity)
    }

    async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>> {
        let _guard = self.write_lock.lock().await;
        self.flip_deleted(id, true, ctx)
    }

    async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<Option<T>> {
        let _guard = self.write_lock.lock().await;
        self.flip_deleted(id, false, ctx)
    }

    async fn count(&self, scope: Scope) -> Result<u64> {
        let rows = self.scan::<T>()?;
        Ok(rows.iter().filter(|row| scope.admits(*row)).count() as u64)
    }

    async fn sum(&self, scope: Scope, field: &FieldSelector<'_, T>) -> Result<Decimal> {
        let rows = self.scan::<T>()?;
        Ok(rows
            .iter()
            .filter(|row| scope.admits(*row))
            .map(|row| field(row))
            .sum())
    }
}
