use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Row identity. Assigned by the store on first insert, stable thereafter,
/// never reused.
pub type EntityId = u64;

/// Base fields shared by every persisted entity.
///
/// `deleted` is the soft-delete flag: trashed rows stay in storage forever
/// and remain reachable by raw id lookup, they just vanish from every normal
/// read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub id: Option<EntityId>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub created_by: Option<EntityId>,
    pub modified_by: Option<EntityId>,
    #[serde(default)]
    pub deleted: bool,
}

impl Audit {
    pub fn new() -> Self {
        Self {
            id: None,
            created_at: None,
            modified_at: None,
            created_by: None,
            modified_by: None,
            deleted: false,
        }
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self::new()
    }
}

/// Capability contract a type must satisfy to live in an [`EntityStore`].
///
/// [`EntityStore`]: crate::domain::ports::EntityStore
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Storage namespace for the entity kind. Doubles as the column family
    /// name in the RocksDB backend and the `kind` tag in error conditions.
    const KIND: &'static str;

    fn audit(&self) -> &Audit;
    fn audit_mut(&mut self) -> &mut Audit;

    fn id(&self) -> Option<EntityId> {
        self.audit().id
    }

    fn is_deleted(&self) -> bool {
        self.audit().deleted
    }
}

/// Who is performing a mutation. Stamped into `created_by`/`modified_by`;
/// the core stores the value and never derives it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    pub actor: Option<EntityId>,
}

impl AuditContext {
    /// An anonymous caller (no actor recorded).
    pub fn system() -> Self {
        Self { actor: None }
    }

    pub fn actor(id: EntityId) -> Self {
        Self { actor: Some(id) }
    }
}

/// Whether an aggregate includes soft-deleted rows.
///
/// The scope is always an explicit caller choice; no aggregate defaults to
/// one or the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    All,
    Live,
}

impl Scope {
    pub fn admits<T: Entity>(self, entity: &T) -> bool {
        match self {
            Scope::All => true,
            Scope::Live => !entity.is_deleted(),
        }
    }
}

/// Zero-based page request. Construction rejects a zero page size, so a
/// value of this type is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    number: u64,
    size: u64,
}

#[derive(Deserialize)]
struct RawPageRequest {
    number: u64,
    size: u64,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = BillingError;

    fn try_from(raw: RawPageRequest) -> Result<Self> {
        Self::new(raw.number, raw.size)
    }
}

impl PageRequest {
    pub fn new(number: u64, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(BillingError::InvalidArgument(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { number, size })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Saturates instead of overflowing, so an absurd page number behaves
    /// like any other page past the end.
    pub fn offset(&self) -> u64 {
        self.number.saturating_mul(self.size)
    }
}

/// One page of live rows plus the total live count, so clients can do their
/// own pagination math.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_rejects_zero_size() {
        assert!(matches!(
            PageRequest::new(0, 0),
            Err(BillingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn page_request_offset() {
        let page = PageRequest::new(3, 10).unwrap();
        assert_eq!(page.offset(), 30);
        assert_eq!(page.number(), 3);
        assert_eq!(page.size(), 10);
    }

    #[test]
    fn page_request_offset_saturates_on_huge_page_numbers() {
        let page = PageRequest::new(u64::MAX, 2).unwrap();
        assert_eq!(page.offset(), u64::MAX);
    }

    #[test]
    fn page_request_deserialization_validates() {
        let ok: std::result::Result<PageRequest, _> =
            serde_json::from_str(r#"{"number":0,"size":5}"#);
        assert!(ok.is_ok());

        let bad: std::result::Result<PageRequest, _> =
            serde_json::from_str(r#"{"number":0,"size":0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn audit_defaults_to_live() {
        let audit = Audit::new();
        assert!(!audit.deleted);
        assert!(audit.id.is_none());
    }
}
