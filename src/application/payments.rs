use crate::domain::entity::{Audit, AuditContext, Entity, EntityId, Page, PageRequest};
use crate::domain::payment::{NewPayment, Payment, PaymentPatch, PaymentStatus};
use crate::domain::ports::SharedStore;
use crate::error::{BillingError, Result};
use chrono::Utc;
use tracing::debug;

/// Payment record lifecycle. Deliberately does NOT touch the balance ledger;
/// if a payment should deduct funds, that orchestration belongs to the
/// caller.
///
/// Reads here are lenient: `get_one`, `update` and `set_status` find a row by
/// raw id even when it is trashed. Only the listing paths filter.
pub struct PaymentService {
    store: SharedStore<Payment>,
}

impl PaymentService {
    pub fn new(store: SharedStore<Payment>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<Payment>> {
        self.store.list_live().await
    }

    pub async fn get_page(&self, page: PageRequest) -> Result<Page<Payment>> {
        self.store.list_live_page(page).await
    }

    pub async fn get_one(&self, id: EntityId) -> Result<Payment> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| BillingError::not_found(Payment::KIND, id))
    }

    /// Creates a payment. No duplicate check of any kind; two identical
    /// payments are two rows.
    pub async fn create(&self, new: NewPayment, ctx: &AuditContext) -> Result<Payment> {
        let payment = Payment {
            audit: Audit::new(),
            user_id: new.user_id,
            course_id: new.course_id,
            amount: new.amount,
            payment_date: new.payment_date.unwrap_or_else(Utc::now),
            payment_method: new.payment_method,
            status: new.status,
        };
        self.store.insert(payment, ctx).await
    }

    pub async fn update(&self, id: EntityId, patch: PaymentPatch, ctx: &AuditContext) -> Result<Payment> {
        let mut payment = self.get_one(id).await?;
        patch.apply(&mut payment);
        self.store.update(payment, ctx).await
    }

    pub async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<Payment> {
        self.store
            .trash(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(Payment::KIND, id))
    }

    pub async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<Payment> {
        self.store
            .restore(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(Payment::KIND, id))
    }

    /// Directly sets the status field, bypassing the patch path. Any status
    /// may move to any other. Returns the affected row count: 0 when the id
    /// does not exist (not an error), 1 otherwise, trashed rows included.
    pub async fn set_status(
        &self,
        id: EntityId,
        status: PaymentStatus,
        ctx: &AuditContext,
    ) -> Result<u64> {
        let Some(mut payment) = self.store.find(id).await? else {
            return Ok(0);
        };
        payment.status = status;
        self.store.update(payment, ctx).await?;
        debug!(payment = id, ?status, "payment status set");
        Ok(1)
    }

    /// Live payments belonging to a user.
    pub async fn by_user(&self, user_id: EntityId) -> Result<Vec<Payment>> {
        self.store
            .list_live_where(&|p: &Payment| p.user_id == user_id)
            .await
    }

    /// Live successful payments belonging to a user.
    pub async fn successful_by_user(&self, user_id: EntityId) -> Result<Vec<Payment>> {
        self.store
            .list_live_where(&|p: &Payment| {
                p.user_id == user_id && p.status == PaymentStatus::Success
            })
            .await
    }

    /// Number of live payments recorded against a course.
    pub async fn count_by_course(&self, course_id: EntityId) -> Result<u64> {
        let rows = self
            .store
            .list_live_where(&|p: &Payment| p.course_id == course_id)
            .await?;
        Ok(rows.len() as u64)
    }
}
