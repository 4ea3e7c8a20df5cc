use crate::domain::course::{Course, CoursePatch, NewCourse};
use crate::domain::entity::{AuditContext, Entity, EntityId, Page, PageRequest};
use crate::domain::ports::SharedStore;
use crate::error::{BillingError, Result};

/// Course CRUD. `name` uniqueness follows the same live-rows-only
/// check-then-insert pattern as usernames.
pub struct CourseService {
    store: SharedStore<Course>,
}

impl CourseService {
    pub fn new(store: SharedStore<Course>) -> Self {
        Self { store }
    }

    pub async fn get_all(&self) -> Result<Vec<Course>> {
        self.store.list_live().await
    }

    pub async fn get_page(&self, page: PageRequest) -> Result<Page<Course>> {
        self.store.list_live_page(page).await
    }

    pub async fn get_one(&self, id: EntityId) -> Result<Course> {
        self.store
            .find_live(id)
            .await?
            .ok_or_else(|| BillingError::not_found(Course::KIND, id))
    }

    pub async fn create(&self, new: NewCourse, ctx: &AuditContext) -> Result<Course> {
        let clashes = self
            .store
            .list_live_where(&|c: &Course| c.name == new.name)
            .await?;
        if !clashes.is_empty() {
            return Err(BillingError::already_exists(Course::KIND, "name", new.name));
        }
        self.store.insert(Course::from(new), ctx).await
    }

    pub async fn update(&self, id: EntityId, patch: CoursePatch, ctx: &AuditContext) -> Result<Course> {
        let mut course = self.get_one(id).await?;
        if let Some(name) = &patch.name {
            let clashes = self
                .store
                .list_live_where(&|c: &Course| c.name == *name && c.id() != Some(id))
                .await?;
            if !clashes.is_empty() {
                return Err(BillingError::already_exists(Course::KIND, "name", name.clone()));
            }
        }
        patch.apply(&mut course);
        self.store.update(course, ctx).await
    }

    pub async fn trash(&self, id: EntityId, ctx: &AuditContext) -> Result<Course> {
        self.store
            .trash(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(Course::KIND, id))
    }

    pub async fn restore(&self, id: EntityId, ctx: &AuditContext) -> Result<Course> {
        self.store
            .restore(id, ctx)
            .await?
            .ok_or_else(|| BillingError::not_found(Course::KIND, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn service() -> CourseService {
        CourseService::new(Arc::new(InMemoryStore::<Course>::new()))
    }

    fn kotlin(price: rust_decimal::Decimal) -> NewCourse {
        NewCourse {
            name: "Kotlin".to_string(),
            description: "language course".to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_until_the_holder_is_trashed() {
        let svc = service();
        let ctx = AuditContext::system();

        let first = svc.create(kotlin(dec!(150)), &ctx).await.unwrap();
        let err = svc.create(kotlin(dec!(200)), &ctx).await.unwrap_err();
        assert!(matches!(err, BillingError::AlreadyExists { .. }));

        svc.trash(first.id().unwrap(), &ctx).await.unwrap();
        let second = svc.create(kotlin(dec!(200)), &ctx).await.unwrap();
        assert_eq!(second.price, dec!(200));
    }

    #[tokio::test]
    async fn restore_makes_a_course_listable_again() {
        let svc = service();
        let ctx = AuditContext::system();
        let course = svc.create(kotlin(dec!(150)), &ctx).await.unwrap();
        let id = course.id().unwrap();

        svc.trash(id, &ctx).await.unwrap();
        assert!(svc.get_all().await.unwrap().is_empty());

        svc.restore(id, &ctx).await.unwrap();
        assert_eq!(svc.get_all().await.unwrap().len(), 1);
        assert_eq!(svc.get_one(id).await.unwrap().name, "Kotlin");
    }

    #[tokio::test]
    async fn update_replaces_only_patched_fields() {
        let svc = service();
        let ctx = AuditContext::system();
        let course = svc.create(kotlin(dec!(150)), &ctx).await.unwrap();

        let patch = CoursePatch {
            price: Some(dec!(175)),
            ..Default::default()
        };
        let updated = svc.update(course.id().unwrap(), patch, &ctx).await.unwrap();
        assert_eq!(updated.price, dec!(175));
        assert_eq!(updated.name, "Kotlin");
    }
}
