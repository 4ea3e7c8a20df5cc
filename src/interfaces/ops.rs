use crate::application::courses::CourseService;
use crate::application::payments::PaymentService;
use crate::application::stats::StatsService;
use crate::application::users::UserService;
use crate::domain::course::{CoursePatch, NewCourse};
use crate::domain::entity::{AuditContext, EntityId, PageRequest, Scope};
use crate::domain::payment::{NewPayment, PaymentPatch, PaymentStatus};
use crate::domain::ports::SharedStore;
use crate::domain::user::{NewUser, UserPatch};
use crate::domain::{course::Course, payment::Payment, user::User};
use crate::error::{BillingError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::BufRead;

/// One operation from a JSON-lines ops file. Each line is a tagged object,
/// e.g. `{"op":"create_user","username":"alice","password":"pw","balance":"100"}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    CreateUser(NewUser),
    UpdateUser {
        id: EntityId,
        #[serde(flatten)]
        patch: UserPatch,
    },
    TrashUser { id: EntityId },
    RestoreUser { id: EntityId },
    GetUser { id: EntityId },
    ListUsers { page: Option<PageRequest> },
    GetBalance { id: EntityId },
    Deduct { id: EntityId, amount: Decimal },

    CreateCourse(NewCourse),
    UpdateCourse {
        id: EntityId,
        #[serde(flatten)]
        patch: CoursePatch,
    },
    TrashCourse { id: EntityId },
    RestoreCourse { id: EntityId },
    GetCourse { id: EntityId },
    ListCourses { page: Option<PageRequest> },

    CreatePayment(NewPayment),
    UpdatePayment {
        id: EntityId,
        #[serde(flatten)]
        patch: PaymentPatch,
    },
    TrashPayment { id: EntityId },
    RestorePayment { id: EntityId },
    GetPayment { id: EntityId },
    ListPayments { page: Option<PageRequest> },
    SetPaymentStatus { id: EntityId, status: PaymentStatus },
    PaymentsByUser { user_id: EntityId },
    SuccessfulPaymentsByUser { user_id: EntityId },
    CountPaymentsByCourse { course_id: EntityId },

    UserStats { scope: Scope },
    CourseStats { scope: Scope },
    PaymentStats { scope: Scope },
}

/// Reads ops lazily from any line-oriented source. Blank lines are skipped.
pub struct OpReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> OpReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn ops(self) -> impl Iterator<Item = Result<Op>> {
        self.source
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                let line = line.map_err(BillingError::storage)?;
                serde_json::from_str(&line)
                    .map_err(|e| BillingError::InvalidArgument(format!("bad op line: {e}")))
            })
    }
}

/// The service bundle the CLI drives. All four services share the same three
/// stores.
pub struct Backend {
    pub users: UserService,
    pub courses: CourseService,
    pub payments: PaymentService,
    pub stats: StatsService,
}

impl Backend {
    pub fn new(
        users: SharedStore<User>,
        courses: SharedStore<Course>,
        payments: SharedStore<Payment>,
    ) -> Self {
        Self {
            users: UserService::new(users.clone()),
            courses: CourseService::new(courses.clone()),
            payments: PaymentService::new(payments.clone()),
            stats: StatsService::new(users, courses, payments),
        }
    }

    /// Applies one op and renders its successful result as JSON.
    pub async fn apply(&self, op: Op, ctx: &AuditContext) -> Result<Value> {
        let value = match op {
            Op::CreateUser(new) => json!(self.users.create(new, ctx).await?),
            Op::UpdateUser { id, patch } => json!(self.users.update(id, patch, ctx).await?),
            Op::TrashUser { id } => json!(self.users.trash(id, ctx).await?),
            Op::RestoreUser { id } => json!(self.users.restore(id, ctx).await?),
            Op::GetUser { id } => json!(self.users.get_one(id).await?),
            Op::ListUsers { page } => match page {
                Some(page) => json!(self.users.get_page(page).await?),
                None => json!(self.users.get_all().await?),
            },
            Op::GetBalance { id } => json!(self.users.balance(id).await?),
            Op::Deduct { id, amount } => json!(self.users.deduct(id, amount, ctx).await?),

            Op::CreateCourse(new) => json!(self.courses.create(new, ctx).await?),
            Op::UpdateCourse { id, patch } => json!(self.courses.update(id, patch, ctx).await?),
            Op::TrashCourse { id } => json!(self.courses.trash(id, ctx).await?),
            Op::RestoreCourse { id } => json!(self.courses.restore(id, ctx).await?),
            Op::GetCourse { id } => json!(self.courses.get_one(id).await?),
            Op::ListCourses { page } => match page {
                Some(page) => json!(self.courses.get_page(page).await?),
                None => json!(self.courses.get_all().await?),
            },

            Op::CreatePayment(new) => json!(self.payments.create(new, ctx).await?),
            Op::UpdatePayment { id, patch } => json!(self.payments.update(id, patch, ctx).await?),
            Op::TrashPayment { id } => json!(self.payments.trash(id, ctx).await?),
            Op::RestorePayment { id } => json!(self.payments.restore(id, ctx).await?),
            Op::GetPayment { id } => json!(self.payments.get_one(id).await?),
            Op::ListPayments { page } => match page {
                Some(page) => json!(self.payments.get_page(page).await?),
                None => json!(self.payments.get_all().await?),
            },
            Op::SetPaymentStatus { id, status } => {
                json!(self.payments.set_status(id, status, ctx).await?)
            }
            Op::PaymentsByUser { user_id } => json!(self.payments.by_user(user_id).await?),
            Op::SuccessfulPaymentsByUser { user_id } => {
                json!(self.payments.successful_by_user(user_id).await?)
            }
            Op::CountPaymentsByCourse { course_id } => {
                json!(self.payments.count_by_course(course_id).await?)
            }

            Op::UserStats { scope } => json!(self.stats.user_stats(scope).await?),
            Op::CourseStats { scope } => json!(self.stats.course_stats(scope).await?),
            Op::PaymentStats { scope } => json!(self.stats.payment_stats(scope).await?),
        };
        Ok(value)
    }
}

/// Stable machine-readable key for a failure condition. This is the CLI's
/// analogue of a REST layer mapping conditions to status codes.
pub fn error_kind(err: &BillingError) -> &'static str {
    match err {
        BillingError::NotFound { .. } => "not_found",
        BillingError::AlreadyExists { .. } => "already_exists",
        BillingError::InvalidArgument(_) => "invalid_argument",
        BillingError::Storage(_) => "storage",
    }
}

/// Renders one outcome line for an applied op.
pub fn outcome_line(result: Result<Value>) -> String {
    let value = match result {
        Ok(value) => json!({ "ok": value }),
        Err(err) => json!({
            "error": { "kind": error_kind(&err), "message": err.to_string() }
        }),
    };
    value.to_string()
}
