use crate::domain::course::Course;
use crate::domain::entity::Scope;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::SharedStore;
use crate::domain::user::User;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_users: u64,
    pub total_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseStats {
    pub total_courses: u64,
    pub total_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStats {
    pub total_success_amount: Decimal,
    pub total_count: u64,
}

/// Read-side rollups across all three entity kinds. No side effects, no
/// caching: every call recomputes from the stores, so reads always see the
/// latest writes.
///
/// The source system was inconsistent about whether aggregates include
/// trashed rows, so the scope is an explicit parameter on every method.
pub struct StatsService {
    users: SharedStore<User>,
    courses: SharedStore<Course>,
    payments: SharedStore<Payment>,
}

impl StatsService {
    pub fn new(
        users: SharedStore<User>,
        courses: SharedStore<Course>,
        payments: SharedStore<Payment>,
    ) -> Self {
        Self {
            users,
            courses,
            payments,
        }
    }

    pub async fn user_stats(&self, scope: Scope) -> Result<UserStats> {
        Ok(UserStats {
            total_users: self.users.count(scope).await?,
            total_balance: self.users.sum(scope, &|u: &User| u.balance).await?,
        })
    }

    pub async fn course_stats(&self, scope: Scope) -> Result<CourseStats> {
        Ok(CourseStats {
            total_courses: self.courses.count(scope).await?,
            total_income: self.courses.sum(scope, &|c: &Course| c.price).await?,
        })
    }

    /// The amount sum is restricted to successful payments; the count covers
    /// every payment within the scope.
    pub async fn payment_stats(&self, scope: Scope) -> Result<PaymentStats> {
        Ok(PaymentStats {
            total_success_amount: self
                .payments
                .sum(scope, &|p: &Payment| {
                    if p.status == PaymentStatus::Success {
                        p.amount
                    } else {
                        Decimal::ZERO
                    }
                })
                .await?,
            total_count: self.payments.count(scope).await?,
        })
    }
}
