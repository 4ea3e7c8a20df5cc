use super::entity::{Audit, Entity, EntityId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    Cash,
    BankTransfer,
}

/// Any status may move to any other status; there is no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
    Cancelled,
}

/// A payment record. `user_id` and `course_id` are plain references; the
/// store does not enforce that they point at existing rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(flatten)]
    pub audit: Audit,
    pub user_id: EntityId,
    pub course_id: EntityId,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
}

impl Entity for Payment {
    const KIND: &'static str = "payments";

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}

/// Fields for creating a payment. `payment_date` defaults to the creation
/// instant when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub user_id: EntityId,
    pub course_id: EntityId,
    pub amount: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentPatch {
    pub amount: Option<Decimal>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
}

impl PaymentPatch {
    pub fn apply(&self, payment: &mut Payment) {
        if let Some(amount) = self.amount {
            payment.amount = amount;
        }
        if let Some(payment_date) = self.payment_date {
            payment.payment_date = payment_date;
        }
        if let Some(payment_method) = self.payment_method {
            payment.payment_method = payment_method;
        }
        if let Some(status) = self.status {
            payment.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_in_wire_form() {
        let json = serde_json::to_string(&PaymentStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let method: PaymentMethod = serde_json::from_str("\"BANK_TRANSFER\"").unwrap();
        assert_eq!(method, PaymentMethod::BankTransfer);
    }
}
