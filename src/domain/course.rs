use super::entity::{Audit, Entity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A purchasable course. `name` is unique among live rows only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(flatten)]
    pub audit: Audit,
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

impl Entity for Course {
    const KIND: &'static str = "courses";

    fn audit(&self) -> &Audit {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut Audit {
        &mut self.audit
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub price: Decimal,
}

impl From<NewCourse> for Course {
    fn from(new: NewCourse) -> Self {
        Self {
            audit: Audit::new(),
            name: new.name,
            description: new.description,
            price: new.price,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

impl CoursePatch {
    pub fn apply(&self, course: &mut Course) {
        if let Some(name) = &self.name {
            course.name = name.clone();
        }
        if let Some(description) = &self.description {
            course.description = description.clone();
        }
        if let Some(price) = self.price {
            course.price = price;
        }
    }
}
