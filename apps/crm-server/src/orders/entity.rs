use audit_trail::{Audited, TrackedField};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub status: String,
    pub description: Option<String>,
    pub amount: f64,
    pub created_by: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

static ORDER_FIELDS: [TrackedField<Model>; 3] = [
    TrackedField::new("status", |o| Some(o.status.clone())),
    TrackedField::new("description", |o| o.description.clone()),
    TrackedField::new("amount", |o| Some(o.amount.to_string())),
];

impl Audited for Model {
    const SOURCE_TYPE: &'static str = "order";

    fn source_id(&self) -> i32 {
        self.id
    }

    fn tracked_fields() -> &'static [TrackedField<Self>] {
        &ORDER_FIELDS
    }
}
