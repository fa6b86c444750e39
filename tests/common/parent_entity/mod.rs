use chrono::{DateTime, FixedOffset, Utc};
use querycrate::{
    CrudResource, MergeIntoActiveModel, Validatable, ValidationError, ValidationErrors,
    validation::ensure_utc,
};
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "parent")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first: String,
    pub second: Option<String>,
    pub rank: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentCreate {
    pub first: String,
    #[serde(default)]
    pub second: Option<String>,
    #[serde(default)]
    pub rank: i32,
    #[serde(default)]
    pub created_at: Option<DateTime<FixedOffset>>,
}

impl Validatable for ParentCreate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.first.trim().is_empty() {
            errors.add(ValidationError::new("first", "must not be empty"));
        }
        if let Some(created_at) = &self.created_at
            && let Err(e) = ensure_utc("created_at", created_at)
        {
            errors.add(e);
        }
        errors.result()
    }
}

impl From<ParentCreate> for ActiveModel {
    fn from(create: ParentCreate) -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            first: Set(create.first),
            second: Set(create.second),
            rank: Set(create.rank),
            created_at: Set(create
                .created_at
                .map_or_else(Utc::now, |at| at.with_timezone(&Utc))),
            updated_at: Set(None),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParentUpdate {
    pub first: Option<String>,
    pub second: Option<String>,
    pub rank: Option<i32>,
}

impl Validatable for ParentUpdate {}

impl MergeIntoActiveModel<ActiveModel> for ParentUpdate {
    fn merge_into_activemodel(self, mut existing: ActiveModel) -> Result<ActiveModel, DbErr> {
        if let Some(first) = self.first {
            existing.first = Set(first);
        }
        if let Some(second) = self.second {
            existing.second = Set(Some(second));
        }
        if let Some(rank) = self.rank {
            existing.rank = Set(rank);
        }
        existing.updated_at = Set(Some(Utc::now()));
        Ok(existing)
    }
}

pub struct Parents;

impl CrudResource for Parents {
    type Entity = Entity;
    type ActiveModel = ActiveModel;
    type CreateModel = ParentCreate;
    type UpdateModel = ParentUpdate;

    const RESOURCE_NAME: &'static str = "parent";
}
