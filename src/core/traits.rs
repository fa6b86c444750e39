use sea_orm::{ActiveModelBehavior, ActiveModelTrait, DbErr, EntityTrait, IntoActiveModel};
use serde::{Serialize, de::DeserializeOwned};

use crate::validation::Validatable;

pub trait MergeIntoActiveModel<ActiveModelType> {
    /// Merge this update model into an existing active model
    ///
    /// # Errors
    ///
    /// Returns a `DbErr` if the merge operation fails due to data conversion issues.
    fn merge_into_activemodel(self, existing: ActiveModelType) -> Result<ActiveModelType, DbErr>;
}

/// Binds an entity to the payload types its controller accepts.
///
/// ```rust,ignore
/// pub struct Parents;
///
/// impl CrudResource for Parents {
///     type Entity = parent::Entity;
///     type ActiveModel = parent::ActiveModel;
///     type CreateModel = ParentCreate;
///     type UpdateModel = ParentUpdate;
///
///     const RESOURCE_NAME: &'static str = "parent";
/// }
/// ```
pub trait CrudResource: Send + Sync + 'static {
    type Entity: EntityTrait<Model: IntoActiveModel<Self::ActiveModel> + Serialize + Sync>;
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity> + ActiveModelBehavior + Send;
    type CreateModel: Into<Self::ActiveModel> + DeserializeOwned + Validatable + Send;
    type UpdateModel: MergeIntoActiveModel<Self::ActiveModel>
        + DeserializeOwned
        + Validatable
        + Send;

    /// Used in error messages and logs.
    const RESOURCE_NAME: &'static str;
}

/// Row type of a resource.
pub type ModelOf<R> = <<R as CrudResource>::Entity as EntityTrait>::Model;
