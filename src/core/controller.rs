//! # Controller
//!
//! [`Controller`] combines a [`CrudResource`] with its resolved [`Meta`] options and exposes
//! the CRUD capabilities plus the listing entry points:
//!
//! | operation | parameters | result |
//! |---|---|---|
//! | `paginate` | suffix-style mapping | serialized envelope |
//! | `paginate_query` | operator-prefix mapping | serialized envelope |
//! | `paginate_models` | suffix-style mapping + optional base `Select` | typed envelope |
//! | `run_query` | [`QuerySpec`] | rows |
//!
//! Writes run inside a transaction. When the storage layer rejects a write the transaction
//! is rolled back and the database error is reported as [`CrudError::Create`] or
//! [`CrudError::Update`] with the original description.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Select, TransactionTrait,
    sea_query::SimpleExpr,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::traits::{CrudResource, MergeIntoActiveModel, ModelOf};
use crate::columns::Field;
use crate::errors::CrudError;
use crate::filtering::{
    ExtractedParams, QuerySpec, StatementBuilder, extract_operator_params, extract_params,
};
use crate::meta::Meta;
use crate::models::ListRequest;
use crate::pagination::{Envelope, Paginator};
use crate::serialization::dump;

type ColumnOf<R> = <<R as CrudResource>::Entity as EntityTrait>::Column;

pub struct Controller<R: CrudResource> {
    meta: Meta<R::Entity>,
    id: Field<ColumnOf<R>>,
}

impl<R: CrudResource> Controller<R> {
    /// # Errors
    ///
    /// Returns [`CrudError::OptionNotFound`] when the entity declares no primary key.
    pub fn new(meta: Meta<R::Entity>) -> Result<Self, CrudError> {
        let id = meta
            .columns()
            .primary_key()
            .ok_or_else(|| CrudError::OptionNotFound {
                option: "primary_key".to_string(),
            })?;
        Ok(Self { meta, id })
    }

    #[must_use]
    pub const fn meta(&self) -> &Meta<R::Entity> {
        &self.meta
    }

    const fn db(&self) -> &DatabaseConnection {
        self.meta.connection()
    }

    fn id_eq(&self, id: Uuid) -> SimpleExpr {
        self.id.column.eq(id)
    }

    fn create_error(error: &DbErr) -> CrudError {
        CrudError::Create {
            resource: R::RESOURCE_NAME.to_string(),
            message: error.to_string(),
        }
    }

    fn update_error(error: &DbErr) -> CrudError {
        CrudError::Update {
            resource: R::RESOURCE_NAME.to_string(),
            message: error.to_string(),
        }
    }

    /// Commit on success, roll back on failure.
    async fn finish<T>(
        txn: DatabaseTransaction,
        result: Result<T, CrudError>,
    ) -> Result<T, CrudError> {
        match result {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = txn.rollback().await {
                    warn!(
                        resource = R::RESOURCE_NAME,
                        error = %rollback_error,
                        "Rollback failed"
                    );
                }
                warn!(resource = R::RESOURCE_NAME, error = %error, "Write rolled back");
                Err(error)
            }
        }
    }

    // Create

    /// # Errors
    ///
    /// Returns [`CrudError::Create`] when the insert is rejected.
    pub async fn create(&self, payload: R::CreateModel) -> Result<ModelOf<R>, CrudError> {
        let txn = self.db().begin().await?;
        let active: R::ActiveModel = payload.into();
        let result = active
            .insert(&txn)
            .await
            .map_err(|e| Self::create_error(&e));
        Self::finish(txn, result).await
    }

    /// Insert every payload in one transaction; either all rows are written or none.
    ///
    /// # Errors
    ///
    /// Returns [`CrudError::Create`] when any insert is rejected.
    pub async fn bulk_create(&self, payloads: Vec<R::CreateModel>) -> Result<u64, CrudError> {
        if payloads.is_empty() {
            return Ok(0);
        }
        let models: Vec<R::ActiveModel> = payloads.into_iter().map(Into::into).collect();
        let txn = self.db().begin().await?;
        let result = R::Entity::insert_many(models)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| Self::create_error(&e));
        Self::finish(txn, result).await
    }

    // Read

    /// # Errors
    ///
    /// Returns [`CrudError::NotFound`] when no row has this id.
    pub async fn read(&self, id: Uuid) -> Result<ModelOf<R>, CrudError> {
        R::Entity::find()
            .filter(self.id_eq(id))
            .one(self.db())
            .await?
            .ok_or_else(|| CrudError::not_found(R::RESOURCE_NAME, id))
    }

    /// Rows whose id is in `ids`. Missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn bulk_read(&self, ids: Vec<Uuid>) -> Result<Vec<ModelOf<R>>, CrudError> {
        Ok(R::Entity::find()
            .filter(self.id.column.is_in(ids))
            .all(self.db())
            .await?)
    }

    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn read_all(&self) -> Result<Vec<ModelOf<R>>, CrudError> {
        Ok(R::Entity::find().all(self.db()).await?)
    }

    // Update

    async fn apply_update(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
        payload: R::UpdateModel,
    ) -> Result<ModelOf<R>, CrudError> {
        let existing = R::Entity::find()
            .filter(self.id_eq(id))
            .one(txn)
            .await?
            .ok_or_else(|| CrudError::not_found(R::RESOURCE_NAME, id))?;
        let merged = payload
            .merge_into_activemodel(existing.into_active_model())
            .map_err(|e| Self::update_error(&e))?;
        merged.update(txn).await.map_err(|e| Self::update_error(&e))
    }

    /// # Errors
    ///
    /// [`CrudError::NotFound`] for an unknown id, [`CrudError::Update`] when the update
    /// is rejected.
    pub async fn update(
        &self,
        id: Uuid,
        payload: R::UpdateModel,
    ) -> Result<ModelOf<R>, CrudError> {
        let txn = self.db().begin().await?;
        let result = self.apply_update(&txn, id, payload).await;
        Self::finish(txn, result).await
    }

    /// Apply every update in one transaction; a single failure rolls back all of them.
    ///
    /// # Errors
    ///
    /// As [`update`](Self::update), for the first item that fails.
    pub async fn bulk_update(
        &self,
        items: Vec<(Uuid, R::UpdateModel)>,
    ) -> Result<Vec<ModelOf<R>>, CrudError> {
        let txn = self.db().begin().await?;
        let mut updated = Vec::with_capacity(items.len());
        let mut result = Ok(());
        for (id, payload) in items {
            match self.apply_update(&txn, id, payload).await {
                Ok(model) => updated.push(model),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        Self::finish(txn, result.map(|()| updated)).await
    }

    // Delete

    /// # Errors
    ///
    /// Returns [`CrudError::NotFound`] when no row was deleted.
    pub async fn delete(&self, id: Uuid) -> Result<Uuid, CrudError> {
        let result = R::Entity::delete_many()
            .filter(self.id_eq(id))
            .exec(self.db())
            .await?;
        if result.rows_affected == 0 {
            return Err(CrudError::not_found(R::RESOURCE_NAME, id));
        }
        Ok(id)
    }

    /// Delete every row whose id is in `ids` and return how many were removed.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn bulk_delete(&self, ids: Vec<Uuid>) -> Result<u64, CrudError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = R::Entity::delete_many()
            .filter(self.id.column.is_in(ids))
            .exec(self.db())
            .await?;
        Ok(result.rows_affected)
    }

    // Listing

    async fn fetch_page(
        &self,
        base: Select<R::Entity>,
        extracted: &ExtractedParams,
        request: &ListRequest,
    ) -> Result<Envelope<ModelOf<R>>, CrudError> {
        let select = StatementBuilder::from_select(self.meta.columns(), base).build(extracted)?;
        let page = request.page_request(self.meta.settings());
        debug!(
            resource = R::RESOURCE_NAME,
            page = page.effective_page(),
            per_page = page.effective_per_page(),
            "Paginating"
        );
        Paginator::new(select, page).fetch(self.db()).await
    }

    fn serialize_envelope(
        envelope: Envelope<ModelOf<R>>,
        fields: Option<&[String]>,
    ) -> Result<Value, CrudError> {
        let envelope = envelope.try_map_items(|model| dump(&model, fields, &[]))?;
        dump(&envelope, None, &["items"])
    }

    /// Typed page for suffix-style parameters, optionally on top of a caller-prepared
    /// statement (e.g. one that joins other tables).
    ///
    /// # Errors
    ///
    /// Parameter and statement errors are reported before any query runs.
    pub async fn paginate_models(
        &self,
        params: &Map<String, Value>,
        base: Option<Select<R::Entity>>,
    ) -> Result<Envelope<ModelOf<R>>, CrudError> {
        let request = ListRequest::from_params(params, self.meta.settings())?;
        self.suffix_page(params, &request, base).await
    }

    async fn suffix_page(
        &self,
        params: &Map<String, Value>,
        request: &ListRequest,
        base: Option<Select<R::Entity>>,
    ) -> Result<Envelope<ModelOf<R>>, CrudError> {
        let extracted = extract_params(params, self.meta.settings(), self.meta.id_column())?;
        self.fetch_page(base.unwrap_or_else(R::Entity::find), &extracted, request)
            .await
    }

    /// Serialized page for suffix-style parameters, honouring `fields`.
    ///
    /// # Errors
    ///
    /// As [`paginate_models`](Self::paginate_models).
    pub async fn paginate(&self, params: &Map<String, Value>) -> Result<Value, CrudError> {
        let request = ListRequest::from_params(params, self.meta.settings())?;
        let envelope = self.suffix_page(params, &request, None).await?;
        Self::serialize_envelope(envelope, request.fields.as_deref())
    }

    /// Serialized page for operator-prefix parameters (`<opr>__<col>`).
    ///
    /// # Errors
    ///
    /// [`CrudError::PrefixNotAllowed`] for unknown prefixes, plus everything
    /// [`paginate_models`](Self::paginate_models) reports.
    pub async fn paginate_query(&self, params: &Map<String, Value>) -> Result<Value, CrudError> {
        let settings = self.meta.settings();
        let request = ListRequest::from_params(params, settings)?;
        let extracted = extract_operator_params(params, settings, self.meta.id_column())?;
        let envelope = self
            .fetch_page(R::Entity::find(), &extracted, &request)
            .await?;
        Self::serialize_envelope(envelope, request.fields.as_deref())
    }

    /// Execute a JSON-shaped query.
    ///
    /// # Errors
    ///
    /// Propagates statement and database errors.
    pub async fn run_query(&self, spec: &QuerySpec) -> Result<Vec<ModelOf<R>>, CrudError> {
        let select = spec.to_select(self.meta.columns(), None)?;
        Ok(select.all(self.db()).await?)
    }
}
