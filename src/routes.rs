//! Generic axum handlers over a shared [`Controller`].
//!
//! ```rust,ignore
//! let controller = Arc::new(Controller::<Parents>::new(meta)?);
//! let app = Router::new().nest("/parents", querycrate::routes::router(controller));
//! ```
//!
//! `GET /` takes suffix-style parameters; mount [`list_query`] yourself for the
//! operator-prefix style.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::core::{Controller, CrudResource};
use crate::errors::CrudError;
use crate::models::params_from_pairs;
use crate::pipeline::run_pipeline;
use crate::serialization::dump;

type Shared<R> = State<Arc<Controller<R>>>;

/// Paginated listing with suffix-style parameters.
///
/// # Errors
///
/// Any [`CrudError`], rendered by its `IntoResponse` impl.
pub async fn list<R: CrudResource>(
    State(controller): Shared<R>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, CrudError> {
    let params = params_from_pairs(pairs);
    Ok(Json(controller.paginate(&params).await?))
}

/// Paginated listing with operator-prefix parameters (`<opr>__<col>`).
///
/// # Errors
///
/// Any [`CrudError`], rendered by its `IntoResponse` impl.
pub async fn list_query<R: CrudResource>(
    State(controller): Shared<R>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, CrudError> {
    let params = params_from_pairs(pairs);
    Ok(Json(controller.paginate_query(&params).await?))
}

/// # Errors
///
/// [`CrudError::NotFound`] for an unknown id.
pub async fn read<R: CrudResource>(
    State(controller): Shared<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, CrudError> {
    let model = controller.read(id).await?;
    Ok(Json(dump(&model, None, &[])?))
}

/// # Errors
///
/// [`CrudError::Validation`] for an invalid payload, [`CrudError::Create`] when the
/// insert is rejected.
pub async fn create<R: CrudResource>(
    State(controller): Shared<R>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), CrudError> {
    let created = run_pipeline(
        payload,
        |input: R::CreateModel| controller.create(input),
        None,
    )
    .await?;
    info!(resource = R::RESOURCE_NAME, "Created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// # Errors
///
/// [`CrudError::Validation`] for an invalid payload, [`CrudError::NotFound`] for an
/// unknown id.
pub async fn update<R: CrudResource>(
    State(controller): Shared<R>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, CrudError> {
    let updated = run_pipeline(
        payload,
        |input: R::UpdateModel| controller.update(id, input),
        None,
    )
    .await?;
    Ok(Json(updated))
}

/// # Errors
///
/// [`CrudError::NotFound`] when nothing was deleted.
pub async fn delete<R: CrudResource>(
    State(controller): Shared<R>,
    Path(id): Path<Uuid>,
) -> Result<Json<Uuid>, CrudError> {
    let deleted = controller.delete(id).await?;
    info!(resource = R::RESOURCE_NAME, %id, "Deleted");
    Ok(Json(deleted))
}

/// `/` (list, create) and `/{id}` (read, update, delete) for one resource.
pub fn router<R: CrudResource>(controller: Arc<Controller<R>>) -> Router {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/{id}",
            get(read::<R>).put(update::<R>).delete(delete::<R>),
        )
        .with_state(controller)
}
