//! # Actions
//!
//! Application logic that does not fit a plain CRUD call is written as an [`Action`]:
//! validation runs first, then the action itself. A [`WebAction`] adds a permission check
//! in front and serialization behind:
//!
//! ```text
//! Action::run      validate -> action
//! WebAction::run_web   permit -> validate -> action -> serialize
//! ```
//!
//! [`run_pipeline`] is the same flow for one-off operations: load and validate a raw
//! payload, run the operation, serialize its output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use querycrate::{Action, CrudError};
//! use async_trait::async_trait;
//!
//! pub struct Rename { pub controller: Arc<Controller<Parents>>, pub id: Uuid, pub first: String }
//!
//! #[async_trait]
//! impl Action for Rename {
//!     type Output = parent::Model;
//!
//!     async fn validate(&self) -> Result<(), CrudError> {
//!         if self.first.is_empty() {
//!             return Err(CrudError::validation("first must not be empty"));
//!         }
//!         Ok(())
//!     }
//!
//!     async fn action(&self) -> Result<Self::Output, CrudError> {
//!         let update = ParentUpdate { first: Some(self.first.clone()), ..Default::default() };
//!         self.controller.update(self.id, update).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::errors::CrudError;
use crate::serialization::dump;
use crate::validation::{Validatable, load};

#[async_trait]
pub trait Action: Send + Sync {
    type Output: Send;

    /// Reject invalid input before anything is changed.
    async fn validate(&self) -> Result<(), CrudError> {
        Ok(())
    }

    async fn action(&self) -> Result<Self::Output, CrudError>;

    async fn run(&self) -> Result<Self::Output, CrudError> {
        self.validate().await?;
        self.action().await
    }
}

#[async_trait]
pub trait WebAction: Action {
    /// Check the caller may run this action.
    async fn permit(&self) -> Result<(), CrudError>;

    fn serialize(&self, output: Self::Output) -> Result<Value, CrudError>;

    async fn run_web(&self) -> Result<Value, CrudError> {
        self.permit().await?;
        let output = self.run().await?;
        self.serialize(output)
    }
}

/// Load `raw` as `In`, run `op`, and serialize its output (projected to `only` when given,
/// empty values removed).
///
/// # Errors
///
/// [`CrudError::Validation`] for invalid input; errors from `op` propagate.
pub async fn run_pipeline<In, Out, F, Fut>(
    raw: Value,
    op: F,
    only: Option<&[String]>,
) -> Result<Value, CrudError>
where
    In: DeserializeOwned + Validatable,
    Out: Serialize,
    F: FnOnce(In) -> Fut,
    Fut: Future<Output = Result<Out, CrudError>>,
{
    let input = load::<In>(raw)?;
    let output = op(input).await?;
    dump(&output, only, &[])
}
