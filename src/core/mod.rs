// Resource binding and the controller built on it

pub mod controller;
pub mod traits;

pub use controller::Controller;
pub use traits::{CrudResource, MergeIntoActiveModel, ModelOf};
