//! Data Transfer Objects for REST request/response serialization.

pub mod auth_dto;
pub mod common_dto;
pub mod logs_dto;
pub mod realtime_dto;
pub mod settings_dto;
pub mod trades_dto;

pub use auth_dto::*;
pub use common_dto::*;
pub use logs_dto::*;
pub use realtime_dto::*;
pub use settings_dto::*;
pub use trades_dto::*;
