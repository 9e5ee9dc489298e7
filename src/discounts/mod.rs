pub mod calculator;
pub mod eligibility;
pub mod error;
pub mod handlers;
pub mod models;
pub mod query;
pub mod repository;
pub mod service;
pub mod weakness;

pub use calculator::*;
pub use eligibility::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use query::*;
pub use repository::*;
pub use service::*;
pub use weakness::*;
