pub mod clock;
pub mod error;
pub mod notifications;
pub mod record;
pub mod scheduler;
pub mod service;
pub mod storage;
pub mod store;
pub mod urgency;

pub use crate::error::{PlantCareError, Result};
pub use crate::record::{Plant, PlantCareRecord};
pub use crate::service::{PlantCareService, PlantCareServiceBuilder, Removal};
