//! Service layer providing business-oriented operations on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod catalog_service;
pub mod geo_service;
pub mod area_service;
pub mod referral_service;
pub mod lead_service;
pub mod storage;
#[cfg(test)]
pub mod test_support;
