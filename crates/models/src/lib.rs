pub mod errors;
pub mod db;
pub mod partner;
pub mod partner_credentials;
pub mod referral_link;
pub mod referral_click;
pub mod service;
pub mod sub_service;
pub mod commission_tier;
pub mod state;
pub mod county;
pub mod city;
pub mod zip_code;
pub mod service_area_mapping;
pub mod lead;
pub mod lead_attachment;
pub mod audit_log;

#[cfg(test)]
mod tests;
