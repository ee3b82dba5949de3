pub mod bill_service;
pub mod currency_service;
pub mod investment_service;
pub mod platform_service;
pub mod sale_service;
pub mod summary_service;

mod validation;
