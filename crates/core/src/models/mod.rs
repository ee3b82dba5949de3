pub mod bill;
pub mod currency;
pub mod dataset;
pub mod investment;
pub mod money;
pub mod summary;
