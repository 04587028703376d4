pub mod account;
pub mod product;

pub use account::{Account, AccountStatus, FarmerProfile, Role};
pub use product::Product;
