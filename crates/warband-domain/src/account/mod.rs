mod aggregate;
mod repository;
mod value_objects;

pub use aggregate::Account;
pub use repository::AccountRepository;
pub use value_objects::{AccountType, FeatureToggles};
