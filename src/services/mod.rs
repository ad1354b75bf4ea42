pub mod registration_service;
pub mod token_service;
pub mod user_store;

#[cfg(test)]
pub mod test_utils;

pub use registration_service::*;
pub use token_service::*;
pub use user_store::*;
