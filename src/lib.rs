pub mod admin;
pub mod checkout;
pub mod engine;
pub mod state;
