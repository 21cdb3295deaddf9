// Core domain layer: constants, errors, crypto

pub mod constants;
pub mod crypto;
pub mod errors;
