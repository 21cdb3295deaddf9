// Shared per-process state: credential persistence and the anti-forgery
// token cache

pub mod csrf;
pub mod kv;
pub mod session;
