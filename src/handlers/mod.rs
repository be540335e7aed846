// handlers/mod.rs - HTTP handlers by access tier
//
// Public (no auth) → Protected (bearer token verified by the auth gate).
// Service-level endpoints (/, /health) live in `system`.

pub mod protected;
pub mod public;
pub mod system;
