//! Console client for the Sentinel community API: a persisted session,
//! an authenticated request pipeline, and typed wrappers for the auth,
//! post, file, and admin endpoints.

pub mod api;
pub mod cli;
pub mod services;
pub mod session;
pub mod util;
pub mod verify;
