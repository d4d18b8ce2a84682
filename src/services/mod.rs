//! Typed call-sites over the request pipeline, one module per backend
//! domain. These stay thin: input trimming and validation happen here, the
//! pipeline owns transport and error normalization, and the envelope decoder
//! absorbs the enveloped-vs-bare inconsistency between endpoints.

pub mod admin;
pub mod auth;
pub mod files;
pub mod posts;

use serde::{Deserialize, Serialize};

/// Standard page wrapper used by list endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub last: bool,
}
