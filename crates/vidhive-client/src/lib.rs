//! Typed client for the vidhive REST API.
//!
//! One [`gateway::ApiClient`] centralizes the base URL, the bearer token,
//! and error normalization. The [`slices`] mirror the server contract as
//! normalized state: each slice owns its fields plus `loading`/`error`,
//! mutated only by pure reducers driven by three-phase actions.

pub mod gateway;
pub mod slices;
