//! OVH provider implementation
//!
//! This module contains the OVH API client, its credentials and the DNS-01
//! challenge provider built on top of them.

pub mod client;
pub mod credentials;
pub mod ovh;

// Re-export commonly used types
pub use client::OvhClient;
pub use credentials::{OvhConfig, OvhCredentials};
pub use ovh::OvhDnsProvider;
