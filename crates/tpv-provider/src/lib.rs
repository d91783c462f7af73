//! # tpv-provider – vSphere resource lifecycle
//!
//! Declarative resources and data sources on top of `tpv-vsphere`.
//!
//! ## Modules
//!
//! - **error**: Provider error type
//! - **schema**: Attribute metadata, validation and normalization
//! - **resource_data**: Per-operation ID / prior state / attribute view
//! - **resource**: `Resource` and `DataSource` traits
//! - **structure**: Shared flatten / expand helpers
//! - **host**: Host selector attributes and resolution
//! - **resources**: iSCSI adapter, vCenter DNS, NAS datastore, syslog, SNMP
//! - **data_sources**: Date/time, syslog and iSCSI adapter lookups
//! - **provider**: Type registry and lifecycle driver

pub mod error;
pub mod schema;
pub mod resource_data;
pub mod resource;
pub mod structure;
pub mod host;
pub mod resources;
pub mod data_sources;
pub mod provider;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};
pub use provider::Provider;
pub use resource::{DataSource, Resource};
pub use resource_data::{ResourceData, ResourceState};
pub use schema::{Attribute, Attributes, Schema, ValueType};
