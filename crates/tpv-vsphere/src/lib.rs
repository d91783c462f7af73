//! # tpv-vsphere – vSphere endpoint layer
//!
//! Talks to vCenter / ESXi through the vSphere REST API and exposes the
//! operations the provider needs behind one async trait.
//!
//! ## Modules
//!
//! - **types**: Connection config and the host / storage / appliance data model
//! - **error**: Crate-specific error types and classifiers
//! - **vsphere**: REST HTTP client with session-based auth and task polling
//! - **host**: Inventory, maintenance and host configuration endpoints
//! - **storage**: Storage system, iSCSI and datastore endpoints
//! - **appliance**: vCenter appliance DNS settings
//! - **api**: `VsphereApi` trait and its REST implementation
//! - **hostsystem**: Host lookup by managed-object ID or hostname
//! - **simulator**: In-memory endpoint implementing `VsphereApi`

pub mod types;
pub mod error;
pub mod vsphere;
pub mod host;
pub mod storage;
pub mod appliance;
pub mod api;
pub mod hostsystem;
pub mod simulator;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use api::VsphereApi;
pub use error::{VsphereError, VsphereErrorKind, VsphereResult};
pub use hostsystem::{HostIdAttribute, HostIdentifier, HostSelector};
pub use simulator::SimulatedVsphere;
pub use types::{ApiType, VsphereConfig};
pub use vsphere::VsphereClient;
