//! Shared types for the vSphere client layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{VsphereError, VsphereResult};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Connection / Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const ENV_SERVER: &str = "VSPHERE_SERVER";
pub const ENV_USER: &str = "VSPHERE_USER";
pub const ENV_PASSWORD: &str = "VSPHERE_PASSWORD";
pub const ENV_ALLOW_UNVERIFIED_SSL: &str = "VSPHERE_ALLOW_UNVERIFIED_SSL";
pub const ENV_PORT: &str = "VSPHERE_PORT";
pub const ENV_TIMEOUT: &str = "VSPHERE_TIMEOUT";

/// Top-level configuration for connecting to a vCenter / ESXi endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfig {
    /// vCenter or ESXi hostname / IP (e.g. "vcenter.lab.local")
    pub host: String,
    /// Port (default 443)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username (e.g. "administrator@vsphere.local")
    pub username: String,
    /// Password
    #[serde(default)]
    pub password: String,
    /// Skip TLS certificate verification (self-signed labs)
    #[serde(default)]
    pub insecure: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Pin the endpoint type instead of probing it after login
    #[serde(default)]
    pub api_type: Option<ApiType>,
}

fn default_port() -> u16 { 443 }
fn default_timeout() -> u64 { 30 }

impl Default for VsphereConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            port: 443,
            insecure: false,
            timeout_secs: 30,
            api_type: None,
        }
    }
}

impl VsphereConfig {
    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> VsphereResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VsphereError::invalid_argument(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overlay `VSPHERE_*` variables from the process environment.
    pub fn with_env_overrides(self) -> VsphereResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> VsphereResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_SERVER) {
            self.host = v;
        }
        if let Some(v) = lookup(ENV_USER) {
            self.username = v;
        }
        if let Some(v) = lookup(ENV_PASSWORD) {
            self.password = v;
        }
        if let Some(v) = lookup(ENV_ALLOW_UNVERIFIED_SSL) {
            self.insecure = parse_bool(ENV_ALLOW_UNVERIFIED_SSL, &v)?;
        }
        if let Some(v) = lookup(ENV_PORT) {
            self.port = v.parse().map_err(|_| {
                VsphereError::invalid_argument(format!("{ENV_PORT} is not a valid port: '{v}'"))
            })?;
        }
        if let Some(v) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = v.parse().map_err(|_| {
                VsphereError::invalid_argument(format!("{ENV_TIMEOUT} must be a number of seconds: '{v}'"))
            })?;
        }
        Ok(self)
    }

    /// Reject configs that cannot possibly log in.
    pub fn validate(&self) -> VsphereResult<()> {
        if self.host.trim().is_empty() {
            return Err(VsphereError::invalid_argument(format!(
                "vSphere server must be set (config 'host' or {ENV_SERVER})"
            )));
        }
        if self.username.trim().is_empty() {
            return Err(VsphereError::invalid_argument(format!(
                "vSphere user must be set (config 'username' or {ENV_USER})"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(VsphereError::invalid_argument("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Config view safe to print.
    pub fn safe(&self) -> VsphereConfigSafe {
        VsphereConfigSafe {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            insecure: self.insecure,
        }
    }
}

fn parse_bool(key: &str, raw: &str) -> VsphereResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(VsphereError::invalid_argument(format!("{key} is not a boolean: '{raw}'"))),
    }
}

/// Config without the password.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VsphereConfigSafe {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub insecure: bool,
}

/// The implicit datacenter a standalone ESXi host reports itself under.
pub const HA_DATACENTER: &str = "ha-datacenter";

/// Which kind of endpoint the session is talking to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiType {
    /// Standalone ESXi
    HostAgent,
    /// vCenter Server
    VirtualCenter,
}

impl fmt::Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HostAgent => write!(f, "HostAgent"),
            Self::VirtualCenter => write!(f, "VirtualCenter"),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Inventory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Datacenter summary (GET /api/vcenter/datacenter).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatacenterSummary {
    /// Managed-object ID (e.g. "datacenter-3")
    pub datacenter: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostConnectionState {
    Connected,
    Disconnected,
    NotResponding,
    #[serde(other)]
    Unknown,
}

impl Default for HostConnectionState {
    fn default() -> Self { Self::Unknown }
}

impl fmt::Display for HostConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::NotResponding => "notResponding",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Host summary (GET /api/vcenter/host). This is the resolved host object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSummary {
    /// Managed-object ID (e.g. "host-42")
    pub host: String,
    pub name: String,
    #[serde(default)]
    pub connection_state: HostConnectionState,
}

/// Runtime flags of a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostRuntimeInfo {
    pub connection_state: HostConnectionState,
    pub in_maintenance_mode: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Tasks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Blocked,
}

impl TaskState {
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::Pending | Self::Running | Self::Blocked)
    }
}

/// Task status (GET /api/cis/tasks/{task}).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskInfo {
    #[serde(default)]
    pub task: String,
    pub status: TaskState,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskInfo {
    /// Wall-clock run time, when the endpoint reported both timestamps.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Host configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Advanced option holding the remote syslog target.
pub const SYSLOG_LOG_HOST_KEY: &str = "Syslog.global.logHost";
/// Advanced option holding the syslog daemon level.
pub const SYSLOG_LOG_LEVEL_KEY: &str = "Syslog.global.logLevel";

/// Date / time settings of a host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostDateTimeInfo {
    #[serde(default)]
    pub ntp_servers: Vec<String>,
    /// e.g. "ntp" or "ptp"
    #[serde(default)]
    pub system_clock_protocol: String,
    #[serde(default)]
    pub disable_events: bool,
    #[serde(default)]
    pub disable_fallback: bool,
}

/// A single host advanced option.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionValue {
    pub key: String,
    pub value: serde_json::Value,
}

impl OptionValue {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

/// An SNMP trap receiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnmpTrapTarget {
    pub host_name: String,
    pub port: u16,
    pub community: String,
}

impl SnmpTrapTarget {
    /// Parse `host:port/community`.
    pub fn parse(raw: &str) -> VsphereResult<Self> {
        let invalid = || {
            VsphereError::invalid_argument(format!(
                "invalid trap target '{raw}', expected <host>:<port>/<community>"
            ))
        };
        let (addr, community) = raw.split_once('/').ok_or_else(invalid)?;
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        if host.is_empty() || community.is_empty() {
            return Err(invalid());
        }
        Ok(Self { host_name: host.to_string(), port, community: community.to_string() })
    }
}

impl fmt::Display for SnmpTrapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host_name, self.port, self.community)
    }
}

/// Host SNMP agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSnmpConfig {
    pub enabled: bool,
    pub port: u16,
    #[serde(default)]
    pub read_only_communities: Vec<String>,
    #[serde(default)]
    pub trap_targets: Vec<SnmpTrapTarget>,
    #[serde(default)]
    pub sys_location: String,
    #[serde(default)]
    pub sys_contact: String,
}

impl Default for HostSnmpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 161,
            read_only_communities: Vec::new(),
            trap_targets: Vec::new(),
            sys_location: String::new(),
            sys_contact: String::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Storage
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HostBusAdapterKind {
    InternetScsi,
    FibreChannel,
    BlockAdapter,
    #[serde(other)]
    Other,
}

/// A storage adapter (vmhbaNN) on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostBusAdapter {
    /// Device name (e.g. "vmhba65")
    pub device: String,
    pub kind: HostBusAdapterKind,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub is_software_based: bool,
    /// IQN, only meaningful for iSCSI adapters
    #[serde(default)]
    pub iscsi_name: String,
}

/// Storage device view of a host's storage system.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostStorageDeviceInfo {
    #[serde(default)]
    pub software_internet_scsi_enabled: bool,
    #[serde(default)]
    pub host_bus_adapters: Vec<HostBusAdapter>,
}

impl HostStorageDeviceInfo {
    /// The software iSCSI adapter, if the host has one.
    pub fn software_iscsi_adapter(&self) -> Option<&HostBusAdapter> {
        self.host_bus_adapters
            .iter()
            .find(|hba| hba.kind == HostBusAdapterKind::InternetScsi && hba.is_software_based)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NasType {
    #[serde(rename = "NFS")]
    Nfs,
    #[serde(rename = "NFS41")]
    Nfs41,
    #[serde(rename = "CIFS")]
    Cifs,
}

impl NasType {
    pub fn parse(raw: &str) -> VsphereResult<Self> {
        match raw {
            "NFS" => Ok(Self::Nfs),
            "NFS41" => Ok(Self::Nfs41),
            "CIFS" => Ok(Self::Cifs),
            _ => Err(VsphereError::invalid_argument(format!("unsupported NAS type '{raw}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nfs => "NFS",
            Self::Nfs41 => "NFS41",
            Self::Cifs => "CIFS",
        }
    }
}

/// Whether a datastore type string names a NAS volume.
pub fn is_nas_volume(ds_type: &str) -> bool {
    NasType::parse(ds_type).is_ok()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    #[serde(rename = "readWrite")]
    ReadWrite,
    #[serde(rename = "readOnly")]
    ReadOnly,
}

impl AccessMode {
    pub fn parse(raw: &str) -> VsphereResult<Self> {
        match raw {
            "readWrite" => Ok(Self::ReadWrite),
            "readOnly" => Ok(Self::ReadOnly),
            _ => Err(VsphereError::invalid_argument(format!("unsupported access mode '{raw}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadWrite => "readWrite",
            Self::ReadOnly => "readOnly",
        }
    }
}

/// Spec used to mount a NAS export on a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NasVolumeSpec {
    pub name: String,
    pub remote_hosts: Vec<String>,
    pub remote_path: String,
    #[serde(rename = "type")]
    pub nas_type: NasType,
    pub access_mode: AccessMode,
    #[serde(default)]
    pub security_type: Option<String>,
}

/// Per-host mount of a datastore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatastoreHostMount {
    /// Host managed-object ID
    pub host: String,
    pub access_mode: AccessMode,
    #[serde(default = "default_true")]
    pub mounted: bool,
    #[serde(default = "default_true")]
    pub accessible: bool,
}

fn default_true() -> bool { true }

/// NAS backing of a datastore.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NasVolumeInfo {
    pub remote_hosts: Vec<String>,
    pub remote_path: String,
    #[serde(default)]
    pub security_type: Option<String>,
    #[serde(default)]
    pub protocol_endpoint: Option<String>,
}

/// Datastore detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatastoreInfo {
    /// Managed-object ID (e.g. "datastore-17")
    pub datastore: String,
    pub name: String,
    #[serde(rename = "type")]
    pub ds_type: String,
    #[serde(default)]
    pub accessible: bool,
    #[serde(default)]
    pub capacity: u64,
    #[serde(default)]
    pub free_space: u64,
    #[serde(default)]
    pub uncommitted: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub maintenance_mode: String,
    #[serde(default)]
    pub multiple_host_access: bool,
    /// Inventory folder path the datastore lives in
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub datastore_cluster: Option<String>,
    #[serde(default)]
    pub nas: Option<NasVolumeInfo>,
    #[serde(default)]
    pub host_mounts: Vec<DatastoreHostMount>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Appliance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// DNS settings of the vCenter appliance.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DnsServerConfig {
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub servers: Vec<String>,
}
