//! In-memory vSphere endpoint.
//!
//! `SimulatedVsphere` implements [`VsphereApi`] over a small inventory of
//! datacenters, hosts, datastores and appliance settings. It backs the
//! test suites and lets the CLI run against a fake endpoint. Inventory
//! mutations that real operators perform out of band (re-adding a host,
//! duplicate hostnames, outages) are exposed as plain methods.

use crate::api::VsphereApi;
use crate::error::{VsphereError, VsphereErrorKind, VsphereResult};
use crate::types::*;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub const ESXI_DATACENTER: &str = HA_DATACENTER;
pub const ESXI_HOST: &str = "ha-host";

const SIM_CAPACITY: u64 = 1 << 40;
const SIM_FREE_SPACE: u64 = 1 << 39;

struct SimDatacenter {
    id: String,
    name: String,
    hosts: Vec<String>,
}

struct SimHost {
    summary: HostSummary,
    in_maintenance: bool,
    date_time: HostDateTimeInfo,
    options: BTreeMap<String, serde_json::Value>,
    snmp: HostSnmpConfig,
    storage: HostStorageDeviceInfo,
}

impl SimHost {
    fn new(id: &str, name: &str) -> Self {
        let mut options = BTreeMap::new();
        options.insert(SYSLOG_LOG_HOST_KEY.to_string(), serde_json::Value::from(""));
        options.insert(SYSLOG_LOG_LEVEL_KEY.to_string(), serde_json::Value::from("info"));
        Self {
            summary: HostSummary {
                host: id.to_string(),
                name: name.to_string(),
                connection_state: HostConnectionState::Connected,
            },
            in_maintenance: false,
            date_time: HostDateTimeInfo {
                ntp_servers: vec!["pool.ntp.org".to_string()],
                system_clock_protocol: "ntp".to_string(),
                disable_events: false,
                disable_fallback: false,
            },
            options,
            snmp: HostSnmpConfig::default(),
            storage: HostStorageDeviceInfo {
                software_internet_scsi_enabled: false,
                host_bus_adapters: vec![HostBusAdapter {
                    device: "vmhba0".to_string(),
                    kind: HostBusAdapterKind::BlockAdapter,
                    model: "PVSCSI SCSI Controller".to_string(),
                    is_software_based: false,
                    iscsi_name: String::new(),
                }],
            },
        }
    }
}

#[derive(Default)]
struct SimState {
    api_type: Option<ApiType>,
    datacenters: Vec<SimDatacenter>,
    hosts: BTreeMap<String, SimHost>,
    datastores: BTreeMap<String, DatastoreInfo>,
    datastore_clusters: HashSet<String>,
    tasks: HashMap<String, TaskInfo>,
    failing_tasks: HashSet<String>,
    inventory_fault: Option<VsphereError>,
    datacenter_faults: HashMap<String, VsphereError>,
    inventory_stalled: bool,
    dns: DnsServerConfig,
    legacy_appliance: bool,
    next_id: u64,
}

impl SimState {
    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn check_inventory(&self) -> VsphereResult<()> {
        match &self.inventory_fault {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn host(&self, host_id: &str) -> VsphereResult<&SimHost> {
        self.hosts
            .get(host_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("HostSystem", host_id))
    }

    fn host_mut(&mut self, host_id: &str) -> VsphereResult<&mut SimHost> {
        self.hosts
            .get_mut(host_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("HostSystem", host_id))
    }

    fn datastore_mut(&mut self, ds_id: &str) -> VsphereResult<&mut DatastoreInfo> {
        self.datastores
            .get_mut(ds_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("Datastore", ds_id))
    }

    fn finish_task(&mut self, host_id: &str, apply: impl FnOnce(&mut SimHost)) -> VsphereResult<String> {
        let failing = self.failing_tasks.contains(host_id);
        let host = self.host_mut(host_id)?;
        let status = if failing {
            TaskState::Failed
        } else {
            apply(host);
            TaskState::Succeeded
        };
        let task = self.next("task");
        let error = failing.then(|| serde_json::json!({"messages": ["host rejected the request"]}));
        let now = chrono::Utc::now();
        self.tasks.insert(
            task.clone(),
            TaskInfo { task: task.clone(), status, error, start_time: Some(now), end_time: Some(now) },
        );
        Ok(task)
    }
}

/// In-memory vSphere endpoint.
pub struct SimulatedVsphere {
    state: Mutex<SimState>,
}

impl SimulatedVsphere {
    /// An empty vCenter inventory.
    pub fn vcenter() -> Self {
        let state = SimState { api_type: Some(ApiType::VirtualCenter), ..Default::default() };
        Self { state: Mutex::new(state) }
    }

    /// A standalone ESXi endpoint with its single host.
    pub fn esxi(hostname: &str) -> Self {
        let mut state = SimState { api_type: Some(ApiType::HostAgent), ..Default::default() };
        state.datacenters.push(SimDatacenter {
            id: ESXI_DATACENTER.to_string(),
            name: ESXI_DATACENTER.to_string(),
            hosts: vec![ESXI_HOST.to_string()],
        });
        state.hosts.insert(ESXI_HOST.to_string(), SimHost::new(ESXI_HOST, hostname));
        Self { state: Mutex::new(state) }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Inventory mutation ──────────────────────────────────────────

    /// Add a datacenter; returns its ID.
    pub fn add_datacenter(&self, name: &str) -> String {
        let mut st = self.state();
        let id = st.next("datacenter");
        st.datacenters.push(SimDatacenter { id: id.clone(), name: name.to_string(), hosts: Vec::new() });
        id
    }

    /// Add a host to a datacenter; returns its ID.
    pub fn add_host(&self, datacenter: &str, hostname: &str) -> VsphereResult<String> {
        let mut st = self.state();
        let id = st.next("host");
        let dc = st
            .datacenters
            .iter_mut()
            .find(|dc| dc.id == datacenter)
            .ok_or_else(|| VsphereError::managed_object_not_found("Datacenter", datacenter))?;
        dc.hosts.push(id.clone());
        st.hosts.insert(id.clone(), SimHost::new(&id, hostname));
        Ok(id)
    }

    /// Remove a host from inventory, dropping its datastore mounts.
    pub fn remove_host(&self, host_id: &str) -> VsphereResult<()> {
        let mut st = self.state();
        st.hosts
            .remove(host_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("HostSystem", host_id))?;
        for dc in st.datacenters.iter_mut() {
            dc.hosts.retain(|h| h != host_id);
        }
        for ds in st.datastores.values_mut() {
            ds.host_mounts.retain(|m| m.host != host_id);
        }
        st.datastores.retain(|_, ds| !ds.host_mounts.is_empty());
        Ok(())
    }

    /// Remove and re-add a host, the way vCenter does after a reconnect:
    /// same name and configuration, fresh managed-object ID.
    pub fn readd_host(&self, host_id: &str) -> VsphereResult<String> {
        let mut st = self.state();
        let mut host = st
            .hosts
            .remove(host_id)
            .ok_or_else(|| VsphereError::managed_object_not_found("HostSystem", host_id))?;
        let new_id = st.next("host");
        host.summary.host = new_id.clone();
        for dc in st.datacenters.iter_mut() {
            for h in dc.hosts.iter_mut() {
                if h == host_id {
                    *h = new_id.clone();
                }
            }
        }
        for ds in st.datastores.values_mut() {
            for m in ds.host_mounts.iter_mut() {
                if m.host == host_id {
                    m.host = new_id.clone();
                }
            }
        }
        st.hosts.insert(new_id.clone(), host);
        Ok(new_id)
    }

    pub fn add_datastore_cluster(&self) -> String {
        let mut st = self.state();
        let id = st.next("group-p");
        st.datastore_clusters.insert(id.clone());
        id
    }

    pub fn set_connection_state(&self, host_id: &str, state: HostConnectionState) -> VsphereResult<()> {
        self.state().host_mut(host_id)?.summary.connection_state = state;
        Ok(())
    }

    pub fn set_date_time(&self, host_id: &str, info: HostDateTimeInfo) -> VsphereResult<()> {
        self.state().host_mut(host_id)?.date_time = info;
        Ok(())
    }

    /// Make every inventory listing fail with `fault` until cleared.
    pub fn set_inventory_fault(&self, fault: Option<VsphereError>) {
        self.state().inventory_fault = fault;
    }

    /// Make host listings of one datacenter fail with `fault` until cleared.
    pub fn set_datacenter_fault(&self, datacenter: &str, fault: Option<VsphereError>) {
        let mut st = self.state();
        match fault {
            Some(e) => st.datacenter_faults.insert(datacenter.to_string(), e),
            None => st.datacenter_faults.remove(datacenter),
        };
    }

    /// Inventory lookups never answer while stalled.
    pub fn stall_inventory(&self, stalled: bool) {
        self.state().inventory_stalled = stalled;
    }

    async fn wait_if_stalled(&self) {
        let stalled = self.state().inventory_stalled;
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    /// Maintenance-mode tasks for this host finish in the failed state.
    pub fn fail_tasks_for(&self, host_id: &str) {
        self.state().failing_tasks.insert(host_id.to_string());
    }

    /// Legacy appliances only accept the `config`-wrapped DNS body.
    pub fn set_legacy_appliance(&self, legacy: bool) {
        self.state().legacy_appliance = legacy;
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn advanced_option(&self, host_id: &str, key: &str) -> Option<serde_json::Value> {
        self.state().hosts.get(host_id).and_then(|h| h.options.get(key).cloned())
    }

    pub fn snmp(&self, host_id: &str) -> Option<HostSnmpConfig> {
        self.state().hosts.get(host_id).map(|h| h.snmp.clone())
    }

    pub fn storage(&self, host_id: &str) -> Option<HostStorageDeviceInfo> {
        self.state().hosts.get(host_id).map(|h| h.storage.clone())
    }

    pub fn in_maintenance(&self, host_id: &str) -> Option<bool> {
        self.state().hosts.get(host_id).map(|h| h.in_maintenance)
    }

    pub fn datastore_ids(&self) -> Vec<String> {
        self.state().datastores.keys().cloned().collect()
    }

    pub fn dns(&self) -> DnsServerConfig {
        self.state().dns.clone()
    }
}

fn bad_request(msg: impl Into<String>) -> VsphereError {
    VsphereError::api(400, msg)
}

fn parse_dns_body(body: &serde_json::Value) -> VsphereResult<DnsServerConfig> {
    let cfg: DnsServerConfig = serde_json::from_value(body.clone())?;
    if cfg.mode.is_empty() {
        return Err(bad_request("dns config requires a mode"));
    }
    Ok(cfg)
}

#[async_trait]
impl VsphereApi for SimulatedVsphere {
    async fn api_type(&self) -> VsphereResult<ApiType> {
        self.state()
            .api_type
            .ok_or_else(|| VsphereError::new(VsphereErrorKind::UnsupportedApiType, "unknown endpoint type"))
    }

    async fn list_datacenters(&self) -> VsphereResult<Vec<DatacenterSummary>> {
        self.wait_if_stalled().await;
        let st = self.state();
        st.check_inventory()?;
        Ok(st
            .datacenters
            .iter()
            .map(|dc| DatacenterSummary { datacenter: dc.id.clone(), name: dc.name.clone() })
            .collect())
    }

    async fn list_hosts_in_datacenter(&self, datacenter: &str) -> VsphereResult<Vec<HostSummary>> {
        self.wait_if_stalled().await;
        let st = self.state();
        st.check_inventory()?;
        if let Some(e) = st.datacenter_faults.get(datacenter) {
            return Err(e.clone());
        }
        let dc = st
            .datacenters
            .iter()
            .find(|dc| dc.id == datacenter)
            .ok_or_else(|| VsphereError::managed_object_not_found("Datacenter", datacenter))?;
        Ok(dc
            .hosts
            .iter()
            .filter_map(|id| st.hosts.get(id))
            .map(|h| h.summary.clone())
            .collect())
    }

    async fn host_by_id(&self, host_id: &str) -> VsphereResult<HostSummary> {
        self.wait_if_stalled().await;
        let st = self.state();
        st.check_inventory()?;
        Ok(st.host(host_id)?.summary.clone())
    }

    async fn host_runtime(&self, host_id: &str) -> VsphereResult<HostRuntimeInfo> {
        let st = self.state();
        let host = st.host(host_id)?;
        Ok(HostRuntimeInfo {
            connection_state: host.summary.connection_state,
            in_maintenance_mode: host.in_maintenance,
        })
    }

    async fn enter_maintenance_mode(
        &self,
        host_id: &str,
        _timeout_secs: u64,
        _evacuate: bool,
    ) -> VsphereResult<String> {
        self.state().finish_task(host_id, |h| h.in_maintenance = true)
    }

    async fn exit_maintenance_mode(&self, host_id: &str, _timeout_secs: u64) -> VsphereResult<String> {
        self.state().finish_task(host_id, |h| h.in_maintenance = false)
    }

    async fn wait_for_task(&self, task: &str, _timeout: Duration) -> VsphereResult<TaskInfo> {
        self.state()
            .tasks
            .get(task)
            .cloned()
            .ok_or_else(|| VsphereError::managed_object_not_found("Task", task))
    }

    async fn date_time_info(&self, host_id: &str) -> VsphereResult<HostDateTimeInfo> {
        Ok(self.state().host(host_id)?.date_time.clone())
    }

    async fn advanced_options(&self, host_id: &str, prefix: &str) -> VsphereResult<Vec<OptionValue>> {
        let st = self.state();
        Ok(st
            .host(host_id)?
            .options
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| OptionValue::new(k.clone(), v.clone()))
            .collect())
    }

    async fn update_advanced_options(&self, host_id: &str, options: &[OptionValue]) -> VsphereResult<()> {
        let mut st = self.state();
        let host = st.host_mut(host_id)?;
        if let Some(unknown) = options.iter().find(|o| !host.options.contains_key(&o.key)) {
            return Err(VsphereError::invalid_argument(format!(
                "A specified parameter was not correct: {}",
                unknown.key
            )));
        }
        for o in options {
            host.options.insert(o.key.clone(), o.value.clone());
        }
        Ok(())
    }

    async fn snmp_config(&self, host_id: &str) -> VsphereResult<HostSnmpConfig> {
        Ok(self.state().host(host_id)?.snmp.clone())
    }

    async fn reconfigure_snmp(&self, host_id: &str, config: &HostSnmpConfig) -> VsphereResult<()> {
        if config.port == 0 {
            return Err(bad_request("snmp port must be non-zero"));
        }
        self.state().host_mut(host_id)?.snmp = config.clone();
        Ok(())
    }

    async fn reset_snmp(&self, host_id: &str) -> VsphereResult<()> {
        self.state().host_mut(host_id)?.snmp = HostSnmpConfig::default();
        Ok(())
    }

    async fn storage_device_info(&self, host_id: &str) -> VsphereResult<HostStorageDeviceInfo> {
        Ok(self.state().host(host_id)?.storage.clone())
    }

    async fn update_software_iscsi(&self, host_id: &str, enabled: bool) -> VsphereResult<()> {
        let mut st = self.state();
        let host = st.host_mut(host_id)?;
        let storage = &mut host.storage;
        storage.software_internet_scsi_enabled = enabled;
        if enabled {
            if storage.software_iscsi_adapter().is_none() {
                let device = format!("vmhba{}", 64 + storage.host_bus_adapters.len());
                let short = host.summary.name.split('.').next().unwrap_or_default().to_string();
                storage.host_bus_adapters.push(HostBusAdapter {
                    device,
                    kind: HostBusAdapterKind::InternetScsi,
                    model: "iSCSI Software Adapter".to_string(),
                    is_software_based: true,
                    iscsi_name: format!("iqn.1998-01.com.vmware:{short}-{host_id}"),
                });
            }
        } else {
            storage
                .host_bus_adapters
                .retain(|hba| !(hba.kind == HostBusAdapterKind::InternetScsi && hba.is_software_based));
        }
        Ok(())
    }

    async fn rescan_all_hba(&self, host_id: &str) -> VsphereResult<()> {
        self.state().host(host_id)?;
        Ok(())
    }

    async fn update_iscsi_name(&self, host_id: &str, device: &str, name: &str) -> VsphereResult<()> {
        if !(name.starts_with("iqn.") || name.starts_with("eui.")) {
            return Err(VsphereError::invalid_argument(format!("'{name}' is not a valid iSCSI name")));
        }
        let mut st = self.state();
        let host = st.host_mut(host_id)?;
        let hba = host
            .storage
            .host_bus_adapters
            .iter_mut()
            .find(|hba| hba.device == device && hba.kind == HostBusAdapterKind::InternetScsi)
            .ok_or_else(|| VsphereError::not_found(format!("no iSCSI adapter '{device}' on host {host_id}")))?;
        hba.iscsi_name = name.to_string();
        Ok(())
    }

    async fn create_nas_datastore(&self, host_id: &str, spec: &NasVolumeSpec) -> VsphereResult<String> {
        let mut st = self.state();
        st.host(host_id)?;

        let existing = st
            .datastores
            .values()
            .find(|ds| {
                ds.nas
                    .as_ref()
                    .map(|n| n.remote_hosts == spec.remote_hosts && n.remote_path == spec.remote_path)
                    .unwrap_or(false)
            })
            .map(|ds| ds.datastore.clone());

        if let Some(ds_id) = existing {
            let ds = st.datastore_mut(&ds_id)?;
            if ds.host_mounts.iter().any(|m| m.host == host_id) {
                return Err(bad_request(format!("datastore '{}' is already mounted on {host_id}", ds.name)));
            }
            ds.host_mounts.push(DatastoreHostMount {
                host: host_id.to_string(),
                access_mode: spec.access_mode,
                mounted: true,
                accessible: true,
            });
            return Ok(ds_id);
        }

        if st.datastores.values().any(|ds| ds.name == spec.name) {
            return Err(bad_request(format!("The name '{}' already exists.", spec.name)));
        }

        let ds_id = st.next("datastore");
        let info = DatastoreInfo {
            datastore: ds_id.clone(),
            name: spec.name.clone(),
            ds_type: spec.nas_type.as_str().to_string(),
            accessible: true,
            capacity: SIM_CAPACITY,
            free_space: SIM_FREE_SPACE,
            uncommitted: 0,
            url: format!("ds:///vmfs/volumes/{ds_id}/"),
            maintenance_mode: "normal".to_string(),
            multiple_host_access: false,
            folder: String::new(),
            datastore_cluster: None,
            nas: Some(NasVolumeInfo {
                remote_hosts: spec.remote_hosts.clone(),
                remote_path: spec.remote_path.clone(),
                security_type: spec.security_type.clone(),
                protocol_endpoint: None,
            }),
            host_mounts: vec![DatastoreHostMount {
                host: host_id.to_string(),
                access_mode: spec.access_mode,
                mounted: true,
                accessible: true,
            }],
        };
        st.datastores.insert(ds_id.clone(), info);
        Ok(ds_id)
    }

    async fn remove_datastore(&self, host_id: &str, datastore_id: &str) -> VsphereResult<()> {
        let mut st = self.state();
        st.host(host_id)?;
        let ds = st.datastore_mut(datastore_id)?;
        let before = ds.host_mounts.len();
        ds.host_mounts.retain(|m| m.host != host_id);
        if ds.host_mounts.len() == before {
            return Err(bad_request(format!("datastore {datastore_id} is not mounted on {host_id}")));
        }
        if ds.host_mounts.is_empty() {
            st.datastores.remove(datastore_id);
        }
        Ok(())
    }

    async fn datastore_info(&self, datastore_id: &str) -> VsphereResult<DatastoreInfo> {
        let mut st = self.state();
        let mut info = st.datastore_mut(datastore_id)?.clone();
        info.multiple_host_access = info.host_mounts.len() > 1;
        info.accessible = info.host_mounts.iter().any(|m| m.accessible);
        Ok(info)
    }

    async fn rename_datastore(&self, datastore_id: &str, name: &str) -> VsphereResult<()> {
        let mut st = self.state();
        if st.datastores.values().any(|ds| ds.name == name && ds.datastore != datastore_id) {
            return Err(bad_request(format!("The name '{name}' already exists.")));
        }
        st.datastore_mut(datastore_id)?.name = name.to_string();
        Ok(())
    }

    async fn move_datastore(&self, datastore_id: &str, folder: &str) -> VsphereResult<()> {
        let mut st = self.state();
        let is_cluster = st.datastore_clusters.contains(folder);
        if folder.starts_with("group-p") && !is_cluster {
            return Err(VsphereError::managed_object_not_found("StoragePod", folder));
        }
        let ds = st.datastore_mut(datastore_id)?;
        if is_cluster {
            ds.datastore_cluster = Some(folder.to_string());
            ds.folder = String::new();
        } else {
            ds.datastore_cluster = None;
            ds.folder = folder.to_string();
        }
        Ok(())
    }

    async fn dns_servers(&self) -> VsphereResult<DnsServerConfig> {
        Ok(self.state().dns.clone())
    }

    async fn put_dns_servers(&self, body: &serde_json::Value) -> VsphereResult<()> {
        let mut st = self.state();
        let wrapped = body.get("config");
        let cfg = match (wrapped, st.legacy_appliance) {
            (Some(inner), true) => parse_dns_body(inner)?,
            (None, false) => parse_dns_body(body)?,
            _ => return Err(bad_request("Invalid input: unexpected DNS configuration payload")),
        };
        st.dns = cfg;
        Ok(())
    }
}
