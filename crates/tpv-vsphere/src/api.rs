//! The operations the provider needs from a vSphere endpoint.
//!
//! `VsphereApi` is implemented by the REST client and by the in-memory
//! simulator, so resource logic never depends on a concrete transport.

use crate::appliance::ApplianceManager;
use crate::error::VsphereResult;
use crate::host::HostManager;
use crate::storage::StorageManager;
use crate::types::*;
use crate::vsphere::VsphereClient;

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait VsphereApi: Send + Sync {
    // ── Inventory ───────────────────────────────────────────────────

    async fn api_type(&self) -> VsphereResult<ApiType>;

    async fn list_datacenters(&self) -> VsphereResult<Vec<DatacenterSummary>>;

    async fn list_hosts_in_datacenter(&self, datacenter: &str) -> VsphereResult<Vec<HostSummary>>;

    /// Fails with `ManagedObjectNotFound` when no host has this ID.
    async fn host_by_id(&self, host_id: &str) -> VsphereResult<HostSummary>;

    async fn host_runtime(&self, host_id: &str) -> VsphereResult<HostRuntimeInfo>;

    // ── Maintenance / tasks ─────────────────────────────────────────

    /// Start the task; returns its ID.
    async fn enter_maintenance_mode(
        &self,
        host_id: &str,
        timeout_secs: u64,
        evacuate: bool,
    ) -> VsphereResult<String>;

    async fn exit_maintenance_mode(&self, host_id: &str, timeout_secs: u64) -> VsphereResult<String>;

    async fn wait_for_task(&self, task: &str, timeout: Duration) -> VsphereResult<TaskInfo>;

    // ── Host configuration ──────────────────────────────────────────

    async fn date_time_info(&self, host_id: &str) -> VsphereResult<HostDateTimeInfo>;

    async fn advanced_options(&self, host_id: &str, prefix: &str) -> VsphereResult<Vec<OptionValue>>;

    async fn update_advanced_options(&self, host_id: &str, options: &[OptionValue]) -> VsphereResult<()>;

    async fn snmp_config(&self, host_id: &str) -> VsphereResult<HostSnmpConfig>;

    async fn reconfigure_snmp(&self, host_id: &str, config: &HostSnmpConfig) -> VsphereResult<()>;

    async fn reset_snmp(&self, host_id: &str) -> VsphereResult<()>;

    // ── Storage ─────────────────────────────────────────────────────

    async fn storage_device_info(&self, host_id: &str) -> VsphereResult<HostStorageDeviceInfo>;

    async fn update_software_iscsi(&self, host_id: &str, enabled: bool) -> VsphereResult<()>;

    async fn rescan_all_hba(&self, host_id: &str) -> VsphereResult<()>;

    async fn update_iscsi_name(&self, host_id: &str, device: &str, name: &str) -> VsphereResult<()>;

    /// Mount a NAS export on a host. Mounting an export that already backs
    /// a datastore joins that datastore. Returns the datastore ID.
    async fn create_nas_datastore(&self, host_id: &str, spec: &NasVolumeSpec) -> VsphereResult<String>;

    async fn remove_datastore(&self, host_id: &str, datastore_id: &str) -> VsphereResult<()>;

    /// Fails with `ManagedObjectNotFound` when no datastore has this ID.
    async fn datastore_info(&self, datastore_id: &str) -> VsphereResult<DatastoreInfo>;

    async fn rename_datastore(&self, datastore_id: &str, name: &str) -> VsphereResult<()>;

    async fn move_datastore(&self, datastore_id: &str, folder: &str) -> VsphereResult<()>;

    // ── Appliance ───────────────────────────────────────────────────

    async fn dns_servers(&self) -> VsphereResult<DnsServerConfig>;

    async fn put_dns_servers(&self, body: &serde_json::Value) -> VsphereResult<()>;
}

#[async_trait]
impl VsphereApi for VsphereClient {
    async fn api_type(&self) -> VsphereResult<ApiType> {
        self.detect_api_type().await
    }

    async fn list_datacenters(&self) -> VsphereResult<Vec<DatacenterSummary>> {
        let api_type = self.detect_api_type().await?;
        HostManager::new(self).list_datacenters(api_type).await
    }

    async fn list_hosts_in_datacenter(&self, datacenter: &str) -> VsphereResult<Vec<HostSummary>> {
        let api_type = self.detect_api_type().await?;
        HostManager::new(self).list_hosts_in_datacenter(api_type, datacenter).await
    }

    async fn host_by_id(&self, host_id: &str) -> VsphereResult<HostSummary> {
        let api_type = self.detect_api_type().await?;
        HostManager::new(self).get_host(api_type, host_id).await
    }

    async fn host_runtime(&self, host_id: &str) -> VsphereResult<HostRuntimeInfo> {
        HostManager::new(self).get_runtime(host_id).await
    }

    async fn enter_maintenance_mode(
        &self,
        host_id: &str,
        timeout_secs: u64,
        evacuate: bool,
    ) -> VsphereResult<String> {
        HostManager::new(self)
            .enter_maintenance_mode(host_id, timeout_secs, evacuate)
            .await
    }

    async fn exit_maintenance_mode(&self, host_id: &str, timeout_secs: u64) -> VsphereResult<String> {
        HostManager::new(self).exit_maintenance_mode(host_id, timeout_secs).await
    }

    async fn wait_for_task(&self, task: &str, timeout: Duration) -> VsphereResult<TaskInfo> {
        VsphereClient::wait_for_task(self, task, timeout).await
    }

    async fn date_time_info(&self, host_id: &str) -> VsphereResult<HostDateTimeInfo> {
        HostManager::new(self).get_date_time(host_id).await
    }

    async fn advanced_options(&self, host_id: &str, prefix: &str) -> VsphereResult<Vec<OptionValue>> {
        HostManager::new(self).get_advanced_options(host_id, prefix).await
    }

    async fn update_advanced_options(&self, host_id: &str, options: &[OptionValue]) -> VsphereResult<()> {
        HostManager::new(self).update_advanced_options(host_id, options).await
    }

    async fn snmp_config(&self, host_id: &str) -> VsphereResult<HostSnmpConfig> {
        HostManager::new(self).get_snmp(host_id).await
    }

    async fn reconfigure_snmp(&self, host_id: &str, config: &HostSnmpConfig) -> VsphereResult<()> {
        HostManager::new(self).set_snmp(host_id, config).await
    }

    async fn reset_snmp(&self, host_id: &str) -> VsphereResult<()> {
        HostManager::new(self).reset_snmp(host_id).await
    }

    async fn storage_device_info(&self, host_id: &str) -> VsphereResult<HostStorageDeviceInfo> {
        StorageManager::new(self).get_storage_device_info(host_id).await
    }

    async fn update_software_iscsi(&self, host_id: &str, enabled: bool) -> VsphereResult<()> {
        StorageManager::new(self).set_software_iscsi(host_id, enabled).await
    }

    async fn rescan_all_hba(&self, host_id: &str) -> VsphereResult<()> {
        StorageManager::new(self).rescan_all_hba(host_id).await
    }

    async fn update_iscsi_name(&self, host_id: &str, device: &str, name: &str) -> VsphereResult<()> {
        StorageManager::new(self).set_iscsi_name(host_id, device, name).await
    }

    async fn create_nas_datastore(&self, host_id: &str, spec: &NasVolumeSpec) -> VsphereResult<String> {
        StorageManager::new(self).create_nas_datastore(host_id, spec).await
    }

    async fn remove_datastore(&self, host_id: &str, datastore_id: &str) -> VsphereResult<()> {
        StorageManager::new(self).remove_datastore(host_id, datastore_id).await
    }

    async fn datastore_info(&self, datastore_id: &str) -> VsphereResult<DatastoreInfo> {
        StorageManager::new(self).get_datastore(datastore_id).await
    }

    async fn rename_datastore(&self, datastore_id: &str, name: &str) -> VsphereResult<()> {
        StorageManager::new(self).rename_datastore(datastore_id, name).await
    }

    async fn move_datastore(&self, datastore_id: &str, folder: &str) -> VsphereResult<()> {
        StorageManager::new(self).move_datastore(datastore_id, folder).await
    }

    async fn dns_servers(&self) -> VsphereResult<DnsServerConfig> {
        ApplianceManager::new(self).get_dns_servers().await
    }

    async fn put_dns_servers(&self, body: &serde_json::Value) -> VsphereResult<()> {
        ApplianceManager::new(self).put_dns_servers(body).await
    }
}
