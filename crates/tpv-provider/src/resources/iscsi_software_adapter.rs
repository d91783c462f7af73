//! `vsphere_iscsi_software_adapter`: the software iSCSI initiator of a host.

use crate::error::{ProviderError, ProviderResult};
use crate::host;
use crate::resource::Resource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use async_trait::async_trait;
use tpv_vsphere::types::{HostBusAdapter, HostStorageDeviceInfo, HostSummary};
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_iscsi_software_adapter";

pub struct IscsiSoftwareAdapter;

pub(crate) fn schema(force_new: bool) -> Schema {
    host::selector_schema(force_new)
        .attr(
            "iscsi_name",
            Attribute::optional(ValueType::String)
                .with_computed()
                .describe("IQN of the adapter. Generated by the host when left blank."),
        )
        .attr(
            "adapter_id",
            Attribute::computed(ValueType::String).describe("Device name of the adapter, e.g. vmhba65."),
        )
}

async fn storage_info(api: &dyn VsphereApi, host: &HostSummary, op: &str) -> ProviderResult<HostStorageDeviceInfo> {
    api.storage_device_info(&host.host).await.map_err(|e| {
        ProviderError::api(
            format!("error retrieving host system storage properties on {op} for host '{}'", host.name),
            e,
        )
    })
}

fn software_adapter(info: &HostStorageDeviceInfo, host: &HostSummary) -> ProviderResult<HostBusAdapter> {
    info.software_iscsi_adapter()
        .cloned()
        .ok_or_else(|| ProviderError::not_found(format!("could not find iscsi software adapter for host '{}'", host.name)))
}

/// Refresh `iscsi_name` / `adapter_id` from the host.
///
/// A resource tolerates a disabled adapter; a data source does not.
pub(crate) async fn read_adapter(api: &dyn VsphereApi, d: &mut ResourceData, is_data_source: bool) -> ProviderResult<()> {
    let (host, ident) = host::resolve(api, d, "iscsi read").await?;
    let info = storage_info(api, &host, "read").await?;

    if info.software_internet_scsi_enabled {
        let adapter = software_adapter(&info, &host)?;
        d.set("iscsi_name", adapter.iscsi_name.clone());
        d.set("adapter_id", adapter.device.clone());
        if is_data_source {
            d.set_id(format!("{}:{}", ident.value, adapter.device));
        }
    } else if is_data_source {
        return Err(ProviderError::not_found(format!(
            "iscsi software adapter is not enabled for host '{}'",
            host.name
        )));
    }
    Ok(())
}

#[async_trait]
impl Resource for IscsiSoftwareAdapter {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        schema(true)
    }

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, ident) = host::resolve(api, d, "iscsi").await?;

        api.update_software_iscsi(&host.host, true).await.map_err(|e| {
            ProviderError::api(format!("error enabling software iscsi for host '{}'", host.name), e)
        })?;
        api.rescan_all_hba(&host.host).await.map_err(|e| {
            ProviderError::api(
                format!(
                    "error trying to rescan storage adapters after enabling iscsi software adapter for host '{}'",
                    host.name
                ),
                e,
            )
        })?;

        let info = storage_info(api, &host, "create").await?;
        let adapter = software_adapter(&info, &host)?;
        log::info!("Enabled software iSCSI adapter {} on host {}", adapter.device, host.name);

        d.set_id(format!("{}:{}", ident.value, adapter.device));
        d.set("adapter_id", adapter.device.clone());

        match d.get_ok("iscsi_name").and_then(|v| v.as_str()).map(str::to_string) {
            Some(name) => {
                api.update_iscsi_name(&host.host, &adapter.device, &name).await.map_err(|e| {
                    ProviderError::api(format!("error updating iscsi name for host '{}'", host.name), e)
                })?;
                d.set("iscsi_name", name);
            }
            None => d.set("iscsi_name", adapter.iscsi_name.clone()),
        }

        self.read(api, d).await
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_adapter(api, d, false).await
    }

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        if !d.has_change("iscsi_name") {
            return Ok(());
        }
        let (host, _) = host::resolve(api, d, "iscsi update").await?;
        let info = storage_info(api, &host, "update").await?;
        let adapter = software_adapter(&info, &host)?;

        let name = d.get_str("iscsi_name").to_string();
        api.update_iscsi_name(&host.host, &adapter.device, &name).await.map_err(|e| {
            ProviderError::api(format!("error updating iscsi software name on update for host '{}'", host.name), e)
        })
    }

    async fn delete(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (host, _) = host::resolve(api, d, "iscsi delete").await?;
        api.update_software_iscsi(&host.host, false).await.map_err(|e| {
            ProviderError::api(format!("error disabling software iscsi for host '{}'", host.name), e)
        })
    }

    async fn import(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let parts: Vec<&str> = d.id().split(':').collect();
        let [raw_host, _adapter] = parts.as_slice() else {
            return Err(ProviderError::import_format(
                "invalid import format. Format should be <host_system_id | hostname>:<adapter_name>",
            ));
        };
        let raw_host = raw_host.to_string();

        let (host, ident) = host::resolve_raw(api, &raw_host, "iscsi import").await?;
        let info = storage_info(api, &host, "import").await?;
        let adapter = software_adapter(&info, &host)?;

        d.set_id(format!("{}:{}", ident.value, adapter.device));
        host::record_identifier(d, &ident);
        Ok(())
    }
}
