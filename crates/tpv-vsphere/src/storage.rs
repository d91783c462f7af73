//! Host storage system and datastore operations via the REST API.

use crate::error::{VsphereError, VsphereErrorKind, VsphereResult};
use crate::host::{esx_host_path, not_found_as_missing_host};
use crate::types::*;
use crate::vsphere::VsphereClient;

use serde::{Deserialize, Serialize};

/// Storage-system and datastore operations.
pub struct StorageManager<'a> {
    client: &'a VsphereClient,
}

#[derive(Serialize)]
struct SoftwareIscsiSpec {
    enabled: bool,
}

#[derive(Serialize)]
struct IscsiNameSpec<'n> {
    iscsi_name: &'n str,
}

#[derive(Serialize)]
struct RenameSpec<'n> {
    name: &'n str,
}

#[derive(Serialize)]
struct MoveSpec<'f> {
    folder: &'f str,
}

#[derive(Deserialize)]
struct Created {
    datastore: String,
}

impl<'a> StorageManager<'a> {
    pub fn new(client: &'a VsphereClient) -> Self {
        Self { client }
    }

    // ── Storage system ──────────────────────────────────────────────

    pub async fn get_storage_device_info(&self, host_id: &str) -> VsphereResult<HostStorageDeviceInfo> {
        let path = format!("{}/storage/devices", esx_host_path(host_id));
        self.client
            .get::<HostStorageDeviceInfo>(&path)
            .await
            .map_err(|e| not_found_as_missing_host(e, host_id))
    }

    pub async fn set_software_iscsi(&self, host_id: &str, enabled: bool) -> VsphereResult<()> {
        let path = format!("{}/storage/iscsi/software", esx_host_path(host_id));
        self.client.patch(&path, &SoftwareIscsiSpec { enabled }).await
    }

    pub async fn rescan_all_hba(&self, host_id: &str) -> VsphereResult<()> {
        let path = format!("{}/storage/adapters?action=rescan", esx_host_path(host_id));
        self.client.post_empty(&path).await
    }

    pub async fn set_iscsi_name(&self, host_id: &str, device: &str, name: &str) -> VsphereResult<()> {
        let path = format!("{}/storage/adapters/{device}", esx_host_path(host_id));
        self.client.patch(&path, &IscsiNameSpec { iscsi_name: name }).await
    }

    // ── Datastores ──────────────────────────────────────────────────

    /// Mount a NAS export on a host; returns the datastore ID.
    pub async fn create_nas_datastore(&self, host_id: &str, spec: &NasVolumeSpec) -> VsphereResult<String> {
        let path = format!("{}/storage/nas", esx_host_path(host_id));
        let created: Created = self.client.post(&path, spec).await?;
        Ok(created.datastore)
    }

    /// Unmount a datastore from a host.
    pub async fn remove_datastore(&self, host_id: &str, datastore_id: &str) -> VsphereResult<()> {
        let path = format!("{}/storage/datastores/{datastore_id}", esx_host_path(host_id));
        self.client.delete(&path).await
    }

    /// Get details of a specific datastore.
    pub async fn get_datastore(&self, datastore_id: &str) -> VsphereResult<DatastoreInfo> {
        let path = format!("/api/vcenter/datastore/{datastore_id}");
        let mut info = self.client.get::<DatastoreInfo>(&path).await.map_err(|e| {
            if e.kind == VsphereErrorKind::NotFound {
                VsphereError::managed_object_not_found("Datastore", datastore_id)
            } else {
                e
            }
        })?;
        if info.datastore.is_empty() {
            info.datastore = datastore_id.to_string();
        }
        Ok(info)
    }

    pub async fn rename_datastore(&self, datastore_id: &str, name: &str) -> VsphereResult<()> {
        let path = format!("/api/vcenter/datastore/{datastore_id}");
        self.client.patch(&path, &RenameSpec { name }).await
    }

    /// Move a datastore into an inventory folder (or datastore cluster).
    pub async fn move_datastore(&self, datastore_id: &str, folder: &str) -> VsphereResult<()> {
        let path = format!("/api/vcenter/datastore/{datastore_id}?action=move");
        self.client.post_raw(&path, &MoveSpec { folder }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nas_spec_wire_format() {
        let spec = NasVolumeSpec {
            name: "nfs-01".into(),
            remote_hosts: vec!["filer.lab".into()],
            remote_path: "/export/vm".into(),
            nas_type: NasType::Nfs41,
            access_mode: AccessMode::ReadOnly,
            security_type: Some("AUTH_SYS".into()),
        };
        let v = serde_json::to_value(&spec).unwrap();
        assert_eq!(v["type"], "NFS41");
        assert_eq!(v["access_mode"], "readOnly");
    }

    #[test]
    fn datastore_info_defaults() {
        let raw = r#"{"datastore":"datastore-9","name":"nfs-01","type":"NFS"}"#;
        let info: DatastoreInfo = serde_json::from_str(raw).unwrap();
        assert!(info.host_mounts.is_empty());
        assert!(info.nas.is_none());
        assert_eq!(info.capacity, 0);
    }
}
