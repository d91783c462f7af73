//! `vsphere_nas_datastore`: an NFS export mounted as a datastore on one or
//! more hosts.
//!
//! Hosts are listed either by managed-object ID (`host_system_ids`) or by
//! hostname (`hostnames`). Mount changes go through [`MountProcessor`],
//! which unmounts removed hosts before mounting added ones.

use crate::error::{ProviderError, ProviderErrorKind, ProviderResult};
use crate::host;
use crate::resource::Resource;
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};
use crate::structure::{diff_string_sets, folder_path_is_empty, normalize_folder_path};

use async_trait::async_trait;
use tpv_vsphere::hostsystem;
use tpv_vsphere::types::{is_nas_volume, AccessMode, ApiType, DatastoreInfo, NasType, NasVolumeSpec};
use tpv_vsphere::VsphereApi;

pub const TYPE_NAME: &str = "vsphere_nas_datastore";

const HOST_SYSTEM_IDS: &str = "host_system_ids";
const HOSTNAMES: &str = "hostnames";
const SECURITY_TYPES: [&str; 3] = ["AUTH_SYS", "SEC_KRB5", "SEC_KRB5I"];

pub struct NasDatastore;

fn nas_volume_schema() -> Schema {
    Schema::new()
        .attr(
            "access_mode",
            Attribute::optional(ValueType::String)
                .default_value(AccessMode::ReadWrite.as_str())
                .force_new()
                .describe("Access mode for the mount point. Can be one of readOnly or readWrite."),
        )
        .attr(
            "remote_hosts",
            Attribute::required(ValueType::StringList)
                .force_new()
                .describe("The hostnames or IP addresses of the remote server or servers."),
        )
        .attr(
            "remote_path",
            Attribute::required(ValueType::String)
                .force_new()
                .describe("The remote path of the mount point."),
        )
        .attr(
            "security_type",
            Attribute::optional(ValueType::String)
                .force_new()
                .describe("The security type to use. Only valid for NFS41."),
        )
        .attr(
            "type",
            Attribute::optional(ValueType::String)
                .default_value(NasType::Nfs.as_str())
                .force_new()
                .describe("The type of NAS volume. Can be one of NFS (v3) or NFS41 (v4.1)."),
        )
        .attr("protocol_endpoint", Attribute::computed(ValueType::String))
}

fn datastore_summary_schema() -> Schema {
    Schema::new()
        .attr("accessible", Attribute::computed(ValueType::Bool))
        .attr("capacity", Attribute::computed(ValueType::Int))
        .attr("free_space", Attribute::computed(ValueType::Int))
        .attr("maintenance_mode", Attribute::computed(ValueType::String))
        .attr("multiple_host_access", Attribute::computed(ValueType::Bool))
        .attr("uncommitted_space", Attribute::computed(ValueType::Int))
        .attr("url", Attribute::computed(ValueType::String))
}

fn expand_volume_spec(d: &ResourceData) -> ProviderResult<NasVolumeSpec> {
    let nas_type = match NasType::parse(d.get_str("type")) {
        Ok(t @ (NasType::Nfs | NasType::Nfs41)) => t,
        _ => {
            return Err(ProviderError::validation(format!(
                "'type' must be one of NFS, NFS41, got '{}'",
                d.get_str("type")
            )))
        }
    };
    let access_mode = AccessMode::parse(d.get_str("access_mode"))
        .map_err(|e| ProviderError::validation(e.message))?;

    let security_type = match d.get_str("security_type") {
        "" => None,
        s if !SECURITY_TYPES.contains(&s) => {
            return Err(ProviderError::validation(format!(
                "'security_type' must be one of {}, got '{s}'",
                SECURITY_TYPES.join(", ")
            )))
        }
        s if nas_type != NasType::Nfs41 => {
            return Err(ProviderError::validation(format!("'security_type' {s} is only valid for NFS41")))
        }
        s => Some(s.to_string()),
    };

    Ok(NasVolumeSpec {
        name: d.get_str("name").to_string(),
        remote_hosts: d.get_string_list("remote_hosts"),
        remote_path: d.get_str("remote_path").to_string(),
        nas_type,
        access_mode,
        security_type,
    })
}

/// The host attribute this instance is configured with.
fn host_attribute(d: &ResourceData) -> &'static str {
    if d.get_ok(HOST_SYSTEM_IDS).is_some() {
        HOST_SYSTEM_IDS
    } else {
        HOSTNAMES
    }
}

// ── Mount processing ────────────────────────────────────────────────────

/// Reconciles the set of hosts a NAS datastore is mounted on.
pub struct MountProcessor<'a> {
    api: &'a dyn VsphereApi,
    old_hosts: Vec<String>,
    new_hosts: Vec<String>,
    spec: NasVolumeSpec,
    datastore: Option<String>,
}

impl<'a> MountProcessor<'a> {
    pub fn new(
        api: &'a dyn VsphereApi,
        old_hosts: Vec<String>,
        new_hosts: Vec<String>,
        spec: NasVolumeSpec,
        datastore: Option<String>,
    ) -> Self {
        Self { api, old_hosts, new_hosts, spec, datastore }
    }

    pub fn datastore(&self) -> Option<&str> {
        self.datastore.as_deref()
    }

    /// Mount on every added host. The first mount creates the datastore;
    /// each later mount has to land on that same datastore.
    pub async fn process_mounts(&mut self) -> ProviderResult<()> {
        let (added, _) = diff_string_sets(&self.old_hosts, &self.new_hosts);
        for raw in added {
            let (host, _) = host::resolve_raw(self.api, &raw, "datastore mount").await?;
            log::debug!("Mounting NAS datastore {:?} on host {}", self.spec.name, host.name);
            let ds_id = self
                .api
                .create_nas_datastore(&host.host, &self.spec)
                .await
                .map_err(|e| ProviderError::api(format!("error mounting datastore on host {}", host.name), e))?;
            if let Some(expected) = &self.datastore {
                if *expected != ds_id {
                    return Err(ProviderError::validation(format!(
                        "datastore ID mismatch when mounting datastore on host {}: expected ID {expected}, got ID {ds_id}. \
                         Please check existing datastores on the host for duplicate NAS mounts",
                        host.name
                    )));
                }
            } else {
                self.datastore = Some(ds_id);
            }
        }
        Ok(())
    }

    /// Unmount from every removed host.
    pub async fn process_unmounts(&mut self) -> ProviderResult<()> {
        let (_, removed) = diff_string_sets(&self.old_hosts, &self.new_hosts);
        let Some(ds_id) = self.datastore.clone() else {
            return Ok(());
        };
        for raw in removed {
            let (host, _) = host::resolve_raw(self.api, &raw, "datastore unmount").await?;
            log::debug!("Unmounting datastore {ds_id} from host {}", host.name);
            self.api
                .remove_datastore(&host.host, &ds_id)
                .await
                .map_err(|e| ProviderError::api(format!("error unmounting datastore from host {}", host.name), e))?;
        }
        Ok(())
    }
}

// ── Folder / datastore cluster placement ────────────────────────────────

async fn folder_or_cluster_path(api: &dyn VsphereApi, d: &ResourceData) -> ProviderResult<String> {
    let cluster = d.get_str("datastore_cluster_id");
    if cluster.is_empty() {
        return Ok(normalize_folder_path(d.get_str("folder")));
    }
    match api.api_type().await {
        Ok(ApiType::VirtualCenter) => Ok(cluster.to_string()),
        Ok(ApiType::HostAgent) => Err(ProviderError::unsupported(
            "datastore clusters can only be used when connected to vCenter",
        )),
        Err(e) => Err(ProviderError::api("error checking endpoint type", e)),
    }
}

fn flatten_placement(d: &mut ResourceData, info: &DatastoreInfo) {
    match &info.datastore_cluster {
        Some(cluster) => {
            d.set("datastore_cluster_id", cluster.clone());
            d.remove("folder");
        }
        None => {
            d.remove("datastore_cluster_id");
            let folder = normalize_folder_path(&info.folder);
            if folder.is_empty() {
                d.remove("folder");
            } else {
                d.set("folder", folder);
            }
        }
    }
}

fn flatten_summary(d: &mut ResourceData, info: &DatastoreInfo) {
    d.set("name", info.name.clone());
    d.set("accessible", info.accessible);
    d.set("capacity", info.capacity);
    d.set("free_space", info.free_space);
    d.set("maintenance_mode", info.maintenance_mode.clone());
    d.set("multiple_host_access", info.multiple_host_access);
    d.set("uncommitted_space", info.uncommitted);
    d.set("url", info.url.clone());
}

fn flatten_nas_volume(d: &mut ResourceData, info: &DatastoreInfo) -> ProviderResult<()> {
    let nas = info
        .nas
        .as_ref()
        .ok_or_else(|| ProviderError::validation(format!("datastore {} has no NAS backing", info.datastore)))?;
    d.set("remote_hosts", nas.remote_hosts.clone());
    d.set("remote_path", nas.remote_path.clone());
    match &nas.security_type {
        Some(s) => d.set("security_type", s.clone()),
        None => d.remove("security_type"),
    }
    match &nas.protocol_endpoint {
        Some(p) => d.set("protocol_endpoint", p.clone()),
        None => d.remove("protocol_endpoint"),
    }
    Ok(())
}

async fn datastore_from_id(api: &dyn VsphereApi, id: &str) -> ProviderResult<DatastoreInfo> {
    api.datastore_info(id).await.map_err(|e| {
        let kind = if e.is_managed_object_not_found() { ProviderErrorKind::NotFound } else { ProviderErrorKind::Api };
        ProviderError { kind, ..ProviderError::api("cannot find datastore", e) }
    })
}

#[async_trait]
impl Resource for NasDatastore {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .attr("name", Attribute::required(ValueType::String).describe("The name of the datastore."))
            .attr(
                HOST_SYSTEM_IDS,
                Attribute::optional(ValueType::StringSet)
                    .exactly_one_of(&[HOSTNAMES])
                    .describe("The managed object IDs of the hosts to mount the datastore on."),
            )
            .attr(
                HOSTNAMES,
                Attribute::optional(ValueType::StringSet).describe("The hostnames of the hosts to mount the datastore on."),
            )
            .attr(
                "folder",
                Attribute::optional(ValueType::String)
                    .conflicts_with(&["datastore_cluster_id"])
                    .state_func(normalize_folder_path)
                    .describe("The path to the datastore folder to put the datastore in."),
            )
            .attr(
                "datastore_cluster_id",
                Attribute::optional(ValueType::String)
                    .conflicts_with(&["folder"])
                    .describe("The managed object ID of the datastore cluster to place the datastore in."),
            )
            .merge(nas_volume_schema())
            .merge(datastore_summary_schema())
    }

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let hosts = d.get_string_set(host_attribute(d));
        let spec = expand_volume_spec(d)?;
        let path = folder_or_cluster_path(api, d).await?;

        let mut p = MountProcessor::new(api, Vec::new(), hosts, spec, None);
        let mounted = p.process_mounts().await;
        if let Some(id) = p.datastore() {
            d.set_id(id);
        }
        mounted.map_err(|e| ProviderError { message: format!("error mounting datastore: {}", e.message), ..e })?;

        if !folder_path_is_empty(&path) {
            api.move_datastore(d.id(), &path)
                .await
                .map_err(|e| ProviderError::api("error moving datastore to folder", e))?;
        }

        self.read(api, d).await
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let info = match datastore_from_id(api, d.id()).await {
            Ok(info) => info,
            Err(e) if e.kind == ProviderErrorKind::NotFound => {
                log::warn!("Datastore {} no longer exists, removing from state", d.id());
                d.set_id("");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        flatten_summary(d, &info);
        flatten_placement(d, &info);
        flatten_nas_volume(d, &info)?;

        let attr = host_attribute(d);
        let mut mounted = Vec::with_capacity(info.host_mounts.len());
        for mount in &info.host_mounts {
            if attr == HOST_SYSTEM_IDS {
                mounted.push(mount.host.clone());
            } else {
                let (host, _) = hostsystem::check_if_hostname_or_id(api, &mount.host)
                    .await
                    .map_err(|e| ProviderError::api("error finding host for datastore", e))?;
                mounted.push(host.name);
            }
        }
        d.set_string_set(attr, mounted);
        Ok(())
    }

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let info = datastore_from_id(api, d.id()).await?;

        if d.has_change("name") {
            api.rename_datastore(&info.datastore, d.get_str("name"))
                .await
                .map_err(|e| ProviderError::api("error renaming datastore", e))?;
        }

        if d.has_change("folder") || d.has_change("datastore_cluster_id") {
            let path = folder_or_cluster_path(api, d).await?;
            api.move_datastore(&info.datastore, &path)
                .await
                .map_err(|e| ProviderError::api(format!("could not move datastore to folder {path:?}"), e))?;
        }

        let attr = host_attribute(d);
        let spec = expand_volume_spec(d)?;
        let mut p = MountProcessor::new(
            api,
            d.prior_string_set(attr),
            d.get_string_set(attr),
            spec,
            Some(info.datastore.clone()),
        );
        p.process_unmounts()
            .await
            .map_err(|e| ProviderError { message: format!("error unmounting hosts: {}", e.message), ..e })?;
        p.process_mounts()
            .await
            .map_err(|e| ProviderError { message: format!("error mounting hosts: {}", e.message), ..e })?;

        self.read(api, d).await
    }

    async fn delete(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let info = datastore_from_id(api, d.id()).await?;
        let hosts = d.get_string_set(host_attribute(d));
        let spec = expand_volume_spec(d)?;

        // The datastore disappears once the last host unmounts it.
        let mut p = MountProcessor::new(api, hosts, Vec::new(), spec, Some(info.datastore));
        p.process_unmounts()
            .await
            .map_err(|e| ProviderError { message: format!("error unmounting hosts: {}", e.message), ..e })
    }

    async fn import(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        let id = d.id().to_string();
        let info = datastore_from_id(api, &id).await?;

        if !is_nas_volume(&info.ds_type) {
            return Err(ProviderError::validation(format!("datastore ID {id:?} is not a NAS datastore")));
        }

        let mut access_mode: Option<AccessMode> = None;
        for mount in &info.host_mounts {
            match access_mode {
                None => access_mode = Some(mount.access_mode),
                Some(mode) if mode != mount.access_mode => {
                    return Err(ProviderError::validation(
                        "access_mode is inconsistent across configured hosts",
                    ));
                }
                Some(_) => {}
            }
        }

        if let Some(mode) = access_mode {
            d.set("access_mode", mode.as_str());
        }
        d.set("type", info.ds_type.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attributes;
    use serde_json::{json, Value};
    use tpv_vsphere::SimulatedVsphere;

    struct Lab {
        sim: SimulatedVsphere,
        dc: String,
        h1: String,
        h2: String,
        h3: String,
    }

    fn lab() -> Lab {
        let sim = SimulatedVsphere::vcenter();
        let dc = sim.add_datacenter("dc1");
        let h1 = sim.add_host(&dc, "esxi-01.lab").unwrap();
        let h2 = sim.add_host(&dc, "esxi-02.lab").unwrap();
        let h3 = sim.add_host(&dc, "esxi-03.lab").unwrap();
        Lab { sim, dc, h1, h2, h3 }
    }

    fn planned(extra: Value) -> Attributes {
        let mut attrs: Attributes = json!({
            "name": "nfs-01",
            "remote_hosts": ["filer.lab"],
            "remote_path": "/export/vm",
            "access_mode": "readWrite",
            "type": "NFS"
        })
        .as_object()
        .cloned()
        .unwrap();
        attrs.extend(extra.as_object().cloned().unwrap());
        attrs
    }

    async fn create(lab: &Lab, extra: Value) -> ResourceData {
        let mut d = ResourceData::from_config(planned(extra));
        NasDatastore.create(&lab.sim, &mut d).await.unwrap();
        d
    }

    #[tokio::test]
    async fn create_mounts_every_host_on_one_datastore() {
        let lab = lab();
        let d = create(&lab, json!({"host_system_ids": [lab.h1, lab.h2]})).await;

        assert!(d.id().starts_with("datastore-"));
        assert_eq!(lab.sim.datastore_ids(), vec![d.id().to_string()]);
        let mut expected = vec![lab.h1.clone(), lab.h2.clone()];
        expected.sort();
        assert_eq!(d.get_string_set(HOST_SYSTEM_IDS), expected);
        assert!(d.get_bool("multiple_host_access"));
        assert!(d.get_int("capacity").unwrap() > 0);
        assert_eq!(d.get_string_list("remote_hosts"), vec!["filer.lab"]);
    }

    #[tokio::test]
    async fn hostnames_flavour_reads_back_names() {
        let lab = lab();
        let d = create(&lab, json!({"hostnames": ["esxi-02.lab", "esxi-01.lab"]})).await;
        assert_eq!(d.get_string_set(HOSTNAMES), vec!["esxi-01.lab", "esxi-02.lab"]);
        assert!(d.get(HOST_SYSTEM_IDS).is_none());
    }

    #[tokio::test]
    async fn update_unmounts_then_mounts() {
        let lab = lab();
        let d = create(&lab, json!({"host_system_ids": [lab.h1, lab.h2]})).await;
        let ds = d.id().to_string();

        let prior = d.attributes().clone();
        let mut next = prior.clone();
        next.insert(HOST_SYSTEM_IDS.into(), json!([lab.h2, lab.h3]));
        next.insert("name".into(), json!("nfs-renamed"));
        let mut d = ResourceData::new(ds.clone(), prior, next);
        NasDatastore.update(&lab.sim, &mut d).await.unwrap();

        let mut expected = vec![lab.h2.clone(), lab.h3.clone()];
        expected.sort();
        assert_eq!(d.get_string_set(HOST_SYSTEM_IDS), expected);
        assert_eq!(d.get_str("name"), "nfs-renamed");
        assert_eq!(d.id(), ds);
    }

    async fn mounted_hosts(lab: &Lab, ds: &str) -> Vec<String> {
        let info = lab.sim.datastore_info(ds).await.unwrap();
        let mut hosts: Vec<String> = info.host_mounts.into_iter().map(|m| m.host).collect();
        hosts.sort();
        hosts
    }

    fn hostname_update(d: &ResourceData, hostnames: Value) -> ResourceData {
        let prior = d.attributes().clone();
        let mut next = prior.clone();
        next.insert(HOSTNAMES.into(), hostnames);
        ResourceData::new(d.id().to_string(), prior, next)
    }

    #[tokio::test]
    async fn update_by_hostname_unmounts_then_mounts() {
        let lab = lab();
        let d = create(&lab, json!({"hostnames": ["esxi-01.lab", "esxi-02.lab"]})).await;
        let ds = d.id().to_string();

        let mut d = hostname_update(&d, json!(["esxi-01.lab", "esxi-03.lab"]));
        NasDatastore.update(&lab.sim, &mut d).await.unwrap();

        assert_eq!(d.id(), ds);
        assert_eq!(d.get_string_set(HOSTNAMES), vec!["esxi-01.lab", "esxi-03.lab"]);
        let mut expected = vec![lab.h1.clone(), lab.h3.clone()];
        expected.sort();
        assert_eq!(mounted_hosts(&lab, &ds).await, expected);
        assert!(!mounted_hosts(&lab, &ds).await.contains(&lab.h2));
    }

    #[tokio::test]
    async fn update_by_hostname_rejects_duplicate_hostname() {
        let lab = lab();
        let d = create(&lab, json!({"hostnames": ["esxi-01.lab"]})).await;
        lab.sim.add_host(&lab.dc, "esxi-03.lab").unwrap();

        let mut d = hostname_update(&d, json!(["esxi-01.lab", "esxi-03.lab"]));
        let err = NasDatastore.update(&lab.sim, &mut d).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Api);
        assert_eq!(
            err.source.map(|e| e.kind),
            Some(tpv_vsphere::VsphereErrorKind::AmbiguousHostname)
        );
        assert_eq!(mounted_hosts(&lab, d.id()).await, vec![lab.h1.clone()]);
    }

    #[tokio::test]
    async fn read_drops_datastore_once_its_only_host_is_removed() {
        let lab = lab();
        let mut d = create(&lab, json!({"host_system_ids": [lab.h2]})).await;
        lab.sim.remove_host(&lab.h2).unwrap();
        assert!(lab.sim.datastore_ids().is_empty());

        NasDatastore.read(&lab.sim, &mut d).await.unwrap();
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn delete_removes_datastore() {
        let lab = lab();
        let mut d = create(&lab, json!({"hostnames": ["esxi-01.lab", "esxi-03.lab"]})).await;
        NasDatastore.delete(&lab.sim, &mut d).await.unwrap();
        assert!(lab.sim.datastore_ids().is_empty());

        // Gone from the endpoint: read drops it from state.
        NasDatastore.read(&lab.sim, &mut d).await.unwrap();
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn folder_and_cluster_placement() {
        let lab = lab();
        let d = create(&lab, json!({"host_system_ids": [lab.h1], "folder": "/nfs/"})).await;
        assert_eq!(d.get_str("folder"), "nfs");

        let cluster = lab.sim.add_datastore_cluster();
        let prior = d.attributes().clone();
        let mut next = prior.clone();
        next.remove("folder");
        next.insert("datastore_cluster_id".into(), json!(cluster));
        let mut d = ResourceData::new(d.id().to_string(), prior, next);
        NasDatastore.update(&lab.sim, &mut d).await.unwrap();
        assert_eq!(d.get_str("datastore_cluster_id"), cluster);
        assert!(d.get("folder").is_none());
    }

    #[tokio::test]
    async fn datastore_cluster_needs_vcenter() {
        let sim = SimulatedVsphere::esxi("esxi-01.lab");
        let mut d = ResourceData::from_config(planned(json!({
            "hostnames": ["esxi-01.lab"],
            "datastore_cluster_id": "group-p1"
        })));
        let err = NasDatastore.create(&sim, &mut d).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Unsupported);
        assert!(sim.datastore_ids().is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_volume_spec() {
        let lab = lab();
        let mut d = ResourceData::from_config(planned(json!({
            "host_system_ids": [lab.h1],
            "security_type": "SEC_KRB5"
        })));
        let err = NasDatastore.create(&lab.sim, &mut d).await.unwrap_err();
        assert!(err.message.contains("only valid for NFS41"));

        let mut d = ResourceData::from_config(planned(json!({"host_system_ids": [lab.h1], "type": "CIFS"})));
        assert_eq!(
            NasDatastore.create(&lab.sim, &mut d).await.unwrap_err().kind,
            ProviderErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn mount_mismatch_is_reported() {
        let lab = lab();
        // The export already backs a datastore, so mounting it joins that one.
        let existing = create(&lab, json!({"host_system_ids": [lab.h2]})).await;

        let spec = expand_volume_spec(&existing).unwrap();
        let mut p = MountProcessor::new(
            &lab.sim,
            vec![lab.h2.clone()],
            vec![lab.h1.clone(), lab.h2.clone()],
            spec,
            Some("datastore-999".into()),
        );
        let err = p.process_mounts().await.unwrap_err();
        assert!(err.message.contains("datastore ID mismatch"));
        assert!(err.message.contains(existing.id()));
    }

    #[tokio::test]
    async fn import_checks_type_and_access_mode() {
        let lab = lab();
        let d = create(&lab, json!({"host_system_ids": [lab.h1]})).await;

        let mut imported = ResourceData::default();
        imported.set_id(d.id());
        NasDatastore.import(&lab.sim, &mut imported).await.unwrap();
        assert_eq!(imported.get_str("access_mode"), "readWrite");
        assert_eq!(imported.get_str("type"), "NFS");

        NasDatastore.read(&lab.sim, &mut imported).await.unwrap();
        assert_eq!(imported.get_str("name"), "nfs-01");
        assert_eq!(imported.get_string_set(HOSTNAMES), vec!["esxi-01.lab"]);

        // Join the same export read-only from a second host.
        let mut spec = expand_volume_spec(&d).unwrap();
        spec.access_mode = AccessMode::ReadOnly;
        lab.sim.create_nas_datastore(&lab.h2, &spec).await.unwrap();
        let mut imported = ResourceData::default();
        imported.set_id(d.id());
        let err = NasDatastore.import(&lab.sim, &mut imported).await.unwrap_err();
        assert!(err.message.contains("inconsistent"));

        let mut missing = ResourceData::default();
        missing.set_id("datastore-404");
        let err = NasDatastore.import(&lab.sim, &mut missing).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::NotFound);
    }
}
