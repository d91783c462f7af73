//! Host selector attributes shared by every host-scoped resource.

use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::{Attribute, Schema, ValueType};

use tpv_vsphere::hostsystem::{self, HOSTNAME_ATTR, HOST_SYSTEM_ID_ATTR};
use tpv_vsphere::types::HostSummary;
use tpv_vsphere::{HostIdentifier, HostSelector, VsphereApi};

/// `host_system_id` / `hostname`, exactly one of which must be set.
pub fn selector_schema(force_new: bool) -> Schema {
    let mut id = Attribute::optional(ValueType::String)
        .describe("Managed object ID of the host.")
        .exactly_one_of(&[HOSTNAME_ATTR]);
    let mut name = Attribute::optional(ValueType::String).describe("Hostname of the host.");
    if force_new {
        id = id.force_new();
        name = name.force_new();
    }
    Schema::new().attr(HOST_SYSTEM_ID_ATTR, id).attr(HOSTNAME_ATTR, name)
}

pub fn selector(d: &ResourceData) -> HostSelector {
    let non_empty = |key: &str| Some(d.get_str(key).to_string()).filter(|s| !s.is_empty());
    HostSelector {
        host_system_id: non_empty(HOST_SYSTEM_ID_ATTR),
        hostname: non_empty(HOSTNAME_ATTR),
    }
}

/// Resolve the host a resource is configured for.
pub async fn resolve(
    api: &dyn VsphereApi,
    d: &ResourceData,
    context: &str,
) -> ProviderResult<(HostSummary, HostIdentifier)> {
    hostsystem::from_hostname_or_id(api, &selector(d))
        .await
        .map_err(|e| ProviderError::api(format!("error retrieving host for {context}"), e))
}

/// Resolve a raw import identifier that may be an ID or a hostname.
pub async fn resolve_raw(
    api: &dyn VsphereApi,
    raw: &str,
    context: &str,
) -> ProviderResult<(HostSummary, HostIdentifier)> {
    hostsystem::check_if_hostname_or_id(api, raw)
        .await
        .map_err(|e| ProviderError::api(format!("error retrieving host for {context}"), e))
}

/// Persist the identifier under the attribute that produced it.
pub fn record_identifier(d: &mut ResourceData, ident: &HostIdentifier) {
    d.set(ident.attribute.attribute_name(), ident.value.clone());
}

/// Import for resources whose ID is the host identifier itself.
pub async fn import_by_host(api: &dyn VsphereApi, d: &mut ResourceData, context: &str) -> ProviderResult<()> {
    let raw = d.id().to_string();
    let (_, ident) = resolve_raw(api, &raw, context).await?;
    d.set_id(ident.value.clone());
    record_identifier(d, &ident);
    Ok(())
}
