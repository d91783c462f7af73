//! Host lookup by managed-object ID or hostname.
//!
//! vCenter hands a host a new managed-object ID whenever it is removed from
//! inventory and added back (maintenance, outages, rebuilds). Resources
//! that pin a host therefore accept either the ID or the hostname, and
//! resolution reports which of the two produced the match so the caller
//! can keep storing the same flavour of identifier.

use crate::api::VsphereApi;
use crate::error::{VsphereError, VsphereErrorKind, VsphereResult};
use crate::types::{ApiType, HostConnectionState, HostSummary, TaskInfo, TaskState};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Upper bound for a single inventory call.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(300);

pub const HOST_SYSTEM_ID_ATTR: &str = "host_system_id";
pub const HOSTNAME_ATTR: &str = "hostname";

/// Which attribute an identifier belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HostIdAttribute {
    HostSystemId,
    Hostname,
}

impl HostIdAttribute {
    pub fn attribute_name(self) -> &'static str {
        match self {
            Self::HostSystemId => HOST_SYSTEM_ID_ATTR,
            Self::Hostname => HOSTNAME_ATTR,
        }
    }
}

impl fmt::Display for HostIdAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// The identifier that resolved a host, and the attribute it belongs in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostIdentifier {
    pub attribute: HostIdAttribute,
    pub value: String,
}

impl HostIdentifier {
    pub fn host_system_id(value: impl Into<String>) -> Self {
        Self { attribute: HostIdAttribute::HostSystemId, value: value.into() }
    }

    pub fn hostname(value: impl Into<String>) -> Self {
        Self { attribute: HostIdAttribute::Hostname, value: value.into() }
    }
}

/// The pair of mutually exclusive host attributes a resource was configured with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSelector {
    pub host_system_id: Option<String>,
    pub hostname: Option<String>,
}

impl HostSelector {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { host_system_id: Some(id.into()), hostname: None }
    }

    pub fn by_hostname(name: impl Into<String>) -> Self {
        Self { host_system_id: None, hostname: Some(name.into()) }
    }
}

async fn bounded<T, F>(fut: F) -> VsphereResult<T>
where
    F: Future<Output = VsphereResult<T>>,
{
    tokio::time::timeout(DEFAULT_API_TIMEOUT, fut).await?
}

/// Locate a host by its managed-object ID.
pub async fn from_id(api: &dyn VsphereApi, id: &str) -> VsphereResult<HostSummary> {
    log::debug!("Locating host system ID {id}");
    let host = bounded(api.host_by_id(id)).await?;
    log::debug!("Host system found: {}", host.host);
    Ok(host)
}

/// Locate a host by hostname across every datacenter.
///
/// Zero matches is `HostnameNotFound`, several matches is
/// `AmbiguousHostname`; listing failures are returned unchanged.
pub async fn from_hostname(api: &dyn VsphereApi, hostname: &str) -> VsphereResult<HostSummary> {
    log::debug!("Locating host system with hostname {hostname}");

    let datacenters = bounded(api.list_datacenters()).await?;
    let listings = futures::future::try_join_all(
        datacenters
            .iter()
            .map(|dc| bounded(api.list_hosts_in_datacenter(&dc.datacenter))),
    )
    .await?;

    let mut matches = listings.into_iter().flatten().filter(|h| h.name == hostname);
    match (matches.next(), matches.next()) {
        (Some(host), None) => {
            log::debug!("Host system found: {}", host.host);
            Ok(host)
        }
        (Some(_), Some(_)) => Err(VsphereError::ambiguous_hostname(hostname)),
        (None, _) => Err(VsphereError::hostname_not_found(hostname)),
    }
}

/// Resolve a host from a resource's configured attributes.
///
/// The managed-object ID wins when both attributes are set. The returned
/// identifier echoes the attribute that was used.
pub async fn from_hostname_or_id(
    api: &dyn VsphereApi,
    selector: &HostSelector,
) -> VsphereResult<(HostSummary, HostIdentifier)> {
    let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(id) = non_empty(&selector.host_system_id) {
        let host = from_id(api, &id).await?;
        Ok((host, HostIdentifier::host_system_id(id)))
    } else if let Some(name) = non_empty(&selector.hostname) {
        let host = from_hostname(api, &name).await?;
        Ok((host, HostIdentifier::hostname(name)))
    } else {
        Err(VsphereError::invalid_argument(format!(
            "no valid host attribute passed. One of the following should be set: '{HOST_SYSTEM_ID_ATTR}', '{HOSTNAME_ATTR}'"
        )))
    }
}

/// Resolve a raw identifier that may be either an ID or a hostname.
///
/// Only a `ManagedObjectNotFound` from the ID lookup triggers the hostname
/// search; only a `HostnameNotFound` from that search turns into
/// `HostnameOrIdNotFound`. Anything else propagates.
pub async fn check_if_hostname_or_id(
    api: &dyn VsphereApi,
    raw: &str,
) -> VsphereResult<(HostSummary, HostIdentifier)> {
    match from_id(api, raw).await {
        Ok(host) => {
            let ident = HostIdentifier::host_system_id(host.host.clone());
            Ok((host, ident))
        }
        Err(e) if e.is_managed_object_not_found() => match from_hostname(api, raw).await {
            Ok(host) => {
                let ident = HostIdentifier::hostname(host.name.clone());
                Ok((host, ident))
            }
            Err(e) if e.is_hostname_not_found() => Err(VsphereError::hostname_or_id_not_found(raw)),
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    }
}

/// The named host in a datacenter, or the endpoint's default host.
///
/// On ESXi the only host is always returned. On vCenter an empty name
/// selects the datacenter's single host and fails when there are several.
pub async fn system_or_default(
    api: &dyn VsphereApi,
    name: &str,
    datacenter: &str,
) -> VsphereResult<HostSummary> {
    let hosts = || async { bounded(api.list_hosts_in_datacenter(datacenter)).await };
    match bounded(api.api_type()).await? {
        ApiType::HostAgent => default_host(hosts().await?, datacenter),
        ApiType::VirtualCenter if !name.is_empty() => {
            let mut matches = hosts().await?.into_iter().filter(|h| h.name == name);
            match (matches.next(), matches.next()) {
                (Some(host), None) => Ok(host),
                (Some(_), Some(_)) => Err(VsphereError::ambiguous_hostname(name)),
                (None, _) => Err(VsphereError::new(
                    VsphereErrorKind::HostnameNotFound,
                    format!("host '{name}' not found in datacenter {datacenter}"),
                )),
            }
        }
        ApiType::VirtualCenter => default_host(hosts().await?, datacenter),
    }
}

fn default_host(hosts: Vec<HostSummary>, datacenter: &str) -> VsphereResult<HostSummary> {
    let mut iter = hosts.into_iter();
    match (iter.next(), iter.next()) {
        (Some(host), None) => Ok(host),
        (None, _) => Err(VsphereError::not_found(format!("no default host found in datacenter {datacenter}"))),
        (Some(_), Some(_)) => Err(VsphereError::invalid_argument(format!(
            "default host resolves to multiple instances in datacenter {datacenter}, please specify"
        ))),
    }
}

/// The host's name, or the ID itself when the lookup fails.
pub async fn name_or_id(api: &dyn VsphereApi, id: &str) -> String {
    match from_id(api, id).await {
        Ok(host) => host.name,
        Err(_) => id.to_string(),
    }
}

pub async fn in_maintenance(api: &dyn VsphereApi, host: &HostSummary) -> VsphereResult<bool> {
    Ok(bounded(api.host_runtime(&host.host)).await?.in_maintenance_mode)
}

pub async fn connection_state(api: &dyn VsphereApi, host: &HostSummary) -> VsphereResult<HostConnectionState> {
    Ok(bounded(api.host_runtime(&host.host)).await?.connection_state)
}

/// Put a host into maintenance mode and wait for the task.
///
/// `evacuate` only applies on vCenter, where DRS can move powered-off VMs.
pub async fn enter_maintenance_mode(
    api: &dyn VsphereApi,
    host: &HostSummary,
    timeout: Duration,
    evacuate: bool,
) -> VsphereResult<()> {
    let evacuate = evacuate && matches!(api.api_type().await, Ok(ApiType::VirtualCenter));

    if in_maintenance(api, host).await? {
        log::debug!("Host {:?} is already in maintenance mode", host.name);
        return Ok(());
    }

    log::debug!("Host {:?} is entering maintenance mode (evacuate: {evacuate})", host.name);
    let task = api.enter_maintenance_mode(&host.host, timeout.as_secs(), evacuate).await?;
    let info = api.wait_for_task(&task, timeout).await?;
    log_task_duration(&info);
    if info.status != TaskState::Succeeded {
        return Err(VsphereError::task(format!(
            "error while putting host({}) in maintenance mode: {}",
            host.host,
            task_error_text(&info.error)
        )));
    }
    Ok(())
}

/// Take a host out of maintenance mode and wait for the task.
pub async fn exit_maintenance_mode(api: &dyn VsphereApi, host: &HostSummary, timeout: Duration) -> VsphereResult<()> {
    if !in_maintenance(api, host).await? {
        log::debug!("Host {:?} is already not in maintenance mode", host.name);
        return Ok(());
    }

    log::debug!("Host {:?} is exiting maintenance mode", host.name);
    let task = api.exit_maintenance_mode(&host.host, timeout.as_secs()).await?;
    let info = api.wait_for_task(&task, timeout).await?;
    log_task_duration(&info);
    if info.status != TaskState::Succeeded {
        return Err(VsphereError::task(format!(
            "error while getting host({}) out of maintenance mode: {}",
            host.host,
            task_error_text(&info.error)
        )));
    }
    Ok(())
}

fn log_task_duration(info: &TaskInfo) {
    if let Some(took) = info.elapsed() {
        log::debug!("Task {} finished as {:?} after {}ms", info.task, info.status, took.num_milliseconds());
    }
}

fn task_error_text(error: &Option<serde_json::Value>) -> String {
    match error {
        Some(v) => v.to_string(),
        None => "unknown task error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{SimulatedVsphere, ESXI_DATACENTER, ESXI_HOST};

    struct Lab {
        sim: SimulatedVsphere,
        dc1: String,
        dc2: String,
        h1: String,
    }

    fn lab() -> Lab {
        let sim = SimulatedVsphere::vcenter();
        let dc1 = sim.add_datacenter("dc1");
        let dc2 = sim.add_datacenter("dc2");
        let h1 = sim.add_host(&dc1, "esxi-01.lab").unwrap();
        sim.add_host(&dc2, "esxi-02.lab").unwrap();
        Lab { sim, dc1, dc2, h1 }
    }

    #[tokio::test]
    async fn from_id_hit_and_miss() {
        let lab = lab();
        assert_eq!(from_id(&lab.sim, &lab.h1).await.unwrap().name, "esxi-01.lab");
        let err = tokio_test::assert_err!(from_id(&lab.sim, "host-999").await);
        assert!(err.is_managed_object_not_found());
    }

    #[tokio::test]
    async fn from_hostname_searches_all_datacenters() {
        let lab = lab();
        let host = from_hostname(&lab.sim, "esxi-02.lab").await.unwrap();
        assert_eq!(host.name, "esxi-02.lab");
    }

    #[tokio::test]
    async fn from_hostname_no_match() {
        let lab = lab();
        let err = from_hostname(&lab.sim, "esxi-09.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::HostnameNotFound);
    }

    #[tokio::test]
    async fn from_hostname_rejects_duplicates_across_datacenters() {
        let lab = lab();
        lab.sim.add_host(&lab.dc2, "esxi-01.lab").unwrap();
        let err = from_hostname(&lab.sim, "esxi-01.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::AmbiguousHostname);
    }

    #[tokio::test]
    async fn from_hostname_surfaces_transport_failure() {
        let lab = lab();
        lab.sim.set_inventory_fault(Some(VsphereError::connection("connection refused")));
        let err = from_hostname(&lab.sim, "esxi-01.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::ConnectionError);
        assert!(!err.is_not_found());
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn from_hostname_fails_when_any_datacenter_listing_fails() {
        let lab = lab();
        lab.sim.set_datacenter_fault(&lab.dc2, Some(VsphereError::connection("connection reset")));
        // The host lives in the failing datacenter.
        let err = from_hostname(&lab.sim, "esxi-02.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::ConnectionError);
        // A healthy match elsewhere is not enough to rule out a duplicate.
        let err = from_hostname(&lab.sim, "esxi-01.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::ConnectionError);
        assert_ne!(err.kind, VsphereErrorKind::HostnameNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_lookup_times_out() {
        let lab = lab();
        lab.sim.stall_inventory(true);

        let started = tokio::time::Instant::now();
        let err = from_id(&lab.sim, &lab.h1).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::Timeout);
        assert!(started.elapsed() >= DEFAULT_API_TIMEOUT);

        let err = from_hostname(&lab.sim, "esxi-01.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::Timeout);

        lab.sim.stall_inventory(false);
        assert_eq!(from_id(&lab.sim, &lab.h1).await.unwrap().name, "esxi-01.lab");
    }

    #[tokio::test]
    async fn from_hostname_or_id_echoes_flavour() {
        let lab = lab();
        let (host, ident) = from_hostname_or_id(&lab.sim, &HostSelector::by_id(lab.h1.clone()))
            .await
            .unwrap();
        assert_eq!(host.name, "esxi-01.lab");
        assert_eq!(ident, HostIdentifier::host_system_id(lab.h1.clone()));

        let (host, ident) = from_hostname_or_id(&lab.sim, &HostSelector::by_hostname("esxi-01.lab"))
            .await
            .unwrap();
        assert_eq!(host.host, lab.h1);
        assert_eq!(ident.attribute, HostIdAttribute::Hostname);
        assert_eq!(ident.value, "esxi-01.lab");
    }

    #[tokio::test]
    async fn from_hostname_or_id_requires_one_attribute() {
        let lab = lab();
        let empty = HostSelector { host_system_id: Some(String::new()), hostname: None };
        let err = from_hostname_or_id(&lab.sim, &empty).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::InvalidArgument);
        assert!(err.message.contains(HOST_SYSTEM_ID_ATTR));
        assert!(err.message.contains(HOSTNAME_ATTR));
    }

    #[tokio::test]
    async fn hostname_keeps_working_after_readd() {
        let lab = lab();
        let new_id = lab.sim.readd_host(&lab.h1).unwrap();
        assert!(from_hostname_or_id(&lab.sim, &HostSelector::by_id(lab.h1.clone())).await.is_err());
        let (host, _) = from_hostname_or_id(&lab.sim, &HostSelector::by_hostname("esxi-01.lab"))
            .await
            .unwrap();
        assert_eq!(host.host, new_id);
    }

    #[tokio::test]
    async fn check_prefers_id() {
        let lab = lab();
        let (_, ident) = check_if_hostname_or_id(&lab.sim, &lab.h1).await.unwrap();
        assert_eq!(ident, HostIdentifier::host_system_id(lab.h1.clone()));
    }

    #[tokio::test]
    async fn check_falls_back_to_hostname() {
        let lab = lab();
        let (host, ident) = check_if_hostname_or_id(&lab.sim, "esxi-02.lab").await.unwrap();
        assert_eq!(ident, HostIdentifier::hostname("esxi-02.lab"));
        assert_eq!(host.name, "esxi-02.lab");
    }

    #[tokio::test]
    async fn check_reports_combined_not_found() {
        let lab = lab();
        let err = check_if_hostname_or_id(&lab.sim, "nothing-here").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::HostnameOrIdNotFound);
    }

    #[tokio::test]
    async fn check_does_not_fall_back_on_transport_error() {
        let lab = lab();
        lab.sim.set_inventory_fault(Some(VsphereError::timeout("read timed out")));
        let err = check_if_hostname_or_id(&lab.sim, &lab.h1).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::Timeout);
    }

    #[tokio::test]
    async fn check_keeps_ambiguity_error() {
        let lab = lab();
        lab.sim.add_host(&lab.dc1, "esxi-02.lab").unwrap();
        let err = check_if_hostname_or_id(&lab.sim, "esxi-02.lab").await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::AmbiguousHostname);
    }

    #[tokio::test]
    async fn system_or_default_on_esxi() {
        let sim = SimulatedVsphere::esxi("esxi-01.lab");
        let host = system_or_default(&sim, "ignored", ESXI_DATACENTER).await.unwrap();
        assert_eq!(host.host, ESXI_HOST);
    }

    #[tokio::test]
    async fn system_or_default_on_vcenter() {
        let lab = lab();
        let host = system_or_default(&lab.sim, "esxi-01.lab", &lab.dc1).await.unwrap();
        assert_eq!(host.host, lab.h1);
        // Single host in dc2, so the default resolves.
        let host = system_or_default(&lab.sim, "", &lab.dc2).await.unwrap();
        assert_eq!(host.name, "esxi-02.lab");

        lab.sim.add_host(&lab.dc2, "esxi-03.lab").unwrap();
        assert!(system_or_default(&lab.sim, "", &lab.dc2).await.is_err());
        let err = system_or_default(&lab.sim, "esxi-01.lab", &lab.dc2).await.unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::HostnameNotFound);
    }

    #[tokio::test]
    async fn name_or_id_falls_back_to_id() {
        let lab = lab();
        assert_eq!(name_or_id(&lab.sim, &lab.h1).await, "esxi-01.lab");
        assert_eq!(name_or_id(&lab.sim, "host-404").await, "host-404");
    }

    #[tokio::test]
    async fn maintenance_round_trip_is_idempotent() {
        let lab = lab();
        let host = from_id(&lab.sim, &lab.h1).await.unwrap();
        let timeout = Duration::from_secs(60);

        tokio_test::assert_ok!(enter_maintenance_mode(&lab.sim, &host, timeout, true).await);
        assert!(in_maintenance(&lab.sim, &host).await.unwrap());
        enter_maintenance_mode(&lab.sim, &host, timeout, true).await.unwrap();

        exit_maintenance_mode(&lab.sim, &host, timeout).await.unwrap();
        assert_eq!(lab.sim.in_maintenance(&lab.h1), Some(false));
        exit_maintenance_mode(&lab.sim, &host, timeout).await.unwrap();
        assert_eq!(connection_state(&lab.sim, &host).await.unwrap(), HostConnectionState::Connected);
    }

    #[tokio::test]
    async fn connection_state_tracks_host_runtime() {
        let lab = lab();
        let host = from_id(&lab.sim, &lab.h1).await.unwrap();
        assert_eq!(connection_state(&lab.sim, &host).await.unwrap(), HostConnectionState::Connected);

        lab.sim.set_connection_state(&lab.h1, HostConnectionState::Disconnected).unwrap();
        assert_eq!(connection_state(&lab.sim, &host).await.unwrap(), HostConnectionState::Disconnected);
        lab.sim.set_connection_state(&lab.h1, HostConnectionState::NotResponding).unwrap();
        assert_eq!(connection_state(&lab.sim, &host).await.unwrap(), HostConnectionState::NotResponding);

        assert!(lab.sim.set_connection_state("host-999", HostConnectionState::Connected).is_err());
    }

    #[tokio::test]
    async fn maintenance_task_failure_is_reported() {
        let lab = lab();
        let host = from_id(&lab.sim, &lab.h1).await.unwrap();
        lab.sim.fail_tasks_for(&lab.h1);
        let err = enter_maintenance_mode(&lab.sim, &host, Duration::from_secs(5), false)
            .await
            .unwrap_err();
        assert_eq!(err.kind, VsphereErrorKind::TaskError);
        assert!(err.message.contains(&lab.h1));
    }
}
