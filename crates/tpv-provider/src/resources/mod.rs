//! Managed resources.

pub mod host_config_snmp;
pub mod host_config_syslog;
pub mod iscsi_software_adapter;
pub mod nas_datastore;
pub mod vcenter_dns;

use crate::resource::Resource;

/// Every resource the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(host_config_snmp::HostConfigSnmp),
        Box::new(host_config_syslog::HostConfigSyslog),
        Box::new(iscsi_software_adapter::IscsiSoftwareAdapter),
        Box::new(nas_datastore::NasDatastore),
        Box::new(vcenter_dns::VcenterDns),
    ]
}
