//! Read-only data sources.

pub mod host_config_date_time;
pub mod host_config_syslog;
pub mod iscsi_software_adapter;

use crate::resource::DataSource;

/// Every data source the provider serves.
pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(host_config_date_time::HostConfigDateTime),
        Box::new(host_config_syslog::HostConfigSyslogData),
        Box::new(iscsi_software_adapter::IscsiSoftwareAdapterData),
    ]
}
