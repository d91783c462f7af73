//! `vsphere_iscsi_software_adapter` data source.

use crate::error::ProviderResult;
use crate::resource::DataSource;
use crate::resource_data::ResourceData;
use crate::resources::iscsi_software_adapter::{read_adapter, schema, TYPE_NAME};
use crate::schema::Schema;

use async_trait::async_trait;
use tpv_vsphere::VsphereApi;

pub struct IscsiSoftwareAdapterData;

#[async_trait]
impl DataSource for IscsiSoftwareAdapterData {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        schema(false)
    }

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()> {
        read_adapter(api, d, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attributes;
    use serde_json::json;
    use tpv_vsphere::SimulatedVsphere;

    #[tokio::test]
    async fn reads_enabled_adapter() {
        let sim = SimulatedVsphere::esxi("esxi-01.lab");
        sim.update_software_iscsi(tpv_vsphere::simulator::ESXI_HOST, true).await.unwrap();

        let attrs: Attributes = json!({"hostname": "esxi-01.lab"}).as_object().cloned().unwrap();
        let mut d = ResourceData::from_config(attrs);
        IscsiSoftwareAdapterData.read(&sim, &mut d).await.unwrap();

        let device = d.get_str("adapter_id").to_string();
        assert!(device.starts_with("vmhba"));
        assert_eq!(d.id(), format!("esxi-01.lab:{device}"));
        assert!(d.get_str("iscsi_name").starts_with("iqn."));
    }
}
