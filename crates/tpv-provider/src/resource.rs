//! Resource and data-source contracts.

use crate::error::{ProviderError, ProviderResult};
use crate::resource_data::ResourceData;
use crate::schema::Schema;

use async_trait::async_trait;
use tpv_vsphere::VsphereApi;

/// A managed object with a create / read / update / delete lifecycle.
///
/// A `read` that finds the object gone clears the ID instead of failing.
#[async_trait]
pub trait Resource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()>;

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()>;

    async fn update(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()>;

    async fn delete(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()>;

    /// Populate enough state from `d.id()` for a subsequent `read`.
    async fn import(&self, _api: &dyn VsphereApi, _d: &mut ResourceData) -> ProviderResult<()> {
        Err(ProviderError::unsupported(format!(
            "resource {} does not support import",
            self.type_name()
        )))
    }
}

/// A read-only lookup.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, api: &dyn VsphereApi, d: &mut ResourceData) -> ProviderResult<()>;
}
