pub mod assemble;
pub mod catalog;
pub mod cog;
pub mod dataset_id;
pub mod dekad;
pub mod eo3;
pub mod error;
pub mod extent;
pub mod fs;
pub mod identity;
pub mod model;
pub mod partition;
pub mod paths;
pub mod products;
pub mod stac;
pub mod worldcereal;

pub use dataset_id::{odc_uuid, odc_uuid_with, ODC_UUID_NAMESPACE};
pub use dekad::{dekad, month_range};
pub use error::PrepError;
pub use model::{DekadRange, IwmiTileId, WaporTileId, WorldCerealTileId};
pub use partition::{partition, select};
pub use paths::{classify, PathKind};
