pub mod crop;
pub mod loaders;
pub mod painting;

pub use crop::{CropDescriptor, CropOrigin, CropRect, DatasetRecord, PixelSource, DATASET_HEADER};
pub use loaders::{load_paintings, MetaRecordReader, MetaReport};
pub use painting::Painting;
