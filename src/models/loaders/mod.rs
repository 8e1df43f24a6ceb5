pub mod meta_reader;
pub mod painting_loader;

pub use meta_reader::{Lenient, MetaRecordReader, MetaReport};
pub use painting_loader::load_paintings;
