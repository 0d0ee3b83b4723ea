pub mod condition_map;
pub mod custom_proteins;
pub mod loader;
pub mod protein_id;
pub mod storage;
pub mod table;
