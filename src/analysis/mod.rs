pub mod clustering;
pub mod enrichment;
pub mod go_enrichment;
pub mod hit_selection;
pub mod normalize;
pub mod pca;
pub mod stats;
