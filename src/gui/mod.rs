pub mod dataset_choice;
pub mod table_view;
pub mod theme;
pub mod toolbar;
pub mod uploader;
