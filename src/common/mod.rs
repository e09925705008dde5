pub mod config_files;
pub mod json_watch;
