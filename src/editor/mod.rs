pub mod editor_config;
