pub mod archive;
pub mod automation;
pub mod execution;
pub mod facade;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod polling;
pub mod settings;
pub mod transcript;
