pub mod proc_initiateor;
pub mod proc_loader;
pub mod proc_validator;
pub mod services;
pub mod settings;
pub mod sources;
