// Public modules
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod types;
pub mod validation;

pub use config::PortalConfig;

// Entry point for initialization
/// Initialize the library: logging, the form catalog, the application store and
/// the document exporter. Must be called before any other function in the library;
/// later calls are no-ops.
pub fn initialize(config: PortalConfig) -> ffi::FFIResult<()> {
    globals::initialize(config)
}

/// Whether [`initialize`] has completed successfully.
pub fn is_initialized() -> bool {
    globals::is_initialized()
}

/// Active configuration.
pub fn get_config() -> ffi::FFIResult<PortalConfig> {
    globals::get_config()
}
