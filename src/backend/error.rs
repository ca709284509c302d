// Backend error types
//
// Selection failures are fatal to startup: there is nothing to retry,
// the set of GPUs does not change while the process runs.

use ash::vk;
use thiserror::Error;

/// Why physical device selection failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The instance exposes no physical devices at all.
    #[error("Failed to find GPUs with Vulkan support")]
    NoDevicesFound,

    /// Devices exist, but none satisfies the requirements.
    #[error("Failed to find a suitable GPU")]
    NoSuitableDevice,

    /// The device enumeration call itself failed.
    #[error("Physical device enumeration failed: {0}")]
    Enumeration(vk::Result),
}

/// Errors raised while building the Vulkan objects around the selector.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Validation layers requested but not available: {}", .0.join(", "))]
    MissingValidationLayers(Vec<String>),

    #[error("Required instance extensions not supported: {}", .0.join(", "))]
    MissingInstanceExtensions(Vec<String>),

    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("Invalid name {0:?}: contains an interior NUL byte")]
    InvalidName(String),
}

/// Result type alias for the backend.
pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_errors_convert_into_backend_errors() {
        let err: BackendError = SelectionError::NoSuitableDevice.into();
        assert!(matches!(err, BackendError::Selection(SelectionError::NoSuitableDevice)));
        assert_eq!(err.to_string(), "Failed to find a suitable GPU");
    }

    #[test]
    fn missing_names_are_listed() {
        let err = BackendError::MissingInstanceExtensions(vec![
            "VK_KHR_surface".to_string(),
            "VK_KHR_xlib_surface".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Required instance extensions not supported: VK_KHR_surface, VK_KHR_xlib_surface"
        );
    }
}
