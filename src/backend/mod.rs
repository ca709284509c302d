// Backend module - Vulkan bootstrap layer
//
// Design: Thin RAII wrappers around ash handles, plus the device selector.
// Drop order: LogicalDevice, then Surface, then VulkanInstance.

pub mod device;
pub mod error;
pub mod instance;
pub mod probe;
pub mod selection;
pub mod surface;
pub mod swapchain;

pub use device::LogicalDevice;
pub use error::{BackendError, SelectionError};
pub use instance::{InstanceDesc, VulkanInstance};
pub use probe::{DeviceInfo, InstanceProbe};
pub use selection::{
    select_device, DeviceProbe, DeviceSelector, QueueCapability, QueueFamilyIndices,
    QueueFamilyRequirements, SelectedDevice,
};
pub use surface::Surface;
pub use swapchain::SwapchainSupport;
