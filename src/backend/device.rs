// Logical device
//
// Responsibilities:
// - One queue per distinct queue family the selector resolved
// - Enable the device extensions the selection was checked against
// - Hand out the queue handles, destroy the device on drop

use super::error::{BackendError, Result};
use super::instance::VulkanInstance;
use super::selection::{QueueCapability, SelectedDevice};
use ash::vk;
use std::ffi::{c_char, CString};

/// Logical device wrapper with automatic cleanup.
///
/// Queues are owned by the device and go away with it. Must be dropped
/// before the `VulkanInstance` it was created from.
pub struct LogicalDevice {
    device: ash::Device,

    pub graphics_queue: Option<vk::Queue>,
    pub present_queue: Option<vk::Queue>,
    pub compute_queue: Option<vk::Queue>,
    pub transfer_queue: Option<vk::Queue>,
}

impl LogicalDevice {
    /// Create the logical device for a selected physical device.
    ///
    /// `extensions` should be the list the selection was checked against.
    pub fn new(
        instance: &VulkanInstance,
        selected: &SelectedDevice,
        extensions: &[String],
    ) -> Result<Self> {
        let queue_families = selected.queue_families;

        // Device creation needs at least one queue; with no queue
        // requirements, take family 0.
        let mut families = queue_families.unique();
        if families.is_empty() {
            families.push(0);
        }

        let queue_priorities = [1.0];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        let extension_names = extensions
            .iter()
            .map(|name| {
                CString::new(name.as_str()).map_err(|_| BackendError::InvalidName(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|e| e.as_ptr()).collect();

        // Device layers are deprecated, but older implementations still read them
        let layer_ptrs: Vec<*const c_char> = instance
            .enabled_layers()
            .iter()
            .map(|l| l.as_ptr())
            .collect();

        let features = vk::PhysicalDeviceFeatures::default();

        #[allow(deprecated)]
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .raw()
                .create_device(selected.physical_device, &create_info, None)
        }?;

        let queue = |capability: QueueCapability| {
            queue_families
                .get(capability)
                .map(|family| unsafe { device.get_device_queue(family, 0) })
        };
        let graphics_queue = queue(QueueCapability::Graphics);
        let present_queue = queue(QueueCapability::Present);
        let compute_queue = queue(QueueCapability::Compute);
        let transfer_queue = queue(QueueCapability::Transfer);

        log::info!(
            "Created logical device with {} queue(s) on families {:?}",
            families.len(),
            families
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            compute_queue,
            transfer_queue,
        })
    }

    pub fn raw(&self) -> &ash::Device {
        &self.device
    }

    /// Wait for device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }?;
        Ok(())
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        log::info!("Destroying logical device...");

        // Wait for device to finish
        if let Err(err) = self.wait_idle() {
            log::warn!("Device did not go idle before destruction: {}", err);
        }

        unsafe { self.device.destroy_device(None) };
    }
}
