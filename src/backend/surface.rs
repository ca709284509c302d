// Window surface
//
// Connection between a window and the instance. Needed to ask which queue
// families can present, and what formats a swapchain could use.

use super::error::{BackendError, Result};
use super::instance::VulkanInstance;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// A `VkSurfaceKHR` and its extension loader, destroyed on drop.
///
/// Must be dropped before the `VulkanInstance` it was created from.
pub struct Surface {
    handle: vk::SurfaceKHR,
    loader: ash::khr::surface::Instance,
}

impl Surface {
    pub fn new<W>(instance: &VulkanInstance, window: &W) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| BackendError::SurfaceCreation(format!("no display handle: {e}")))?;
        let window = window
            .window_handle()
            .map_err(|e| BackendError::SurfaceCreation(format!("no window handle: {e}")))?;

        let handle = unsafe {
            ash_window::create_surface(
                instance.entry(),
                instance.raw(),
                display.as_raw(),
                window.as_raw(),
                None,
            )
        }?;
        let loader = ash::khr::surface::Instance::new(instance.entry(), instance.raw());

        Ok(Self { handle, loader })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        log::debug!("Destroying surface");
        unsafe { self.loader.destroy_surface(self.handle, None) };
    }
}
