// Driver-backed DeviceProbe
//
// Thin read-only queries against a live instance (and optionally a
// surface). Nothing here is created or destroyed.

use super::selection::DeviceProbe;
use super::surface::Surface;
use ash::vk;
use std::ffi::{c_char, CStr};
use std::fmt;

/// `DeviceProbe` over a real `ash::Instance`.
///
/// Without a surface no family can present and the surface queries
/// return empty lists, so `Present` and swapchain requirements fail.
pub struct InstanceProbe<'a> {
    instance: &'a ash::Instance,
    surface: Option<&'a Surface>,
}

impl<'a> InstanceProbe<'a> {
    pub fn new(instance: &'a ash::Instance, surface: Option<&'a Surface>) -> Self {
        Self { instance, surface }
    }

    /// Human-readable properties of a device, for logging.
    pub fn describe(&self, device: vk::PhysicalDevice) -> DeviceInfo {
        let properties = unsafe { self.instance.get_physical_device_properties(device) };
        DeviceInfo::from_properties(&properties)
    }
}

impl DeviceProbe for InstanceProbe<'_> {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, vk::Result> {
        unsafe { self.instance.enumerate_physical_devices() }
    }

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(device)
        }
    }

    fn supports_present(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, vk::Result> {
        match self.surface {
            Some(surface) => unsafe {
                surface.loader().get_physical_device_surface_support(
                    device,
                    family_index,
                    surface.handle(),
                )
            },
            None => Ok(false),
        }
    }

    fn extension_names(&self, device: vk::PhysicalDevice) -> Result<Vec<String>, vk::Result> {
        let extensions = unsafe { self.instance.enumerate_device_extension_properties(device) }?;
        Ok(extensions
            .iter()
            .map(|ext| raw_name(&ext.extension_name))
            .collect())
    }

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, vk::Result> {
        match self.surface {
            Some(surface) => unsafe {
                surface
                    .loader()
                    .get_physical_device_surface_formats(device, surface.handle())
            },
            None => Ok(Vec::new()),
        }
    }

    fn present_modes(
        &self,
        device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>, vk::Result> {
        match self.surface {
            Some(surface) => unsafe {
                surface
                    .loader()
                    .get_physical_device_surface_present_modes(device, surface.handle())
            },
            None => Ok(Vec::new()),
        }
    }
}

/// Name, type and versions of a physical device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub vendor_id: u32,
    pub api_version: u32,
}

impl DeviceInfo {
    pub fn from_properties(properties: &vk::PhysicalDeviceProperties) -> Self {
        Self {
            name: raw_name(&properties.device_name),
            device_type: properties.device_type,
            vendor_id: properties.vendor_id,
            api_version: properties.api_version,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "other",
        }
    }
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, vendor {:#06x}) - Vulkan {}.{}.{}",
            self.name,
            self.type_name(),
            self.vendor_id,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

/// Name from a fixed-size, NUL-terminated Vulkan string array.
pub(crate) fn raw_name(raw: &[c_char]) -> String {
    let name = unsafe { CStr::from_ptr(raw.as_ptr()) };
    name.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_reads_the_name_and_version() {
        let mut properties = vk::PhysicalDeviceProperties {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            vendor_id: 0x10DE,
            api_version: vk::make_api_version(0, 1, 3, 250),
            ..Default::default()
        };
        for (dst, &src) in properties.device_name.iter_mut().zip(b"Test GPU\0") {
            *dst = src as std::ffi::c_char;
        }

        let info = DeviceInfo::from_properties(&properties);
        assert_eq!(info.name, "Test GPU");
        assert_eq!(info.type_name(), "discrete GPU");
        assert_eq!(
            info.to_string(),
            "Test GPU (discrete GPU, vendor 0x10de) - Vulkan 1.3.250"
        );
    }
}
