// Vulkan instance
//
// Owns the loaded entry and the VkInstance. Everything created from the
// instance (surface, logical device) must be dropped before this.

use super::error::{BackendError, Result};
use super::probe::raw_name;
use super::selection::missing_names;
use ash::{vk, Entry};
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

/// Khronos validation layer, enabled when `[debug] validation_layers` is set.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// How to build the instance.
#[derive(Debug, Clone)]
pub struct InstanceDesc<'a> {
    pub app_name: &'a str,
    pub engine_name: &'a str,
    pub enable_validation: bool,
    /// Display the instance will create surfaces for. `None` for headless.
    pub display: Option<RawDisplayHandle>,
}

/// Loaded Vulkan entry + instance, destroyed on drop.
pub struct VulkanInstance {
    instance: ash::Instance,
    entry: Entry,
    enabled_layers: Vec<CString>,
}

impl VulkanInstance {
    pub fn new(desc: &InstanceDesc<'_>) -> Result<Self> {
        log::info!("Creating Vulkan instance: {}", desc.app_name);

        let entry = unsafe { Entry::load() }?;

        let enabled_layers = if desc.enable_validation {
            let available = layer_names(&entry)?;
            let missing = missing_names(&[VALIDATION_LAYER.to_string_lossy()], &available);
            if !missing.is_empty() {
                return Err(BackendError::MissingValidationLayers(missing));
            }
            log::info!("Validation layers are enabled");
            vec![VALIDATION_LAYER.to_owned()]
        } else {
            Vec::new()
        };

        let extensions = required_extensions(&entry, desc.display)?;

        let app_name = c_string(desc.app_name)?;
        let engine_name = c_string(desc.engine_name)?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(&engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let layer_ptrs: Vec<*const c_char> = enabled_layers.iter().map(|l| l.as_ptr()).collect();

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }?;

        Ok(Self {
            instance,
            entry,
            enabled_layers,
        })
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn raw(&self) -> &ash::Instance {
        &self.instance
    }

    /// Layers enabled on the instance. Passed on to the logical device for
    /// implementations that still distinguish device layers.
    pub fn enabled_layers(&self) -> &[CString] {
        &self.enabled_layers
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::debug!("Destroying Vulkan instance");
        unsafe { self.instance.destroy_instance(None) };
    }
}

fn c_string(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| BackendError::InvalidName(name.to_string()))
}

fn layer_names(entry: &Entry) -> Result<Vec<String>> {
    let layers = unsafe { entry.enumerate_instance_layer_properties() }?;
    Ok(layers
        .iter()
        .map(|layer| raw_name(&layer.layer_name))
        .collect())
}

/// Window-system extensions for `display`, checked against what the loader
/// supports. Each one is logged with its support status.
fn required_extensions(
    entry: &Entry,
    display: Option<RawDisplayHandle>,
) -> Result<Vec<*const c_char>> {
    let required: Vec<*const c_char> = match display {
        Some(display) => ash_window::enumerate_required_extensions(display)?.to_vec(),
        None => Vec::new(),
    };

    let supported: Vec<String> = unsafe { entry.enumerate_instance_extension_properties(None) }?
        .iter()
        .map(|ext| raw_name(&ext.extension_name))
        .collect();

    let required_names: Vec<String> = required
        .iter()
        .map(|&ptr| unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
        .collect();

    let missing = missing_names(&required_names, &supported);
    log::info!("Required instance extensions:");
    for name in &required_names {
        let status = if missing.contains(name) { "not supported" } else { "supported" };
        log::info!("\t{} ({})", name, status);
    }

    if !missing.is_empty() {
        return Err(BackendError::MissingInstanceExtensions(missing));
    }

    Ok(required)
}
