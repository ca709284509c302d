// Physical device selection
//
// Walks the GPUs an instance exposes, in the order the driver reports them,
// and returns the FIRST one whose queue families, extensions and swapchain
// support satisfy the caller. There is no scoring: a discrete GPU listed
// after a suitable integrated one is never picked.
//
// All Vulkan queries go through `DeviceProbe` so the search itself stays a
// pure function of what the driver reports.

use super::error::SelectionError;
use ash::vk;
use std::collections::HashSet;

/// Something a queue family can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueCapability {
    Graphics,
    /// Presenting images to the probe's surface
    Present,
    Compute,
    Transfer,
}

impl QueueCapability {
    /// Capabilities that can be read straight off the family flags.
    /// `Present` needs a surface query and is handled by the caller.
    fn matches_flags(self, flags: vk::QueueFlags) -> bool {
        match self {
            Self::Graphics => flags.contains(vk::QueueFlags::GRAPHICS),
            Self::Compute => flags.contains(vk::QueueFlags::COMPUTE),
            // Graphics and compute families accept transfer commands even
            // when the driver does not report the bit.
            Self::Transfer => flags.intersects(
                vk::QueueFlags::TRANSFER | vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
            ),
            Self::Present => false,
        }
    }
}

/// What the caller needs from a physical device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFamilyRequirements {
    capabilities: Vec<QueueCapability>,
    extensions: Vec<String>,
    swapchain: bool,
    prefer_shared_family: bool,
}

impl QueueFamilyRequirements {
    /// No requirements: any device with at least one queue family qualifies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a queue family with `capability`. Duplicates are ignored.
    pub fn require(mut self, capability: QueueCapability) -> Self {
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
        self
    }

    /// Require a device extension, e.g. `VK_KHR_swapchain`.
    pub fn require_extension(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.extensions.contains(&name) {
            self.extensions.push(name);
        }
        self
    }

    /// Require at least one surface format and one present mode.
    pub fn require_swapchain(mut self, required: bool) -> Self {
        self.swapchain = required;
        self
    }

    /// Prefer a single family covering every capability over the
    /// first-match binding. Falls back to first-match when no family
    /// covers them all.
    pub fn prefer_shared_family(mut self, prefer: bool) -> Self {
        self.prefer_shared_family = prefer;
        self
    }

    pub fn capabilities(&self) -> &[QueueCapability] {
        &self.capabilities
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn needs_swapchain(&self) -> bool {
        self.swapchain
    }

    pub fn prefers_shared_family(&self) -> bool {
        self.prefer_shared_family
    }

    pub fn requires(&self, capability: QueueCapability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Queue family index resolved for each capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
    pub compute: Option<u32>,
    pub transfer: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn get(&self, capability: QueueCapability) -> Option<u32> {
        match capability {
            QueueCapability::Graphics => self.graphics,
            QueueCapability::Present => self.present,
            QueueCapability::Compute => self.compute,
            QueueCapability::Transfer => self.transfer,
        }
    }

    fn set(&mut self, capability: QueueCapability, index: u32) {
        let slot = match capability {
            QueueCapability::Graphics => &mut self.graphics,
            QueueCapability::Present => &mut self.present,
            QueueCapability::Compute => &mut self.compute,
            QueueCapability::Transfer => &mut self.transfer,
        };
        *slot = Some(index);
    }

    /// True iff every capability in `required` has an index.
    pub fn is_complete(&self, required: &[QueueCapability]) -> bool {
        required.iter().all(|&cap| self.get(cap).is_some())
    }

    /// Distinct resolved indices in ascending order. One queue is created
    /// per entry.
    pub fn unique(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = [self.graphics, self.present, self.compute, self.transfer]
            .into_iter()
            .flatten()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// The device chosen by `select_device`, with complete queue families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDevice {
    pub physical_device: vk::PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
}

/// Why a single candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoQueueFamilies,
    IncompleteQueueFamilies(QueueFamilyIndices),
    MissingExtensions(Vec<String>),
    NoSwapchainSupport,
    QueryFailed(vk::Result),
}

/// Read-only view of the driver used by the selector.
///
/// `InstanceProbe` is the real implementation; tests use an in-memory one.
pub trait DeviceProbe {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>, vk::Result>;

    fn queue_families(&self, device: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;

    /// Whether `family_index` on `device` can present to the probe's surface.
    fn supports_present(
        &self,
        device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, vk::Result>;

    fn extension_names(&self, device: vk::PhysicalDevice) -> Result<Vec<String>, vk::Result>;

    fn surface_formats(
        &self,
        device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>, vk::Result>;

    fn present_modes(&self, device: vk::PhysicalDevice)
        -> Result<Vec<vk::PresentModeKHR>, vk::Result>;
}

/// First-match device search over a probe.
pub struct DeviceSelector<'a, P: DeviceProbe + ?Sized> {
    probe: &'a P,
    requirements: &'a QueueFamilyRequirements,
}

impl<'a, P: DeviceProbe + ?Sized> DeviceSelector<'a, P> {
    pub fn new(probe: &'a P, requirements: &'a QueueFamilyRequirements) -> Self {
        Self { probe, requirements }
    }

    /// Return the first suitable device in enumeration order.
    ///
    /// Why each earlier candidate was passed over is not reported; call
    /// `evaluate` on the enumerated devices to get the `Rejection` reasons.
    pub fn select(&self) -> Result<SelectedDevice, SelectionError> {
        let devices = self
            .probe
            .physical_devices()
            .map_err(SelectionError::Enumeration)?;

        if devices.is_empty() {
            return Err(SelectionError::NoDevicesFound);
        }

        devices
            .into_iter()
            .find_map(|device| {
                self.evaluate(device).ok().map(|queue_families| SelectedDevice {
                    physical_device: device,
                    queue_families,
                })
            })
            .ok_or(SelectionError::NoSuitableDevice)
    }

    /// Check one device against the requirements.
    pub fn evaluate(&self, device: vk::PhysicalDevice) -> Result<QueueFamilyIndices, Rejection> {
        let families = self.probe.queue_families(device);
        if families.is_empty() {
            return Err(Rejection::NoQueueFamilies);
        }

        let indices = self
            .resolve_queue_families(device, &families)
            .map_err(Rejection::QueryFailed)?;
        if !indices.is_complete(self.requirements.capabilities()) {
            return Err(Rejection::IncompleteQueueFamilies(indices));
        }

        if !self.requirements.extensions().is_empty() {
            let available = self
                .probe
                .extension_names(device)
                .map_err(Rejection::QueryFailed)?;
            let missing = missing_names(self.requirements.extensions(), &available);
            if !missing.is_empty() {
                return Err(Rejection::MissingExtensions(missing));
            }
        }

        if self.requirements.needs_swapchain() {
            let formats = self
                .probe
                .surface_formats(device)
                .map_err(Rejection::QueryFailed)?;
            let modes = self
                .probe
                .present_modes(device)
                .map_err(Rejection::QueryFailed)?;
            if formats.is_empty() || modes.is_empty() {
                return Err(Rejection::NoSwapchainSupport);
            }
        }

        Ok(indices)
    }

    /// Scan the families once, binding each capability to the first family
    /// that supports it. One family may take several capabilities.
    fn resolve_queue_families(
        &self,
        device: vk::PhysicalDevice,
        families: &[vk::QueueFamilyProperties],
    ) -> Result<QueueFamilyIndices, vk::Result> {
        let required = self.requirements.capabilities();

        if self.requirements.prefers_shared_family() && !required.is_empty() {
            for (index, family) in families.iter().enumerate() {
                let index = index as u32;
                if self.family_supports_all(device, index, family, required)? {
                    let mut indices = QueueFamilyIndices::default();
                    for &cap in required {
                        indices.set(cap, index);
                    }
                    return Ok(indices);
                }
            }
        }

        let mut indices = QueueFamilyIndices::default();
        for (index, family) in families.iter().enumerate() {
            if indices.is_complete(required) {
                break;
            }
            let index = index as u32;
            for &cap in required {
                if indices.get(cap).is_none() && self.family_supports(device, index, family, cap)? {
                    indices.set(cap, index);
                }
            }
        }

        Ok(indices)
    }

    fn family_supports_all(
        &self,
        device: vk::PhysicalDevice,
        index: u32,
        family: &vk::QueueFamilyProperties,
        required: &[QueueCapability],
    ) -> Result<bool, vk::Result> {
        for &cap in required {
            if !self.family_supports(device, index, family, cap)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn family_supports(
        &self,
        device: vk::PhysicalDevice,
        index: u32,
        family: &vk::QueueFamilyProperties,
        capability: QueueCapability,
    ) -> Result<bool, vk::Result> {
        match capability {
            QueueCapability::Present => self.probe.supports_present(device, index),
            other => Ok(other.matches_flags(family.queue_flags)),
        }
    }
}

/// Pick the first suitable physical device. See `DeviceSelector`.
pub fn select_device<P: DeviceProbe + ?Sized>(
    probe: &P,
    requirements: &QueueFamilyRequirements,
) -> Result<SelectedDevice, SelectionError> {
    DeviceSelector::new(probe, requirements).select()
}

/// Names from `required` that do not appear in `available`, in request order.
pub fn missing_names<S: AsRef<str>>(required: &[S], available: &[String]) -> Vec<String> {
    let available: HashSet<&str> = available.iter().map(String::as_str).collect();
    required
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !available.contains(name))
        .map(str::to_owned)
        .collect()
}
