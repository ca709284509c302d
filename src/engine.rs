// Engine - owns the Vulkan objects for one window
//
// Construction order: instance -> surface -> physical device -> logical device.
// Field order below is the reverse, so drop tears down correctly, including
// when construction fails halfway (already-built wrappers drop themselves).

use crate::backend::{
    select_device, InstanceDesc, InstanceProbe, LogicalDevice, SelectedDevice, Surface,
    SwapchainSupport, VulkanInstance,
};
use crate::config::Config;
use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub struct Engine {
    // Held for drop order only
    _device: LogicalDevice,
    selected: SelectedDevice,
    _surface: Surface,
    _instance: VulkanInstance,
}

impl Engine {
    /// Bring up Vulkan for `window`, whose drawable size is `width` x `height`.
    pub fn new<W>(config: &Config, window: &W, width: u32, height: u32) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        log::info!("Initializing Vulkan...");

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Instance
        // ─────────────────────────────────────────────────────────────────────
        let display = window
            .display_handle()
            .context("Failed to get display handle")?
            .as_raw();
        let instance = VulkanInstance::new(&InstanceDesc {
            app_name: &config.window.title,
            engine_name: &config.engine.name,
            enable_validation: config.debug.validation_layers,
            display: Some(display),
        })
        .context("Failed to create Vulkan instance")?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Surface
        // ─────────────────────────────────────────────────────────────────────
        let surface = Surface::new(&instance, window).context("Failed to create surface")?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Pick physical device (first suitable one)
        // ─────────────────────────────────────────────────────────────────────
        let requirements = config.requirements();
        let probe = InstanceProbe::new(instance.raw(), Some(&surface));
        let selected = select_device(&probe, &requirements).context("Failed to pick a GPU")?;

        log::info!("Selected GPU: {}", probe.describe(selected.physical_device));

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Logical device
        // ─────────────────────────────────────────────────────────────────────
        let device = LogicalDevice::new(&instance, &selected, requirements.extensions())
            .context("Failed to create logical device")?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 5: Report what a swapchain would use
        // ─────────────────────────────────────────────────────────────────────
        if requirements.needs_swapchain() {
            let support = SwapchainSupport::query(&surface, selected.physical_device)
                .context("Failed to query swapchain support")?;
            match support.configure(config.present_mode(), width, height) {
                Some(swapchain) => log::info!(
                    "Swapchain: {:?} / {:?}, {}x{}, {} images",
                    swapchain.format.format,
                    swapchain.present_mode,
                    swapchain.extent.width,
                    swapchain.extent.height,
                    swapchain.image_count
                ),
                None => log::warn!("Surface reports no formats"),
            }
        }

        log::info!("Vulkan initialized successfully!");

        Ok(Self {
            _device: device,
            selected,
            _surface: surface,
            _instance: instance,
        })
    }

    /// The physical device and queue families in use
    pub fn selected(&self) -> &SelectedDevice {
        &self.selected
    }
}
