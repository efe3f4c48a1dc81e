//! Host platform contract.
//!
//! The host owns the real container and window. The viewer only asks it for
//! sizes, the device pixel ratio and fullscreen transitions, and drains the
//! notifications (resize, fullscreen change) the host has queued.

use crate::config::MountTarget;
use crate::geometry::ContainerSize;
use crate::navigation::ViewerEvent;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("fullscreen is not supported by this host")]
    FullscreenUnsupported,
    #[error("host rejected the request: {0}")]
    Rejected(String),
}

pub trait Host {
    fn resolve_target(&mut self, target: &MountTarget) -> Option<ContainerId>;

    /// Window width used for the responsive breakpoint.
    fn viewport_width(&self) -> f32;

    fn container_size(&self, container: ContainerId) -> ContainerSize;

    fn device_pixel_ratio(&self) -> f32;

    fn supports_fullscreen(&self) -> bool;

    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self, container: ContainerId) -> Result<(), HostError>;

    fn exit_fullscreen(&mut self) -> Result<(), HostError>;

    /// Pending platform notifications, oldest first.
    fn drain_events(&mut self) -> Vec<ViewerEvent> {
        Vec::new()
    }
}

/// Selector the headless host registers by default.
pub const DEFAULT_SELECTOR: &str = "#flipbook";

/// In-process host with fixed sizes, used by the CLI and tests.
///
/// Fullscreen swaps the container size for the screen size and queues a
/// [`ViewerEvent::FullscreenChanged`]; [`HeadlessHost::resize`] queues a
/// [`ViewerEvent::Resize`].
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    targets: HashMap<String, ContainerId>,
    viewport_width: f32,
    container: ContainerSize,
    screen: ContainerSize,
    device_pixel_ratio: f32,
    fullscreen_supported: bool,
    fullscreen: bool,
    events: VecDeque<ViewerEvent>,
}

impl HeadlessHost {
    pub fn new(viewport_width: f32, container: ContainerSize) -> Self {
        let mut targets = HashMap::new();
        targets.insert(DEFAULT_SELECTOR.to_owned(), ContainerId(1));

        Self {
            targets,
            viewport_width,
            container,
            screen: container,
            device_pixel_ratio: 1.0,
            fullscreen_supported: true,
            fullscreen: false,
            events: VecDeque::new(),
        }
    }

    pub fn with_target(mut self, selector: impl Into<String>, id: u64) -> Self {
        self.targets.insert(selector.into(), ContainerId(id));
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f32) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    pub fn with_screen(mut self, screen: ContainerSize) -> Self {
        self.screen = screen;
        self
    }

    pub fn without_fullscreen(mut self) -> Self {
        self.fullscreen_supported = false;
        self
    }

    /// Simulates a window resize and queues the notification.
    pub fn resize(&mut self, viewport_width: f32, container: ContainerSize) {
        self.viewport_width = viewport_width;
        self.container = container;
        self.events.push_back(ViewerEvent::Resize);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

impl Host for HeadlessHost {
    fn resolve_target(&mut self, target: &MountTarget) -> Option<ContainerId> {
        match target {
            MountTarget::Selector(selector) => self.targets.get(selector).copied(),
            MountTarget::Handle(handle) => {
                self.targets.values().copied().find(|id| id.0 == *handle)
            }
        }
    }

    fn viewport_width(&self) -> f32 {
        self.viewport_width
    }

    fn container_size(&self, _container: ContainerId) -> ContainerSize {
        if self.fullscreen {
            self.screen
        } else {
            self.container
        }
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    fn supports_fullscreen(&self) -> bool {
        self.fullscreen_supported
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self, _container: ContainerId) -> Result<(), HostError> {
        if !self.fullscreen_supported {
            return Err(HostError::FullscreenUnsupported);
        }
        if !self.fullscreen {
            self.fullscreen = true;
            self.events.push_back(ViewerEvent::FullscreenChanged);
        }
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), HostError> {
        if !self.fullscreen_supported {
            return Err(HostError::FullscreenUnsupported);
        }
        if self.fullscreen {
            self.fullscreen = false;
            self.events.push_back(ViewerEvent::FullscreenChanged);
        }
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.events.drain(..).collect()
    }
}
