//! Flipbook viewer core
//!
//! Decides which pages a spread shows and at what resolution, renders them
//! into slot surfaces through a bounded cache and drives navigation between
//! single and double page layouts.
//!
//! # Example
//!
//! ```
//! use flipbook_core::{mount, ContainerSize, HeadlessHost, ViewerConfig};
//! use flipbook_engine::{fixtures, LopdfEngine};
//!
//! let host = HeadlessHost::new(1200.0, ContainerSize::new(1000.0, 700.0));
//! let mut viewer = mount(ViewerConfig::new("#flipbook"), host, LopdfEngine::new()).unwrap();
//!
//! viewer.load(fixtures::pdf_with_pages(6)).unwrap();
//! assert!(viewer.flags().cover);
//!
//! viewer.next();
//! assert_eq!(viewer.current_page(), Some(3));
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod navigation;
pub mod pipeline;
mod viewer;

#[cfg(test)]
mod test_support;

pub use config::{MountTarget, SingleMode, ViewerConfig, DEFAULT_BREAKPOINT};
pub use error::{ViewerError, ViewerResult};
pub use geometry::{ClientSize, ContainerSize, PageGeometry, PixelSize};
pub use host::{ContainerId, HeadlessHost, Host, HostError};
pub use layout::{DisplayFlags, Layout, LayoutState, Spread};
pub use navigation::{Command, NavKey, ViewerEvent};
pub use pipeline::{Slot, SlotDisplay, SlotSurface};
pub use viewer::{mount, TurnOverlay, Viewer};
