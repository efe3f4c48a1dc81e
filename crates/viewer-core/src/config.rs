//! Viewer configuration.
//!
//! Parsed from JSON. Every field except `target` has a default; `single` is
//! tri-state because leaving it out enables responsive switching, which is
//! different from pinning double-page mode with `false`.

use crate::error::{ViewerError, ViewerResult};
use flipbook_cache::CacheConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_BREAKPOINT: f32 = 900.0;

/// Locates the container the viewer mounts into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountTarget {
    /// Host-specific selector, e.g. `"#flipbook"`
    Selector(String),
    /// Container handle already known to the host
    Handle(u64),
}

impl std::fmt::Display for MountTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Selector(selector) => f.write_str(selector),
            Self::Handle(handle) => write!(f, "handle {handle}"),
        }
    }
}

impl From<&str> for MountTarget {
    fn from(value: &str) -> Self {
        Self::Selector(value.to_owned())
    }
}

/// Single-page display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingleMode {
    /// Follow the viewport against the breakpoint
    #[default]
    Auto,
    /// Pinned: `Fixed(true)` is single page, `Fixed(false)` is double page
    Fixed(bool),
}

impl From<Option<bool>> for SingleMode {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Auto, Self::Fixed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub target: Option<MountTarget>,
    #[serde(alias = "pdfUrl")]
    pub pdf_url: Option<PathBuf>,
    pub single: Option<bool>,
    pub breakpoint: f32,
    pub zoom: f32,
    /// Surface cache budget; falls back to `FLIPBOOK_CACHE_MB`, then 128 MB
    #[serde(alias = "cacheBudgetMb")]
    pub cache_budget_mb: Option<usize>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            target: None,
            pdf_url: None,
            single: None,
            breakpoint: DEFAULT_BREAKPOINT,
            zoom: 1.0,
            cache_budget_mb: None,
        }
    }
}

impl ViewerConfig {
    pub fn new(target: impl Into<MountTarget>) -> Self {
        Self { target: Some(target.into()), ..Self::default() }
    }

    pub fn with_pdf_url(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf_url = Some(path.into());
        self
    }

    pub fn with_single(mut self, single: bool) -> Self {
        self.single = Some(single);
        self
    }

    pub fn with_breakpoint(mut self, breakpoint: f32) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_cache_budget_mb(mut self, mb: usize) -> Self {
        self.cache_budget_mb = Some(mb);
        self
    }

    pub fn from_json(json: &str) -> ViewerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ViewerResult<()> {
        if !self.breakpoint.is_finite() || self.breakpoint < 0.0 {
            return Err(ViewerError::invalid_config(format!(
                "breakpoint must be a non-negative number, got {}",
                self.breakpoint
            )));
        }
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(ViewerError::InvalidZoom(self.zoom));
        }
        if self.cache_budget_mb == Some(0) {
            return Err(ViewerError::invalid_config("cache_budget_mb must be at least 1"));
        }
        Ok(())
    }

    pub fn single_mode(&self) -> SingleMode {
        SingleMode::from(self.single)
    }

    pub fn cache_config(&self) -> CacheConfig {
        if let Some(mb) = self.cache_budget_mb {
            return CacheConfig::new(mb);
        }

        CacheConfig::from_env().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring cache budget from environment");
            CacheConfig::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ViewerConfig::default();

        assert_eq!(config.breakpoint, 900.0);
        assert_eq!(config.zoom, 1.0);
        assert_eq!(config.single_mode(), SingleMode::Auto);
        assert!(config.target.is_none());
    }

    #[test]
    fn parses_browser_style_keys() {
        let config = ViewerConfig::from_json(
            r##"{ "target": "#book", "pdfUrl": "docs/manual.pdf", "single": true, "breakpoint": 720 }"##,
        )
        .expect("config should parse");

        assert_eq!(config.target, Some(MountTarget::Selector("#book".into())));
        assert_eq!(config.pdf_url, Some(PathBuf::from("docs/manual.pdf")));
        assert_eq!(config.single_mode(), SingleMode::Fixed(true));
        assert_eq!(config.breakpoint, 720.0);
    }

    #[test]
    fn explicit_false_differs_from_absent() {
        let pinned = ViewerConfig::from_json(r#"{ "target": 3, "single": false }"#).unwrap();
        let auto = ViewerConfig::from_json(r#"{ "target": 3 }"#).unwrap();

        assert_eq!(pinned.target, Some(MountTarget::Handle(3)));
        assert_eq!(pinned.single_mode(), SingleMode::Fixed(false));
        assert_eq!(auto.single_mode(), SingleMode::Auto);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = ViewerConfig::new("#book").with_zoom(0.0).validate().unwrap_err();
        assert!(matches!(err, ViewerError::InvalidZoom(_)));

        let err = ViewerConfig::new("#book").with_breakpoint(-1.0).validate().unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));

        let err = ViewerConfig::new("#book").with_cache_budget_mb(0).validate().unwrap_err();
        assert!(matches!(err, ViewerError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = ViewerConfig::from_json(r##"{ "target": "#book", "zoomLevel": 2 }"##).unwrap_err();
        assert!(matches!(err, ViewerError::ConfigParse(_)));
    }

    #[test]
    fn explicit_cache_budget_wins() {
        let config = ViewerConfig::new("#book").with_cache_budget_mb(8);
        assert_eq!(config.cache_config(), CacheConfig::new(8));
    }
}
