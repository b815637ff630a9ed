// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-provided scene configuration.

/// Dirty-rectangle policy.
///
/// Partial redraws clip to the union of changed regions. Once too many nodes
/// change in one frame, clipping costs more than it saves and the scheduler
/// redraws everything instead.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirtyRectangleConfig {
    /// Allow partial redraws at all.
    pub enabled: bool,
    /// Redraw everything when more nodes than this are dirty.
    pub dirty_object_num_threshold: usize,
    /// Redraw everything when the dirty share of attached nodes exceeds this.
    pub dirty_object_ratio_threshold: f64,
}

impl Default for DirtyRectangleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dirty_object_num_threshold: 500,
            dirty_object_ratio_threshold: 0.8,
        }
    }
}

/// Configuration consumed from the host container.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// Canvas width in CSS pixels.
    pub width: f64,
    /// Canvas height in CSS pixels.
    pub height: f64,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
    /// Partial redraw policy.
    pub dirty_rectangle: DirtyRectangleConfig,
    /// Skip nodes whose render bounds fall outside the viewport.
    pub enable_culling: bool,
    /// Parse string values with the CSS tokenizer. When off, values go
    /// through the raw-numeric fast path and `calc()` is unavailable.
    pub enable_css_parsing: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 150.0,
            device_pixel_ratio: 1.0,
            dirty_rectangle: DirtyRectangleConfig::default(),
            enable_culling: true,
            enable_css_parsing: true,
        }
    }
}

impl SceneConfig {
    /// Config for a canvas of the given size, other settings default.
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}
