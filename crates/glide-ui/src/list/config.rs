use glide_core::{Color, Easing};
use serde::{Deserialize, Serialize};

/// How far ahead of the viewport rows are materialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Virtualization {
    /// Keep `read_ahead_screens` viewports' worth of rows below the top edge.
    #[default]
    ReadAhead,
    /// Only what is on screen.
    VisibleOnly,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    pub tick_interval_ms: u64,
    pub snap_duration_ms: u64,
    pub momentum_decay: f32,
    pub velocity_samples: usize,
    /// Momentum stops once |velocity| drops to this (px per tick).
    pub min_velocity: f32,
    /// Pointer travel (before DPI scaling) that turns a press into a drag.
    pub drag_threshold: f32,
    pub dpi_scale: f32,
    pub virtualization: Virtualization,
    pub read_ahead_screens: f32,
    pub easing: Easing,
    pub background: Color,
    pub selection_color: Color,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            snap_duration_ms: 300,
            momentum_decay: 0.85,
            velocity_samples: 5,
            min_velocity: 1.0,
            drag_threshold: 7.0,
            dpi_scale: 1.0,
            virtualization: Virtualization::ReadAhead,
            read_ahead_screens: 2.0,
            easing: Easing::ExpoOut,
            background: Color::WHITE,
            selection_color: Color::HIGHLIGHT,
        }
    }
}

impl ListConfig {
    pub fn drag_lock_distance(&self) -> f32 {
        self.drag_threshold * self.dpi_scale
    }

    /// Bottom edge (relative to the viewport top) rows are materialized to.
    pub fn window_extent(&self, viewport_height: f32) -> f32 {
        match self.virtualization {
            Virtualization::ReadAhead => viewport_height * self.read_ahead_screens.max(1.0),
            Virtualization::VisibleOnly => viewport_height,
        }
    }
}
