// Window layout - Which editor windows are open and where
//
// Only the data is kept here; drawing the windows is left to the front end.

use serde::{Deserialize, Serialize};

/// One open window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    /// Window identifier, e.g. "sequencer-3" or "mixer"
    pub id: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
    #[serde(default)]
    pub minimized: bool,
}

impl WindowState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            width: default_width(),
            height: default_height(),
            minimized: false,
        }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

fn default_width() -> f32 {
    640.0
}

fn default_height() -> f32 {
    400.0
}

/// Open windows in stacking order (last is on top)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowLayout {
    windows: Vec<WindowState>,
}

impl WindowLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows(&self) -> &[WindowState] {
        &self.windows
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.windows.iter().any(|w| w.id == id)
    }

    /// Open a window, or raise it if it is already open
    pub fn open(&mut self, window: WindowState) {
        self.windows.retain(|w| w.id != window.id);
        self.windows.push(window);
    }

    pub fn close(&mut self, id: &str) -> bool {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        self.windows.len() < before
    }

    pub fn close_all(&mut self) {
        self.windows.clear();
    }

    /// Replace the layout; None closes everything
    pub fn restore(&mut self, windows: Option<&[WindowState]>) {
        match windows {
            Some(windows) => self.windows = windows.to_vec(),
            None => self.close_all(),
        }
    }

    pub fn to_data(&self) -> Vec<WindowState> {
        self.windows.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_raises_existing_window() {
        let mut layout = WindowLayout::new();
        layout.open(WindowState::new("mixer"));
        layout.open(WindowState::new("sequencer-1"));
        layout.open(WindowState::new("mixer").at(10.0, 20.0));

        let ids: Vec<_> = layout.windows().iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["sequencer-1", "mixer"]);
        assert_eq!(layout.windows()[1].x, 10.0);
    }

    #[test]
    fn test_restore_none_closes_all() {
        let mut layout = WindowLayout::new();
        layout.open(WindowState::new("mixer"));
        layout.restore(None);
        assert!(layout.windows().is_empty());

        layout.restore(Some(&[WindowState::new("piano-roll")]));
        assert!(layout.is_open("piano-roll"));
        assert!(!layout.close("mixer"));
    }
}
