//! Popup stack geometry

use serde::{Deserialize, Serialize};

use crate::config::{PopupConfig, WorkArea};

/// A window rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Stacks equal-sized popups upward from the bottom-right of a work area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackLayout {
    pub work_area: WorkArea,
    pub width: i32,
    pub height: i32,
    pub margin: i32,
}

impl StackLayout {
    pub fn from_config(config: &PopupConfig) -> Self {
        Self {
            work_area: config.work_area,
            width: config.width,
            height: config.height,
            margin: config.margin,
        }
    }

    /// Rectangle for the popup `index` places away from the newest (0 = newest)
    pub fn rect_for(&self, index: usize) -> Rect {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        let area = &self.work_area;
        let step = self.height.saturating_add(self.margin);
        Rect {
            x: area.x + area.width - self.width - self.margin,
            y: (area.y + area.height - self.margin - self.height).saturating_sub(index.saturating_mul(step)),
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for StackLayout {
    fn default() -> Self {
        Self::from_config(&PopupConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_positions() {
        let layout = StackLayout::default();

        assert_eq!(
            layout.rect_for(0),
            Rect {
                x: 1920 - 350 - 60,
                y: 1080 - 60 - 120,
                width: 350,
                height: 120,
            }
        );
        assert_eq!(layout.rect_for(1).y, 1080 - 60 - 120 - 180);
        assert_eq!(layout.rect_for(4).y, 900 - 4 * 180);
        assert_eq!(layout.rect_for(4).x, 1510);
    }

    #[test]
    fn test_offset_work_area() {
        let layout = StackLayout {
            work_area: WorkArea {
                x: 100,
                y: 40,
                width: 1000,
                height: 800,
            },
            width: 200,
            height: 100,
            margin: 10,
        };

        let rect = layout.rect_for(2);
        assert_eq!(rect.x, 100 + 1000 - 200 - 10);
        assert_eq!(rect.y, 40 + 800 - 10 - 100 - 2 * 110);
    }

    #[test]
    fn test_display() {
        let rect = Rect {
            x: 5,
            y: 6,
            width: 7,
            height: 8,
        };
        assert_eq!(rect.to_string(), "7x8+5+6");
    }
}
