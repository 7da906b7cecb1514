//! Per-viewport layout records for grid items.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Layout mode used for rendering and interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    #[default]
    Desktop,
    Mobile,
}

impl Viewport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Viewport::Desktop => "desktop",
            Viewport::Mobile => "mobile",
        }
    }

    /// The other viewport.
    pub fn toggled(self) -> Self {
        match self {
            Viewport::Desktop => Viewport::Mobile,
            Viewport::Mobile => Viewport::Desktop,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Viewport::Desktop),
            "mobile" => Ok(Viewport::Mobile),
            other => Err(format!("unknown viewport '{}'", other)),
        }
    }
}

/// A fully specified rectangle in grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// Desktop layout. Always fully specified.
pub type DesktopLayout = GridRect;

/// Mobile layout.
///
/// When `customized` is false the position comes from the host's
/// auto-stacking pass and the stored fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MobileLayout {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub customized: bool,
}

impl MobileLayout {
    /// A customized mobile layout at the given rectangle.
    pub fn custom(rect: GridRect) -> Self {
        Self {
            x: Some(rect.x),
            y: Some(rect.y),
            width: Some(rect.width),
            height: Some(rect.height),
            customized: true,
        }
    }

    /// The explicit rectangle, if customized and every field is present.
    pub fn rect(&self) -> Option<GridRect> {
        if !self.customized {
            return None;
        }
        Some(GridRect::new(self.x?, self.y?, self.width?, self.height?))
    }
}

/// Both layout records of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemLayouts {
    pub desktop: DesktopLayout,
    pub mobile: MobileLayout,
}

impl ItemLayouts {
    /// Layouts with the given desktop rectangle and an auto-stacked mobile layout.
    pub fn from_desktop(desktop: GridRect) -> Self {
        Self {
            desktop,
            mobile: MobileLayout::default(),
        }
    }

    /// The stored rectangle for `viewport`.
    ///
    /// Returns `None` for a mobile layout that is still auto-stacked.
    pub fn rect_for(&self, viewport: Viewport) -> Option<GridRect> {
        match viewport {
            Viewport::Desktop => Some(self.desktop),
            Viewport::Mobile => self.mobile.rect(),
        }
    }

    /// Write the rectangle for `viewport`. Writing mobile marks it customized.
    pub fn set_rect(&mut self, viewport: Viewport, rect: GridRect) {
        match viewport {
            Viewport::Desktop => self.desktop = rect,
            Viewport::Mobile => self.mobile = MobileLayout::custom(rect),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_serde() {
        assert_eq!(serde_json::to_string(&Viewport::Mobile).unwrap(), "\"mobile\"");
        let v: Viewport = serde_json::from_str("\"desktop\"").unwrap();
        assert_eq!(v, Viewport::Desktop);
        assert!(serde_json::from_str::<Viewport>("\"tablet\"").is_err());
    }

    #[test]
    fn test_viewport_parse_and_toggle() {
        assert_eq!("mobile".parse::<Viewport>(), Ok(Viewport::Mobile));
        assert!("Mobile".parse::<Viewport>().is_err());
        assert_eq!(Viewport::Desktop.toggled(), Viewport::Mobile);
    }

    #[test]
    fn test_mobile_auto_stacked_has_no_rect() {
        let layouts = ItemLayouts::from_desktop(GridRect::new(1, 2, 10, 4));
        assert_eq!(layouts.rect_for(Viewport::Desktop), Some(GridRect::new(1, 2, 10, 4)));
        assert_eq!(layouts.rect_for(Viewport::Mobile), None);
    }

    #[test]
    fn test_set_mobile_rect_marks_customized() {
        let mut layouts = ItemLayouts::default();
        layouts.set_rect(Viewport::Mobile, GridRect::new(0, 5, 12, 3));
        assert!(layouts.mobile.customized);
        assert_eq!(layouts.rect_for(Viewport::Mobile), Some(GridRect::new(0, 5, 12, 3)));
    }

    #[test]
    fn test_customized_with_missing_field() {
        let mobile = MobileLayout {
            x: Some(1),
            y: None,
            width: Some(2),
            height: Some(2),
            customized: true,
        };
        assert_eq!(mobile.rect(), None);
    }
}
