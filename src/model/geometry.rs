//! Page geometry.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Physical page size, margins and header/footer reservation, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// Page width
    pub width: f64,

    /// Page height
    pub height: f64,

    /// Top margin
    #[serde(default)]
    pub margin_top: f64,

    /// Bottom margin
    #[serde(default)]
    pub margin_bottom: f64,

    /// Left margin
    #[serde(default)]
    pub margin_left: f64,

    /// Right margin
    #[serde(default)]
    pub margin_right: f64,

    /// Space reserved for the running header
    #[serde(default)]
    pub header: f64,

    /// Space reserved for the running footer
    #[serde(default)]
    pub footer: f64,
}

impl PageGeometry {
    /// Create a geometry with the given page size and no margins.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin_top: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
            header: 0.0,
            footer: 0.0,
        }
    }

    /// US Letter (8.5 x 11 inches) with 1 inch margins.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0).with_margins(72.0) // 8.5 * 72, 11 * 72
    }

    /// A4 (210 x 297 mm) with 1 inch margins.
    pub fn a4() -> Self {
        Self::new(595.0, 842.0).with_margins(72.0)
    }

    /// Set all four margins.
    pub fn with_margins(mut self, margin: f64) -> Self {
        self.margin_top = margin;
        self.margin_bottom = margin;
        self.margin_left = margin;
        self.margin_right = margin;
        self
    }

    /// Reserve space for header and footer.
    pub fn with_header_footer(mut self, header: f64, footer: f64) -> Self {
        self.header = header;
        self.footer = footer;
        self
    }

    /// Swap page width and height.
    pub fn landscape(mut self) -> Self {
        if self.height > self.width {
            std::mem::swap(&mut self.width, &mut self.height);
        }
        self
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Height available for flowing content (the content frame).
    pub fn content_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom - self.header - self.footer
    }

    /// Width available for flowing content.
    pub fn content_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    /// Reject geometry that leaves no content frame.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.width,
            self.height,
            self.margin_top,
            self.margin_bottom,
            self.margin_left,
            self.margin_right,
            self.header,
            self.footer,
        ];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(Error::InvalidGeometry(
                "dimensions must be finite and non-negative".into(),
            ));
        }
        if self.content_height() <= 0.0 || self.content_width() <= 0.0 {
            return Err(Error::InvalidGeometry(format!(
                "content frame {:.1}x{:.1} is empty",
                self.content_width(),
                self.content_height()
            )));
        }
        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_content_frame() {
        let g = PageGeometry::letter().with_header_footer(18.0, 18.0);
        assert_eq!(g.content_width(), 468.0);
        assert_eq!(g.content_height(), 612.0);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn test_landscape() {
        let g = PageGeometry::a4().landscape();
        assert!(g.is_landscape());
        assert_eq!(g.width, 842.0);
        assert_eq!(g.content_height(), 595.0 - 144.0);
    }

    #[test]
    fn test_validate_rejects_empty_frame() {
        let g = PageGeometry::new(200.0, 100.0).with_margins(60.0);
        assert!(matches!(g.validate(), Err(Error::InvalidGeometry(_))));

        let mut g = PageGeometry::letter();
        g.header = f64::NAN;
        assert!(g.validate().is_err());
    }
}
