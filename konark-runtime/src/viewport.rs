use konark_core::Size2Du;

pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Logical size of the render surface and the pixel ratio it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    aspect: f64,
    device_pixel_ratio: f64,
    pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            width: 1.0,
            height: 1.0,
            aspect: 1.0,
            device_pixel_ratio: 1.0,
            pixel_ratio: 1.0,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Returns `true` when any value changed. Empty sizes keep the previous state.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> bool {
        if !(width > 0.0 && height > 0.0) {
            return false;
        }
        let device_pixel_ratio = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            self.device_pixel_ratio
        };

        let next = Self {
            width,
            height,
            aspect: width / height,
            device_pixel_ratio,
            pixel_ratio: device_pixel_ratio.min(MAX_PIXEL_RATIO),
        };
        let changed = next != *self;
        *self = next;
        changed
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Size the scene is rendered at.
    pub fn drawing_buffer_size(&self) -> Size2Du {
        Size2Du::new(
            ((self.width * self.pixel_ratio).floor() as u32).max(1),
            ((self.height * self.pixel_ratio).floor() as u32).max(1),
        )
    }

    /// Size of the presentation surface in physical pixels.
    pub fn surface_size(&self) -> Size2Du {
        Size2Du::new(
            ((self.width * self.device_pixel_ratio).round() as u32).max(1),
            ((self.height * self.device_pixel_ratio).round() as u32).max(1),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_every_resize_and_ratio_is_capped() {
        let mut viewport = Viewport::default();
        for (width, height, dpr) in [
            (800.0, 600.0, 1.0),
            (1920.0, 1080.0, 3.0),
            (300.0, 900.0, 1.5),
            (1.0, 1.0, 2.5),
        ] {
            viewport.resize(width, height, dpr);
            assert_eq!(viewport.aspect(), width / height);
            assert!(viewport.pixel_ratio() <= MAX_PIXEL_RATIO);
        }
    }

    #[test]
    fn drawing_buffer_uses_capped_ratio() {
        let viewport = Viewport::new(1000.5, 500.0, 3.0);
        assert_eq!(viewport.drawing_buffer_size(), Size2Du::new(2001, 1000));
        assert_eq!(viewport.surface_size(), Size2Du::new(3002, 1500));
    }

    #[test]
    fn minimised_window_keeps_state() {
        let mut viewport = Viewport::new(640.0, 480.0, 1.0);
        assert!(!viewport.resize(0.0, 0.0, 1.0));
        assert_eq!(viewport.width(), 640.0);
        assert_eq!(viewport.aspect(), 640.0 / 480.0);
    }

    #[test]
    fn unchanged_resize_reports_no_change() {
        let mut viewport = Viewport::new(640.0, 480.0, 1.0);
        assert!(!viewport.resize(640.0, 480.0, 1.0));
        assert!(viewport.resize(640.0, 480.0, 2.0));
    }
}
