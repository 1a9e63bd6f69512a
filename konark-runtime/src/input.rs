use std::time::{Duration, Instant};

use glam::Vec2;
use winit::window::{Fullscreen, Window};

pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(300);
pub const DOUBLE_CLICK_DISTANCE: f32 = 8.0;

/// Pairs presses (mouse clicks or touch starts) into double clicks.
/// A press that completes a pair does not start a new one.
#[derive(Debug, Clone)]
pub struct DoubleClickDetector {
    interval: Duration,
    distance: f32,
    last: Option<(Instant, Vec2)>,
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self::new(DOUBLE_CLICK_INTERVAL, DOUBLE_CLICK_DISTANCE)
    }
}

impl DoubleClickDetector {
    pub fn new(interval: Duration, distance: f32) -> Self {
        Self {
            interval,
            distance,
            last: None,
        }
    }

    /// Returns `true` when this press completes a double click.
    pub fn press(&mut self, at: Instant, position: Vec2) -> bool {
        match self.last.take() {
            Some((last_at, last_position))
                if at.saturating_duration_since(last_at) <= self.interval
                    && last_position.distance(position) <= self.distance =>
            {
                true
            }
            _ => {
                self.last = Some((at, position));
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Surface that may be switched in and out of fullscreen.
pub trait FullscreenSurface {
    /// `false` when the platform cannot present fullscreen for this surface.
    fn supports_fullscreen(&self) -> bool;
    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&self, fullscreen: bool);
}

impl FullscreenSurface for Window {
    fn supports_fullscreen(&self) -> bool {
        self.current_monitor().is_some()
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen().is_some()
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        let mode = fullscreen.then(|| Fullscreen::Borderless(None));
        Window::set_fullscreen(self, mode);
    }
}

/// Exit fullscreen when active, enter it otherwise. Does nothing when unsupported.
/// Returns `true` when the state was switched.
pub fn toggle_fullscreen(surface: &dyn FullscreenSurface) -> bool {
    if !surface.supports_fullscreen() {
        log::debug!("Fullscreen is not supported");
        return false;
    }
    let fullscreen = !surface.is_fullscreen();
    surface.set_fullscreen(fullscreen);
    log::debug!("Fullscreen {}", if fullscreen { "on" } else { "off" });
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    pub(crate) struct FakeSurface {
        pub supported: bool,
        pub fullscreen: Cell<bool>,
        pub requests: RefCell<Vec<bool>>,
    }

    impl FakeSurface {
        pub fn supported() -> Self {
            Self {
                supported: true,
                ..Default::default()
            }
        }
    }

    impl FullscreenSurface for FakeSurface {
        fn supports_fullscreen(&self) -> bool {
            self.supported
        }

        fn is_fullscreen(&self) -> bool {
            self.fullscreen.get()
        }

        fn set_fullscreen(&self, fullscreen: bool) {
            self.fullscreen.set(fullscreen);
            self.requests.borrow_mut().push(fullscreen);
        }
    }

    #[test]
    fn two_close_presses_make_one_double_click() {
        let mut detector = DoubleClickDetector::default();
        let start = Instant::now();

        assert!(!detector.press(start, Vec2::new(10.0, 10.0)));
        assert!(detector.press(start + Duration::from_millis(200), Vec2::new(13.0, 12.0)));
        // A third press starts a new pair
        assert!(!detector.press(start + Duration::from_millis(250), Vec2::new(13.0, 12.0)));
    }

    #[test]
    fn slow_or_distant_presses_do_not_pair() {
        let mut detector = DoubleClickDetector::default();
        let start = Instant::now();

        assert!(!detector.press(start, Vec2::ZERO));
        assert!(!detector.press(start + Duration::from_millis(400), Vec2::ZERO));
        assert!(!detector.press(start + Duration::from_millis(500), Vec2::new(50.0, 0.0)));
    }

    #[test]
    fn toggle_switches_state_once_per_call() {
        let surface = FakeSurface::supported();

        assert!(toggle_fullscreen(&surface));
        assert!(surface.is_fullscreen());
        assert!(toggle_fullscreen(&surface));
        assert!(!surface.is_fullscreen());
        assert_eq!(*surface.requests.borrow(), vec![true, false]);
    }

    #[test]
    fn toggle_is_noop_when_unsupported() {
        let surface = FakeSurface::default();

        assert!(!toggle_fullscreen(&surface));
        assert!(surface.requests.borrow().is_empty());
    }
}
