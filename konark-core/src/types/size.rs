#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size2D<T> {
    pub width: T,
    pub height: T,
}

pub type Size2Du = Size2D<u32>;
pub type Size2Df = Size2D<f32>;
pub type Size2Dd = Size2D<f64>;

impl<T> Size2D<T> {
    pub fn new(width: T, height: T) -> Self {
        Self { width, height }
    }
}

impl Size2Du {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Size2Dd {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
