/// Colored lines along +X, +Y and +Z from the origin.
#[derive(Debug, Clone, Copy)]
pub struct AxesHelper {
    size: f32,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl AxesHelper {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// Line list: two vertices per axis. Colors fade from the axis color at the origin.
    pub fn line_vertices(&self) -> [LineVertex; 6] {
        let s = self.size;
        let line = |end: [f32; 3], start_color: [f32; 3], end_color: [f32; 3]| {
            [
                LineVertex {
                    position: [0.0, 0.0, 0.0],
                    color: start_color,
                },
                LineVertex {
                    position: end,
                    color: end_color,
                },
            ]
        };
        let [x0, x1] = line([s, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.6, 0.0]);
        let [y0, y1] = line([0.0, s, 0.0], [0.0, 1.0, 0.0], [0.6, 1.0, 0.0]);
        let [z0, z1] = line([0.0, 0.0, s], [0.0, 0.0, 1.0], [0.0, 0.6, 1.0]);

        [x0, x1, y0, y1, z0, z1]
    }
}
