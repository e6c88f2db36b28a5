use cisco_common::LightingConfig;
use glam::Vec3;

/// Lighting values uploaded once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingUniforms {
    /// Direction the light travels.
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl LightingUniforms {
    /// CPU evaluation of the fragment shader for one surface normal:
    /// `(ambient + max(n . -dir, 0) * color) * object_color`.
    pub fn shade(&self, normal: Vec3, object_color: Vec3) -> Vec3 {
        let n = normal.normalize_or_zero();
        let to_light = -self.direction.normalize_or_zero();
        let diffuse = n.dot(to_light).max(0.0) * self.color;
        (self.ambient + diffuse) * object_color
    }
}

/// Fixed ambient + single directional diffuse light. No specular term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    direction: Vec3,
    color: Vec3,
    ambient: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self::new(&LightingConfig::default())
    }
}

impl Lighting {
    pub fn new(config: &LightingConfig) -> Self {
        Self {
            direction: config.direction,
            color: config.color,
            ambient: config.ambient,
        }
    }

    pub fn uniforms(&self) -> LightingUniforms {
        LightingUniforms {
            direction: self.direction,
            color: self.color,
            ambient: self.ambient,
        }
    }

    pub fn shade(&self, normal: Vec3, object_color: Vec3) -> Vec3 {
        self.uniforms().shade(normal, object_color)
    }
}
