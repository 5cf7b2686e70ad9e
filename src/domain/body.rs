/// Per-entity kinematic state: position, velocity, grounded flag.
/// Knows nothing about tiles; mutated each frame only by the collision
/// resolver and the owning entity's input/AI step.

use super::grid::Aabb;

#[derive(Clone, Copy, Debug)]
pub struct KinematicBody {
    /// Top-left corner, pixels.
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Per-frame velocity, pixels.
    pub vx: f32,
    pub vy: f32,
    /// Set by vertical resolution when a supporting tile is found.
    pub on_ground: bool,
}

impl KinematicBody {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        KinematicBody {
            x,
            y,
            w,
            h,
            vx: 0.0,
            vy: 0.0,
            on_ground: false,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.w, self.h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_tracks_position() {
        let mut b = KinematicBody::new(4.0, 8.0, 12.0, 14.0);
        assert_eq!(b.aabb(), Aabb::new(4.0, 8.0, 12.0, 14.0));
        b.x = 10.0;
        assert_eq!(b.aabb().x, 10.0);
        assert_eq!(b.right(), 22.0);
        assert_eq!(b.bottom(), 22.0);
    }
}
