//! Track segment geometry
//!
//! A segment is one modular track piece: a rectangular footprint with four
//! directional connection slots (left/forward/right/back in local space,
//! reindexed by a quarter-turn rotation) and either a straight or a
//! quarter-circle curved path between its two enabled slots.
//!
//! World space is y-up: footprints live in the XZ plane, slot floor levels
//! supply the y coordinate.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Scale factor from the curve focal point to the Bezier control point.
/// 0.921 makes a 3-point quadratic Bezier closely approximate a quarter
/// circle between two adjacent edges.
pub const CURVE_STRENGTH: f32 = 0.921;

/// Geometric slot directions, before rotation reindexing.
pub const DIR_LEFT: usize = 0;
pub const DIR_FORWARD: usize = 1;
pub const DIR_RIGHT: usize = 2;
pub const DIR_BACK: usize = 3;

/// Path shape of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Straight,
    Curve,
}

/// Index of a segment within its track graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub usize);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment #{}", self.0)
    }
}

/// A resolved link to another segment's slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotLink {
    pub segment: SegmentId,
    pub slot: usize,
}

/// One of a segment's four connection slots
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub enabled: bool,
    /// Position ratio along the slot's edge, in [0, 1]
    pub position: f32,
    pub link: Option<SlotLink>,
    /// Local floor height at this edge
    pub floor_level: f32,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            enabled: false,
            position: 0.5,
            link: None,
            floor_level: 0.0,
        }
    }
}

/// The directed path through a segment, as geometric direction indices.
/// `entry` faces the previous segment in the cycle, `exit` the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathEnds {
    pub entry: usize,
    pub exit: usize,
}

/// A single track piece, immutable once the graph is built
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub kind: SegmentKind,
    /// Planar footprint center (x, z)
    pub origin: Vec2,
    /// Footprint size before rotation
    pub size: Vec2,
    /// Quarter turns, 0..=3
    pub rotation: u8,
    /// Slots in attribute order; geometric direction `d` reads
    /// `slots[(d + rotation) % 4]`
    pub slots: [Slot; 4],
    path: PathEnds,
}

impl Segment {
    pub fn new(
        id: SegmentId,
        kind: SegmentKind,
        origin: Vec2,
        size: Vec2,
        rotation: u8,
        slots: [Slot; 4],
        path: PathEnds,
    ) -> Self {
        Self {
            id,
            kind,
            origin,
            size,
            rotation: rotation % 4,
            slots,
            path,
        }
    }

    pub fn path(&self) -> PathEnds {
        self.path
    }

    /// Slot for a geometric direction, after rotation reindexing
    pub fn slot(&self, dir: usize) -> &Slot {
        &self.slots[(dir + self.rotation as usize) % 4]
    }

    /// The slot whose link points at the next segment in the cycle
    pub fn exit_slot(&self) -> &Slot {
        self.slot(self.path.exit)
    }

    /// Footprint size with axes swapped for odd rotations
    pub fn oriented_size(&self) -> Vec2 {
        if self.rotation % 2 == 0 {
            self.size
        } else {
            Vec2::new(self.size.y, self.size.x)
        }
    }

    /// World position of a slot by geometric direction
    pub fn slot_position(&self, dir: usize) -> Vec3 {
        let size = self.oriented_size();
        let slot = self.slot(dir);
        let (cx, cz) = (self.origin.x, self.origin.y);
        match dir {
            DIR_LEFT => Vec3::new(
                cx - size.x * 0.5,
                slot.floor_level,
                cz - size.y * 0.5 + size.y * slot.position,
            ),
            DIR_FORWARD => Vec3::new(
                cx - size.x * 0.5 + size.x * slot.position,
                slot.floor_level,
                cz + size.y * 0.5,
            ),
            DIR_RIGHT => Vec3::new(
                cx + size.x * 0.5,
                slot.floor_level,
                cz + size.y * 0.5 - size.y * slot.position,
            ),
            DIR_BACK => Vec3::new(
                cx + size.x * 0.5 - size.x * slot.position,
                slot.floor_level,
                cz - size.y * 0.5,
            ),
            _ => unreachable!("slot direction out of range"),
        }
    }

    /// Footprint corner a curve bends around, selected by rotation
    pub fn focal_point(&self) -> Vec3 {
        let (cx, cz) = (self.origin.x, self.origin.y);
        let half = self.size * 0.5;
        match self.rotation {
            0 => Vec3::new(cx - half.x, 0.0, cz - half.y),
            1 => Vec3::new(cx + half.x, 0.0, cz - half.y),
            2 => Vec3::new(cx + half.x, 0.0, cz + half.y),
            _ => Vec3::new(cx - half.x, 0.0, cz + half.y),
        }
    }

    /// Path length for a vehicle at the given lateral lane offset.
    ///
    /// Straights are offset-independent. For curves the offset shrinks or
    /// grows the effective radius depending on which side of the turn it
    /// falls on; a non-positive radius collapses to length 0 (degenerate,
    /// rejected at config validation).
    pub fn length(&self, lane_offset: f32) -> f32 {
        match self.kind {
            SegmentKind::Straight => {
                let size = self.oriented_size();
                if self.rotation % 2 == 0 { size.y } else { size.x }
            }
            SegmentKind::Curve => {
                let Some(slot) = self.slots.iter().find(|s| s.enabled) else {
                    return 0.0;
                };
                let base = slot.position * self.oriented_size().x;

                // Side test: does the lane offset land inside or outside
                // the turn? Sampled at the curve midpoint.
                let (midpoint, tangent) = self.bezier_point(0.5);
                let inward = (self.focal_point() - midpoint).normalize_or_zero();
                let radius = if inward.cross(tangent).y > 0.0 {
                    base - lane_offset
                } else {
                    base + lane_offset
                };

                if radius > 0.0 {
                    std::f32::consts::FRAC_PI_2 * radius
                } else {
                    0.0
                }
            }
        }
    }

    /// Sample the path at normalized progress `t` in [0, 1], laterally
    /// displaced by `lane_offset`. Returns world position and unit tangent.
    ///
    /// `t` is not clamped; callers wrap or clamp before sampling.
    pub fn sample(&self, t: f32, lane_offset: f32) -> (Vec3, Vec3) {
        let (point, tangent) = match self.kind {
            SegmentKind::Straight => {
                let start = self.slot_position(self.path.entry);
                let end = self.slot_position(self.path.exit);
                let tangent = (end - start).normalize_or_zero();
                (start.lerp(end, t), tangent)
            }
            SegmentKind::Curve => self.bezier_point(t),
        };
        (point + tangent.cross(Vec3::Y) * lane_offset, tangent)
    }

    /// Quadratic Bezier through the two path endpoints, with the control
    /// point derived from the focal point and the endpoints' shared corner.
    fn bezier_point(&self, t: f32) -> (Vec3, Vec3) {
        let start = self.slot_position(self.path.entry);
        let end = self.slot_position(self.path.exit);

        // Corner crossing the endpoints' axis-aligned coordinates; only
        // defined for adjacent edges (validated at build time).
        let corner = if self.path.entry % 2 != self.path.exit % 2 {
            if self.path.entry % 2 == 0 {
                Vec3::new(end.x, 0.0, start.z)
            } else {
                Vec3::new(start.x, 0.0, end.z)
            }
        } else {
            Vec3::ZERO
        };

        let focal = self.focal_point();
        let control = focal + (corner - focal) * CURVE_STRENGTH;

        let a = start.lerp(control, t);
        let b = control.lerp(end, t);
        let tangent = (b - a).normalize_or_zero();
        (a.lerp(b, t), tangent)
    }
}
