//! Track file format and validation
//!
//! Tracks are authored externally (an editor lays modules on a grid and
//! resolves which slots touch); the simulation only consumes the finished
//! product. A track file is the ordered segment cycle with fully resolved
//! links; [`TrackFile::build`] validates it into a read-only
//! [`TrackGraph`] before any vehicle registers.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim::{
    PathEnds, Segment, SegmentId, SegmentKind, Slot, SlotLink, TrackError, TrackGraph,
};
use glam::Vec2;

/// Track loading or validation failure
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Track(TrackError),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "track file i/o: {err}"),
            ConfigError::Parse(err) => write!(f, "track file parse: {err}"),
            ConfigError::Track(err) => write!(f, "track graph: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid track: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Track(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl From<TrackError> for ConfigError {
    fn from(err: TrackError) -> Self {
        ConfigError::Track(err)
    }
}

/// An authored track: metadata plus the segment cycle in traversal order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackFile {
    #[serde(default)]
    pub metadata: TrackMetadata,
    pub segments: Vec<SegmentSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub author: String,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            author: String::new(),
        }
    }
}

fn default_name() -> String {
    "Untitled".to_string()
}

/// One segment as authored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSpec {
    pub kind: SegmentKind,
    /// Planar footprint center (x, z)
    pub origin: [f32; 2],
    #[serde(default = "default_size")]
    pub size: [f32; 2],
    /// Quarter turns, 0..=3
    #[serde(default)]
    pub rotation: u8,
    /// Slots in attribute order (see [`crate::sim::Segment::slots`])
    #[serde(default)]
    pub slots: [SlotSpec; 4],
}

fn default_size() -> [f32; 2] {
    [15.0, 15.0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_position")]
    pub position: f32,
    #[serde(default)]
    pub link: Option<LinkSpec>,
    #[serde(default)]
    pub floor_level: f32,
}

impl Default for SlotSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            position: default_position(),
            link: None,
            floor_level: 0.0,
        }
    }
}

fn default_position() -> f32 {
    0.5
}

/// A resolved link to another segment's slot, by indices into the file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkSpec {
    pub segment: usize,
    pub slot: usize,
}

impl TrackFile {
    /// Load a track from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save this track to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate the authored cycle and build the simulation-time graph.
    ///
    /// Checks, per segment: exactly two enabled slots, both linked; links
    /// in range, mutual, and consecutive in file order (segment `i` exits
    /// into `i + 1`, wrapping); curve slots on adjacent edges with a
    /// positive centerline radius.
    pub fn build(&self) -> Result<TrackGraph, ConfigError> {
        let count = self.segments.len();
        if count == 0 {
            return Err(ConfigError::Invalid("track has no segments".into()));
        }
        if count == 1 {
            return Err(ConfigError::Invalid(
                "a closed loop needs at least two segments".into(),
            ));
        }

        let mut segments = Vec::with_capacity(count);
        for (index, spec) in self.segments.iter().enumerate() {
            segments.push(self.build_segment(index, spec, count)?);
        }

        let graph = TrackGraph::new(segments)?;
        info!(
            "track '{}' built: {} segments, reference lap {:.2}",
            self.metadata.name,
            count,
            graph.total_length(0.0)
        );
        Ok(graph)
    }

    fn build_segment(
        &self,
        index: usize,
        spec: &SegmentSpec,
        count: usize,
    ) -> Result<Segment, ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if spec.rotation > 3 {
            return invalid(format!(
                "segment {index}: rotation {} out of range 0..=3",
                spec.rotation
            ));
        }
        if spec.size[0] <= 0.0 || spec.size[1] <= 0.0 {
            return invalid(format!(
                "segment {index}: footprint {:?} must be positive",
                spec.size
            ));
        }

        let mut enabled = Vec::new();
        for (attr, slot) in spec.slots.iter().enumerate() {
            if !(0.0..=1.0).contains(&slot.position) {
                return invalid(format!(
                    "segment {index} slot {attr}: position {} outside [0, 1]",
                    slot.position
                ));
            }
            if let Some(link) = slot.link {
                if !slot.enabled {
                    return invalid(format!("segment {index} slot {attr}: link on disabled slot"));
                }
                if link.segment >= count || link.slot >= 4 {
                    return invalid(format!(
                        "segment {index} slot {attr}: link out of range ({} slot {})",
                        link.segment, link.slot
                    ));
                }
                let target = &self.segments[link.segment].slots[link.slot];
                let mutual = target.link.is_some_and(|back| {
                    back.segment == index && back.slot == attr
                });
                if !target.enabled || !mutual {
                    return invalid(format!(
                        "segment {index} slot {attr}: link to segment {} slot {} is not mutual",
                        link.segment, link.slot
                    ));
                }
            }
            if slot.enabled {
                enabled.push(attr);
            }
        }

        if enabled.len() != 2 {
            return invalid(format!(
                "segment {index}: {} enabled slots, expected exactly 2",
                enabled.len()
            ));
        }

        let next = (index + 1) % count;
        let prev = (index + count - 1) % count;
        let links_to = |attr: usize, target: usize| {
            spec.slots[attr]
                .link
                .is_some_and(|link| link.segment == target)
        };

        let Some(&exit_attr) = enabled.iter().find(|&&a| links_to(a, next)) else {
            return invalid(format!("segment {index}: no slot links to segment {next}"));
        };
        let Some(&entry_attr) = enabled
            .iter()
            .find(|&&a| a != exit_attr && links_to(a, prev))
        else {
            return invalid(format!(
                "segment {index}: no slot links back to segment {prev}"
            ));
        };

        let rotation = spec.rotation as usize;
        let dir_of = |attr: usize| (attr + 4 - rotation) % 4;
        let path = PathEnds {
            entry: dir_of(entry_attr),
            exit: dir_of(exit_attr),
        };

        if spec.kind == SegmentKind::Curve && path.entry % 2 == path.exit % 2 {
            return invalid(format!(
                "segment {index}: curve slots must sit on adjacent edges"
            ));
        }

        let slots = spec.slots.clone().map(|s| Slot {
            enabled: s.enabled,
            position: s.position,
            link: s.link.map(|l| SlotLink {
                segment: SegmentId(l.segment),
                slot: l.slot,
            }),
            floor_level: s.floor_level,
        });

        let segment = Segment::new(
            SegmentId(index),
            spec.kind,
            Vec2::from(spec.origin),
            Vec2::from(spec.size),
            spec.rotation,
            slots,
            path,
        );

        if spec.kind == SegmentKind::Curve && segment.length(0.0) <= 0.0 {
            return invalid(format!(
                "segment {index}: curve has non-positive centerline radius"
            ));
        }

        Ok(segment)
    }
}

/// A built-in six-segment oval: four quarter curves and two straights on a
/// 15-unit module grid. Used by the demo binary and as a test fixture.
pub fn demo_loop() -> TrackFile {
    let linked = |position: f32, segment: usize, slot: usize| SlotSpec {
        enabled: true,
        position,
        link: Some(LinkSpec { segment, slot }),
        floor_level: 0.0,
    };
    let off = SlotSpec::default;

    let curve = |origin: [f32; 2], rotation: u8, slots: [SlotSpec; 4]| SegmentSpec {
        kind: SegmentKind::Curve,
        origin,
        size: [15.0, 15.0],
        rotation,
        slots,
    };
    let straight = |origin: [f32; 2], slots: [SlotSpec; 4]| SegmentSpec {
        kind: SegmentKind::Straight,
        origin,
        size: [15.0, 15.0],
        rotation: 0,
        slots,
    };

    TrackFile {
        metadata: TrackMetadata {
            name: "Demo Oval".to_string(),
            author: String::new(),
        },
        segments: vec![
            // 0: bottom-left curve, enters from the straight above (5),
            // exits right into 1
            curve([0.0, 0.0], 2, [linked(0.5, 1, 3), off(), off(), linked(0.5, 5, 3)]),
            // 1: bottom-right curve, turns up into the right straight
            curve([15.0, 0.0], 3, [linked(0.5, 2, 3), off(), off(), linked(0.5, 0, 0)]),
            // 2: right straight, northbound
            straight([15.0, 15.0], [off(), linked(0.5, 3, 3), off(), linked(0.5, 1, 0)]),
            // 3: top-right curve, turns left
            curve([15.0, 30.0], 0, [linked(0.5, 4, 3), off(), off(), linked(0.5, 2, 1)]),
            // 4: top-left curve, turns down into the left straight
            curve([0.0, 30.0], 1, [linked(0.5, 5, 1), off(), off(), linked(0.5, 3, 0)]),
            // 5: left straight, southbound back into 0
            straight([0.0, 15.0], [off(), linked(0.5, 4, 0), off(), linked(0.5, 0, 3)]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_loop_builds() {
        let track = demo_loop().build().unwrap();
        assert_eq!(track.len(), 6);
    }

    #[test]
    fn test_demo_loop_segment_paths_are_continuous() {
        let track = demo_loop().build().unwrap();
        let mut current = track.first();
        for _ in 0..track.len() {
            let next = track.next(current).unwrap();
            let (end, _) = track.segment(current).sample(1.0, 0.0);
            let (start, _) = track.segment(next).sample(0.0, 0.0);
            assert!(
                (end - start).length() < 1e-4,
                "seam between {current} and {next}: {end} vs {start}"
            );
            current = next;
        }
    }

    #[test]
    fn test_json_round_trip() {
        let file = demo_loop();
        let json = serde_json::to_string_pretty(&file).unwrap();
        let back: TrackFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.segments.len(), file.segments.len());
        assert_eq!(back.metadata.name, "Demo Oval");
        back.build().unwrap();
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("trackloop-test-{}.json", std::process::id()));
        let file = demo_loop();
        file.save(&path).unwrap();
        let back = TrackFile::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back.segments.len(), file.segments.len());
        back.build().unwrap();
    }

    #[test]
    fn test_empty_track_rejected() {
        let file = TrackFile {
            metadata: TrackMetadata::default(),
            segments: Vec::new(),
        };
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_non_mutual_link_rejected() {
        let mut file = demo_loop();
        // Re-point segment 0's exit at the wrong slot
        file.segments[0].slots[0].link = Some(LinkSpec { segment: 1, slot: 0 });
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unlinked_enabled_slot_rejected() {
        let mut file = demo_loop();
        file.segments[0].slots[0].link = None;
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_degenerate_curve_rejected() {
        let mut file = demo_loop();
        // Position ratio 0 collapses the curve's centerline radius to 0
        for slot in file.segments[0].slots.iter_mut() {
            slot.position = 0.0;
        }
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_position_rejected() {
        let mut file = demo_loop();
        file.segments[2].slots[1].position = 1.5;
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_slots_default_disabled() {
        let json = r#"{
            "segments": [
                { "kind": "Straight", "origin": [0.0, 0.0] },
                { "kind": "Straight", "origin": [0.0, 15.0] }
            ]
        }"#;
        let file: TrackFile = serde_json::from_str(json).unwrap();
        assert!(file.segments[0].slots.iter().all(|s| !s.enabled));
        assert_eq!(file.segments[0].size, [15.0, 15.0]);
        assert_eq!(file.metadata.name, "Untitled");
        // No enabled slots: not traversable
        assert!(matches!(file.build(), Err(ConfigError::Invalid(_))));
    }
}
