//! Block coordinates and face math shared across the simulation

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block position in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Center of the block as a float vector
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }

    /// Chunk coordinates containing this block
    pub fn chunk(&self) -> (i32, i32) {
        (self.x >> 4, self.z >> 4)
    }

    /// Neighboring position across the given face
    pub fn offset(&self, face: BlockFace) -> BlockPosition {
        let (dx, dy, dz) = face.offset();
        BlockPosition::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Squared horizontal-plane distance to a float position
    pub fn distance_squared(&self, other: Vec3) -> f32 {
        self.center().distance_squared(other)
    }
}

impl fmt::Display for BlockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<Vec3> for BlockPosition {
    fn from(v: Vec3) -> Self {
        BlockPosition::new(
            v.x.floor() as i32,
            v.y.floor() as i32,
            v.z.floor() as i32,
        )
    }
}

impl From<BlockPosition> for Vec3 {
    fn from(p: BlockPosition) -> Self {
        Vec3::new(p.x as f32, p.y as f32, p.z as f32)
    }
}

/// Face of a block, matching the wire-level face indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFace {
    Bottom, // -Y, 0
    Top,    // +Y, 1
    North,  // -Z, 2
    South,  // +Z, 3
    West,   // -X, 4
    East,   // +X, 5
}

impl BlockFace {
    /// Decode a client-supplied face index
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(BlockFace::Bottom),
            1 => Some(BlockFace::Top),
            2 => Some(BlockFace::North),
            3 => Some(BlockFace::South),
            4 => Some(BlockFace::West),
            5 => Some(BlockFace::East),
            _ => None,
        }
    }

    pub fn index(&self) -> i32 {
        match self {
            BlockFace::Bottom => 0,
            BlockFace::Top => 1,
            BlockFace::North => 2,
            BlockFace::South => 3,
            BlockFace::West => 4,
            BlockFace::East => 5,
        }
    }

    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            BlockFace::Bottom => (0, -1, 0),
            BlockFace::Top => (0, 1, 0),
            BlockFace::North => (0, 0, -1),
            BlockFace::South => (0, 0, 1),
            BlockFace::West => (-1, 0, 0),
            BlockFace::East => (1, 0, 0),
        }
    }

    pub fn opposite(&self) -> BlockFace {
        match self {
            BlockFace::Bottom => BlockFace::Top,
            BlockFace::Top => BlockFace::Bottom,
            BlockFace::North => BlockFace::South,
            BlockFace::South => BlockFace::North,
            BlockFace::West => BlockFace::East,
            BlockFace::East => BlockFace::West,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_roundtrip() {
        for index in 0..6 {
            let face = BlockFace::from_index(index).expect("valid face index");
            assert_eq!(face.index(), index);
        }
        assert!(BlockFace::from_index(6).is_none());
        assert!(BlockFace::from_index(-1).is_none());
    }

    #[test]
    fn test_offset_moves_one_block() {
        let origin = BlockPosition::new(10, 64, -3);
        let above = origin.offset(BlockFace::Top);
        assert_eq!(above, BlockPosition::new(10, 65, -3));
        assert_eq!(above.offset(BlockFace::Bottom), origin);
    }

    #[test]
    fn test_chunk_coordinates() {
        assert_eq!(BlockPosition::new(17, 0, -1).chunk(), (1, -1));
        assert_eq!(BlockPosition::new(-16, 0, 15).chunk(), (-1, 0));
    }

    #[test]
    fn test_floor_conversion() {
        let pos = BlockPosition::from(Vec3::new(-0.5, 64.9, 2.0));
        assert_eq!(pos, BlockPosition::new(-1, 64, 2));
    }
}
