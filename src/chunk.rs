use crate::uploader::UploadError;
use anyhow::Result;

pub const CHUNK_SIZE: usize = 16;
pub const CHUNK_HEIGHT: usize = 256;
/// 3 color bytes per voxel over the full 16x16x256 grid.
pub const CHUNK_DATA_SIZE: usize = 3 * CHUNK_SIZE * CHUNK_SIZE * CHUNK_HEIGHT;

/// Capability the serializer consumes: the chunk's world coordinates plus a
/// per-voxel color lookup over `x, z` in `0..16` and `y` in `0..256`.
pub trait ChunkSource {
    fn chunk_x(&self) -> i32;
    fn chunk_z(&self) -> i32;
    /// RGB color of one voxel. Fails if the backing store does, which aborts
    /// the serialization walk.
    fn color_at(&self, x: usize, y: usize, z: usize) -> Result<[u8; 3]>;
}

/// Byte offset of a voxel's red channel in the serialized buffer (green and
/// blue follow at +1 and +2). Receivers index with the same formula, so the
/// X-outer / Z-middle / Y-inner layout is part of the wire format.
pub fn voxel_offset(x: usize, y: usize, z: usize) -> usize {
    ((x * CHUNK_SIZE + z) * CHUNK_HEIGHT + y) * 3
}

/// Walk the full grid and emit 3 bytes per voxel. The buffer is only returned
/// once it is complete and exactly `CHUNK_DATA_SIZE` bytes long; anything else
/// means the source lied about its dimensions.
pub fn serialize_chunk<S: ChunkSource>(chunk: &S) -> Result<Vec<u8>, UploadError> {
    let mut data = Vec::with_capacity(CHUNK_DATA_SIZE);
    for x in 0..CHUNK_SIZE {
        for z in 0..CHUNK_SIZE {
            for y in 0..CHUNK_HEIGHT {
                let [r, g, b] = chunk
                    .color_at(x, y, z)
                    .map_err(|source| UploadError::Source { x, y, z, source })?;
                data.push(r);
                data.push(g);
                data.push(b);
            }
        }
    }
    if data.len() != CHUNK_DATA_SIZE {
        return Err(UploadError::SizeMismatch {
            actual: data.len(),
            expected: CHUNK_DATA_SIZE,
        });
    }
    Ok(data)
}

/// Chunk with every voxel set to one color. Used by the push tool and as a
/// trivially checkable upload payload.
pub struct SolidChunk {
    chunk_x: i32,
    chunk_z: i32,
    color: [u8; 3],
}
impl SolidChunk {
    pub fn new(chunk_x: i32, chunk_z: i32, color: [u8; 3]) -> SolidChunk {
        SolidChunk { chunk_x, chunk_z, color }
    }
}
impl ChunkSource for SolidChunk {
    fn chunk_x(&self) -> i32 { self.chunk_x }
    fn chunk_z(&self) -> i32 { self.chunk_z }
    fn color_at(&self, _x: usize, _y: usize, _z: usize) -> Result<[u8; 3]> { Ok(self.color) }
}

/// Chunk colored by its own coordinates, every voxel distinct per column.
/// Makes layout mistakes visible both in tests and on a live map.
pub struct GradientChunk {
    chunk_x: i32,
    chunk_z: i32,
}
impl GradientChunk {
    pub fn new(chunk_x: i32, chunk_z: i32) -> GradientChunk { GradientChunk { chunk_x, chunk_z } }
}
impl ChunkSource for GradientChunk {
    fn chunk_x(&self) -> i32 { self.chunk_x }
    fn chunk_z(&self) -> i32 { self.chunk_z }
    fn color_at(&self, x: usize, y: usize, z: usize) -> Result<[u8; 3]> {
        Ok([(x * 17) as u8, y as u8, (z * 17) as u8])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;

    struct FailingChunk {
        fail_at: (usize, usize, usize),
    }
    impl ChunkSource for FailingChunk {
        fn chunk_x(&self) -> i32 { 0 }
        fn chunk_z(&self) -> i32 { 0 }
        fn color_at(&self, x: usize, y: usize, z: usize) -> Result<[u8; 3]> {
            if (x, y, z) == self.fail_at {
                Err(anyhow!("backing store gone"))
            } else {
                Ok([1, 2, 3])
            }
        }
    }

    #[test]
    fn buffer_has_exact_size() {
        let data = serialize_chunk(&GradientChunk::new(0, 0)).unwrap();
        assert_eq!(data.len(), CHUNK_DATA_SIZE);
        assert_eq!(data.len(), 196608);
    }

    #[test]
    fn solid_red_chunk_is_all_red_triplets() {
        let data = serialize_chunk(&SolidChunk::new(3, -5, [255, 0, 0])).unwrap();
        assert_eq!(data.len(), 196608);
        assert!(data.chunks(3).all(|triplet| triplet == [0xff, 0x00, 0x00]));
    }

    #[test]
    fn nested_loop_order_is_x_outer_z_middle_y_inner() {
        let chunk = GradientChunk::new(0, 0);
        let data = serialize_chunk(&chunk).unwrap();

        // first voxel, then one step along each axis
        assert_eq!(&data[0..3], &chunk.color_at(0, 0, 0).unwrap());
        assert_eq!(&data[3..6], &chunk.color_at(0, 1, 0).unwrap());
        let z_step = CHUNK_HEIGHT * 3;
        assert_eq!(&data[z_step..z_step + 3], &chunk.color_at(0, 0, 1).unwrap());
        let x_step = CHUNK_SIZE * CHUNK_HEIGHT * 3;
        assert_eq!(&data[x_step..x_step + 3], &chunk.color_at(1, 0, 0).unwrap());
    }

    #[test]
    fn offset_formula_locates_all_channels() {
        let chunk = GradientChunk::new(0, 0);
        let data = serialize_chunk(&chunk).unwrap();
        for (x, y, z) in [(0, 0, 0), (5, 17, 9), (15, 255, 15), (1, 128, 14)] {
            let [r, g, b] = chunk.color_at(x, y, z).unwrap();
            let off = voxel_offset(x, y, z);
            assert_eq!(data[off], r);
            assert_eq!(data[off + 1], g);
            assert_eq!(data[off + 2], b);
        }
    }

    #[test]
    fn column_boundaries_map_to_run_edges() {
        // y = 0 and y = 255 are the first and last triplet of each column run
        for (x, z) in [(0, 0), (7, 3), (15, 15)] {
            let run_start = ((x * CHUNK_SIZE + z) * CHUNK_HEIGHT) * 3;
            assert_eq!(voxel_offset(x, 0, z), run_start);
            assert_eq!(voxel_offset(x, 255, z), run_start + 255 * 3);
        }
        assert_eq!(voxel_offset(15, 255, 15) + 3, CHUNK_DATA_SIZE);
    }

    #[test]
    fn round_trip_through_offset_formula() {
        let chunk = GradientChunk::new(0, 0);
        let data = serialize_chunk(&chunk).unwrap();
        for x in 0..CHUNK_SIZE {
            for z in 0..CHUNK_SIZE {
                for y in 0..CHUNK_HEIGHT {
                    let off = voxel_offset(x, y, z);
                    let reconstructed = [data[off], data[off + 1], data[off + 2]];
                    assert_eq!(reconstructed, chunk.color_at(x, y, z).unwrap());
                }
            }
        }
    }

    #[test]
    fn failing_lookup_aborts_with_coordinates() {
        let result = serialize_chunk(&FailingChunk { fail_at: (8, 100, 4) });
        match result {
            Err(UploadError::Source { x, y, z, .. }) => assert_eq!((x, y, z), (8, 100, 4)),
            other => panic!("expected source error, got {:?}", other.map(|d| d.len())),
        }
    }
}
