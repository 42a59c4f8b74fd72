use anyhow::{bail, Result};
use log::{debug, trace};
use std::collections::HashSet;
use zerocopy::IntoBytes;

use crate::coord_ops::Coord;

/// Floats per coordinate block.
pub const BLOCK_SIZE: usize = 2;
/// One 64 KiB page of `f32` values, the growth step of the buffer.
pub const PAGE_FLOATS: usize = 64 * 1024 / std::mem::size_of::<f32>();

/// Caller-side storage for coordinates, handed out in blocks of two floats.
///
/// Freed blocks are reused last-in first-out before the buffer is extended.
/// The location returned by [`CoordMemory::write_block`] is the index of the
/// block's `x` value; `y` follows it.
#[derive(Debug, Clone)]
pub struct CoordMemory {
    arr: Vec<f32>,
    // Next never-used block index
    target: usize,
    // LIFO reuse order
    free: Vec<usize>,
    // Same locations as `free`, for lookups
    freed: HashSet<usize>,
}

impl Default for CoordMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordMemory {
    pub fn new() -> Self {
        Self::with_pages(1)
    }

    pub fn with_pages(pages: usize) -> Self {
        let pages = pages.max(1);
        CoordMemory {
            arr: vec![0.0; pages * PAGE_FLOATS],
            target: 0,
            free: Vec::new(),
            freed: HashSet::new(),
        }
    }

    /// Number of floats the buffer currently holds.
    pub fn capacity(&self) -> usize {
        self.arr.len()
    }

    pub fn pages(&self) -> usize {
        self.arr.len() / PAGE_FLOATS
    }

    /// Number of allocated, not freed, blocks.
    pub fn live_blocks(&self) -> usize {
        self.target / BLOCK_SIZE - self.free.len()
    }

    /// Writes a new coordinate and returns its location.
    pub fn write_block(&mut self, x: f32, y: f32) -> usize {
        if let Some(loc) = self.free.pop() {
            self.freed.remove(&loc);
            self.arr[loc] = x;
            self.arr[loc + 1] = y;
            trace!("Reused freed block at {}", loc);
            return loc;
        }

        let loc = self.target;
        self.arr[loc] = x;
        self.arr[loc + 1] = y;
        self.target += BLOCK_SIZE;
        if self.target >= self.arr.len() {
            self.arr.resize(self.arr.len() + PAGE_FLOATS, 0.0);
            debug!("Coordinate memory grown to {} pages", self.pages());
        }
        loc
    }

    /// Overwrites an allocated block.
    pub fn write_block_at(&mut self, loc: usize, x: f32, y: f32) -> Result<()> {
        let c = self.coord_mut(loc)?;
        c[0] = x;
        c[1] = y;
        Ok(())
    }

    /// Overwrites a single float inside an allocated block.
    pub fn write(&mut self, loc: usize, value: f32) -> Result<()> {
        self.check_value(loc)?;
        self.arr[loc] = value;
        Ok(())
    }

    pub fn query(&self, loc: usize) -> Result<f32> {
        self.check_value(loc)?;
        Ok(self.arr[loc])
    }

    /// Releases a block for reuse. Its contents stay in place until overwritten.
    pub fn remove_block(&mut self, loc: usize) -> Result<()> {
        self.check_block(loc)?;
        self.free.push(loc);
        self.freed.insert(loc);
        Ok(())
    }

    pub fn coord(&self, loc: usize) -> Result<&Coord> {
        self.check_block(loc)?;
        let block: &Coord = self.arr[loc..loc + BLOCK_SIZE]
            .try_into()
            .map_err(|_| anyhow::anyhow!("Block at {} is not two floats wide", loc))?;
        Ok(block)
    }

    pub fn coord_mut(&mut self, loc: usize) -> Result<&mut Coord> {
        self.check_block(loc)?;
        let block: &mut Coord = (&mut self.arr[loc..loc + BLOCK_SIZE])
            .try_into()
            .map_err(|_| anyhow::anyhow!("Block at {} is not two floats wide", loc))?;
        Ok(block)
    }

    /// Runs an in-place binary operation with `loc` as the mutated coordinate
    /// and `other` as the operand. `loc` and `other` may be the same block.
    pub fn apply<F>(&mut self, loc: usize, other: usize, op: F) -> Result<()>
    where
        F: FnOnce(&mut Coord, &Coord),
    {
        self.check_block(other)?;
        self.check_block(loc)?;

        if loc == other {
            let operand = *self.coord(other)?;
            op(self.coord_mut(loc)?, &operand);
            return Ok(());
        }

        // Split so the target and the operand borrow disjoint halves
        let (target, operand) = if loc < other {
            let (lo, hi) = self.arr.split_at_mut(other);
            (&mut lo[loc..loc + BLOCK_SIZE], &hi[..BLOCK_SIZE])
        } else {
            let (lo, hi) = self.arr.split_at_mut(loc);
            (&mut hi[..BLOCK_SIZE], &lo[other..other + BLOCK_SIZE])
        };
        let target: &mut Coord = target
            .try_into()
            .map_err(|_| anyhow::anyhow!("Block at {} is not two floats wide", loc))?;
        let operand: &Coord = operand
            .try_into()
            .map_err(|_| anyhow::anyhow!("Block at {} is not two floats wide", other))?;
        op(target, operand);
        Ok(())
    }

    /// Byte address of a location, as seen by a host indexing the buffer as bytes.
    pub fn ptr(&self, loc: usize) -> usize {
        loc * std::mem::size_of::<f32>()
    }

    /// The whole buffer as raw bytes in native float layout.
    pub fn as_bytes(&self) -> &[u8] {
        self.arr.as_slice().as_bytes()
    }

    fn check_block(&self, loc: usize) -> Result<()> {
        if loc % BLOCK_SIZE != 0 {
            bail!("Location {} is not aligned to a coordinate block", loc);
        }
        if loc >= self.target {
            bail!("Location {} has never been allocated (next block at {})", loc, self.target);
        }
        if self.freed.contains(&loc) {
            bail!("Location {} refers to a freed block", loc);
        }
        Ok(())
    }

    fn check_value(&self, loc: usize) -> Result<()> {
        self.check_block(loc - loc % BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord_ops;

    #[test]
    fn blocks_are_contiguous() {
        let mut mem = CoordMemory::new();
        let a = mem.write_block(1.0, 2.0);
        let b = mem.write_block(3.0, 4.0);
        assert_eq!(a, 0);
        assert_eq!(b, 2);
        assert_eq!(mem.ptr(b), 8);
        assert_eq!(mem.query(b + 1).unwrap(), 4.0);
        assert_eq!(mem.live_blocks(), 2);
    }

    #[test]
    fn freed_blocks_are_reused_last_first() {
        let mut mem = CoordMemory::new();
        let a = mem.write_block(1.0, 1.0);
        let b = mem.write_block(2.0, 2.0);
        let _c = mem.write_block(3.0, 3.0);
        mem.remove_block(a).unwrap();
        mem.remove_block(b).unwrap();
        assert_eq!(mem.live_blocks(), 1);

        assert_eq!(mem.write_block(9.0, 9.0), b);
        assert_eq!(mem.write_block(8.0, 8.0), a);
        assert_eq!(mem.write_block(7.0, 7.0), 6);
        assert_eq!(*mem.coord(a).unwrap(), [8.0, 8.0]);
    }

    #[test]
    fn reused_blocks_are_live_again() {
        let mut mem = CoordMemory::new();
        let locs: Vec<usize> = (0..100).map(|i| mem.write_block(i as f32, 0.0)).collect();
        for &loc in &locs[..50] {
            mem.remove_block(loc).unwrap();
        }
        assert!(locs[..50].iter().all(|&loc| mem.coord(loc).is_err()));
        assert!(locs[50..].iter().all(|&loc| mem.coord(loc).is_ok()));

        for _ in 0..50 {
            let loc = mem.write_block(1.0, 1.0);
            assert!(loc < 100);
            assert_eq!(*mem.coord(loc).unwrap(), [1.0, 1.0]);
        }
        assert_eq!(mem.live_blocks(), 100);
        assert_eq!(mem.write_block(2.0, 2.0), 200);
    }

    #[test]
    fn freed_block_is_rejected() {
        let mut mem = CoordMemory::new();
        let a = mem.write_block(1.0, 1.0);
        mem.remove_block(a).unwrap();
        assert!(mem.remove_block(a).is_err());
        assert!(mem.coord(a).is_err());
        assert!(mem.query(a + 1).is_err());
    }

    #[test]
    fn invalid_locations_are_rejected() {
        let mut mem = CoordMemory::new();
        mem.write_block(1.0, 1.0);
        assert!(mem.coord(1).is_err());
        assert!(mem.coord(2).is_err());
        assert!(mem.write(3, 0.0).is_err());
        assert!(mem.write(1, 5.0).is_ok());
        assert_eq!(*mem.coord(0).unwrap(), [1.0, 5.0]);
    }

    #[test]
    fn grows_by_one_page() {
        let mut mem = CoordMemory::new();
        assert_eq!(mem.pages(), 1);
        for i in 0..PAGE_FLOATS / BLOCK_SIZE {
            mem.write_block(i as f32, 0.0);
        }
        assert_eq!(mem.pages(), 2);
        let last = mem.write_block(-1.0, -2.0);
        assert_eq!(last, PAGE_FLOATS);
        assert_eq!(*mem.coord(last).unwrap(), [-1.0, -2.0]);
    }

    #[test]
    fn apply_in_both_directions_and_aliased() {
        let mut mem = CoordMemory::new();
        let a = mem.write_block(1.0, 2.0);
        let b = mem.write_block(3.0, 4.0);

        mem.apply(a, b, coord_ops::add).unwrap();
        assert_eq!(*mem.coord(a).unwrap(), [4.0, 6.0]);

        mem.apply(b, a, coord_ops::multiply).unwrap();
        assert_eq!(*mem.coord(b).unwrap(), [12.0, 24.0]);

        mem.apply(a, a, coord_ops::add).unwrap();
        assert_eq!(*mem.coord(a).unwrap(), [8.0, 12.0]);

        assert!(mem.apply(a, 40, coord_ops::add).is_err());
    }

    #[test]
    fn bytes_cover_the_buffer() {
        let mut mem = CoordMemory::new();
        mem.write_block(1.0, 0.0);
        let bytes = mem.as_bytes();
        assert_eq!(bytes.len(), PAGE_FLOATS * 4);
        assert_eq!(&bytes[..4], &1.0f32.to_ne_bytes());
    }
}
