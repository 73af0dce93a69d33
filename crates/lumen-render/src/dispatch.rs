//! Partitioning of the image into worker groups.

use lumen_scene::RenderParams;

/// Edge length of a square worker group, in pixels.
pub const GROUP_SIZE: u32 = 16;

/// A 2-D grid of square worker groups covering an image.
///
/// The grid may overshoot the image on its right and bottom edges; workers
/// outside the image must check [`WorkGrid::contains`] and do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGrid {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Group edge length.
    pub group_size: u32,
    /// Groups along x.
    pub groups_x: u32,
    /// Groups along y.
    pub groups_y: u32,
}

impl WorkGrid {
    /// The smallest grid of `group_size` groups covering `width` x `height`.
    pub fn covering(width: u32, height: u32, group_size: u32) -> Self {
        let group_size = group_size.max(1);
        Self {
            width,
            height,
            group_size,
            groups_x: width.div_ceil(group_size),
            groups_y: height.div_ceil(group_size),
        }
    }

    /// The grid for an image described by `params`, with [`GROUP_SIZE`] groups.
    pub fn for_params(params: &RenderParams) -> Self {
        Self::covering(params.width, params.height, GROUP_SIZE)
    }

    /// Whether worker `(x, y)` maps to a pixel.
    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    /// Row-major index of pixel `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Number of worker groups launched.
    pub fn group_count(&self) -> usize {
        self.groups_x as usize * self.groups_y as usize
    }

    /// Number of workers launched, including those past the image edge.
    pub fn worker_count(&self) -> usize {
        self.group_count() * (self.group_size as usize).pow(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_fit() {
        let grid = WorkGrid::covering(64, 32, 16);
        assert_eq!((grid.groups_x, grid.groups_y), (4, 2));
        assert_eq!(grid.worker_count(), 64 * 32);
    }

    #[test]
    fn test_overshoot_is_guarded() {
        let grid = WorkGrid::covering(17, 5, 16);
        assert_eq!((grid.groups_x, grid.groups_y), (2, 1));
        assert_eq!(grid.worker_count(), 512);

        let inside = (0..32)
            .flat_map(|y| (0..32).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.contains(x, y))
            .count();
        assert_eq!(inside, 17 * 5);
        assert!(!grid.contains(17, 0));
        assert!(!grid.contains(0, 5));
    }

    #[test]
    fn test_row_major_index() {
        let grid = WorkGrid::covering(10, 3, 16);
        assert_eq!(grid.index(0, 0), 0);
        assert_eq!(grid.index(9, 0), 9);
        assert_eq!(grid.index(0, 1), 10);
        assert_eq!(grid.index(4, 2), 24);
    }
}
