use image::{imageops::crop_imm, GenericImageView, SubImage};
use itertools::iproduct;

/// A rectangle of the main image, borrowed rather than copied.
pub(crate) struct Block<'a, I> {
    image: &'a I,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl<'a, I: GenericImageView> Block<'a, I> {
    pub(crate) fn view(&self) -> SubImage<&'a I> {
        crop_imm(self.image, self.x, self.y, self.width, self.height)
    }
}

/// Blocks per row: `floor(image_width / block_width)`.
pub(crate) fn column_count(image_width: u32, block_width: u32) -> u32 {
    image_width / block_width
}

/// Maps the flat index of a block yielded by [`split_into_blocks`] back to its top-left corner.
pub(crate) fn block_position(
    index: usize,
    columns: u32,
    block_width: u32,
    block_height: u32,
) -> (u32, u32) {
    let columns = columns as usize;
    let row = index / columns;
    let col = index % columns;
    (col as u32 * block_width, row as u32 * block_height)
}

/// Row-major, non-overlapping blocks of exactly `block_width` x `block_height`.
/// Strips on the right and bottom too small for a whole block are dropped.
///
/// Both block dimensions must be non-zero.
pub(crate) fn split_into_blocks<I: GenericImageView>(
    image: &I,
    block_width: u32,
    block_height: u32,
) -> impl Iterator<Item = Block<'_, I>> {
    let (width, height) = image.dimensions();
    let ys = (0..height).step_by(block_height as usize);
    let xs = (0..width).step_by(block_width as usize);
    iproduct!(ys, xs)
        .filter(move |&(y, x)| block_width <= width - x && block_height <= height - y)
        .map(move |(y, x)| Block {
            image,
            x,
            y,
            width: block_width,
            height: block_height,
        })
}
