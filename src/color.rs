use image::{GenericImageView, Rgb};
use itertools::Itertools;
use num::pow::Pow;

/// Per-channel mean of an RGB pixel buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct AverageColor(pub [f64; 3]);

impl AverageColor {
    /// Euclidean distance in RGB channel space.
    pub(crate) fn distance(&self, other: &AverageColor) -> f64 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).pow(2_i32))
            .sum::<f64>()
            .sqrt()
    }
}

/// Works on owned images and on `SubImage` views alike.
/// An image without pixels averages to black.
pub(crate) fn average_color<I>(image: &I) -> AverageColor
where
    I: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = image.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return AverageColor::default();
    }
    let mut sums = [0_u64; 3];
    for (_, _, Rgb(rgb)) in image.pixels() {
        for (sum, channel) in sums.iter_mut().zip(rgb) {
            *sum += u64::from(channel);
        }
    }
    AverageColor(sums.map(|sum| sum as f64 / count as f64))
}

/// Index of the candidate closest to `query`; the earliest one wins a tie.
/// `None` only when there are no candidates.
pub(crate) fn find_best_match(query: &AverageColor, candidates: &[AverageColor]) -> Option<usize> {
    candidates
        .iter()
        .map(|candidate| query.distance(candidate))
        .position_min_by(|a, b| a.total_cmp(b))
}
