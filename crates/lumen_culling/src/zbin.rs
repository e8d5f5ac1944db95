use crate::NUM_Z_BINS;
use crate::snapshot::SortedLight;

/// Contiguous range of sorted-array positions whose depth extent touches
/// one Z slice. Empty iff `min_index > max_index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZBin {
    pub min_index: u16,
    pub max_index: u16,
}

impl ZBin {
    pub const EMPTY: Self = Self {
        min_index: u16::MAX,
        max_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.min_index > self.max_index
    }

    /// The wire format the shading pass reads: min in the low half-word,
    /// max in the high one.
    pub fn pack(&self) -> u32 {
        u32::from(self.min_index) | (u32::from(self.max_index) << 16)
    }
}

/// Per bin, scan the whole sorted array and keep the minimal index range
/// of lights whose `[z_min, z_max]` interval intersects the bin interval.
/// No early exit: a wide light interval can overlap bins far from where
/// its center sorts, so sortedness alone does not bound the scan.
pub(crate) fn build_z_bins(bins: &mut [ZBin; NUM_Z_BINS], sorted: &[SortedLight]) {
    let bin_size = 1.0 / NUM_Z_BINS as f32;
    for (bin_index, bin) in bins.iter_mut().enumerate() {
        *bin = ZBin::EMPTY;
        let bin_min = bin_size * bin_index as f32;
        let bin_max = bin_min + bin_size;

        for (i, light) in sorted.iter().enumerate() {
            let overlaps = light.projected_z_min <= bin_max && light.projected_z_max >= bin_min;
            if overlaps {
                bin.min_index = bin.min_index.min(i as u16);
                bin.max_index = bin.max_index.max(i as u16);
            }
        }
    }
}
