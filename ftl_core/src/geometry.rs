//! Flash geometry: the fixed hierarchy of packages/dies/planes/blocks/pages and the
//! quantities derived from it.

use snafu::{ensure, Snafu};

/// Errors produced while validating a [`Geometry`].
#[derive(Debug, Snafu, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum InvalidGeometry {
    /// One of the hierarchy dimensions (packages/dies/planes/blocks/pages) is zero.
    #[snafu(display("geometry dimension must be non-zero"))]
    ZeroDimension,

    /// `overprovisioning` is not a percentage in `[0, 100)`.
    #[snafu(display("overprovisioning must be in [0, 100), got {value}"))]
    OverprovisioningOutOfRange {
        /// The offending value.
        value: u32,
    },

    /// The derived reservation has no room left for the permanent cleaning block.
    #[snafu(display("overprovisioning does not reserve enough blocks for the cleaning block"))]
    NoReservedBlocks,
}

/// The fixed flash hierarchy and overprovisioning policy, established once at startup.
///
/// This is an immutable value type: a fresh [`crate::ftl::Ftl`] is constructed from a
/// `Geometry` and never mutates it, matching the distilled spec's guidance to treat geometry
/// as configuration rather than process-wide mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of packages in the SSD.
    pub ssd_size: u32,
    /// Number of dies per package.
    pub package_size: u32,
    /// Number of planes per die.
    pub die_size: u32,
    /// Number of blocks per plane.
    pub plane_size: u32,
    /// Number of pages per block.
    pub block_size: u32,
    /// Percentage (integer, `[0, 100)`) of raw capacity reserved as overprovisioning.
    pub overprovisioning: u32,
}

impl Geometry {
    /// Validate `self`, producing the quantities derived from it.
    ///
    /// # Errors
    /// - [`InvalidGeometry::ZeroDimension`] if any hierarchy dimension is zero.
    /// - [`InvalidGeometry::OverprovisioningOutOfRange`] if `overprovisioning >= 100`.
    /// - [`InvalidGeometry::NoReservedBlocks`] if the reservation has no room for the
    ///   permanent cleaning block.
    pub fn derive(&self) -> Result<Derived, InvalidGeometry> {
        ensure!(
            self.ssd_size > 0
                && self.package_size > 0
                && self.die_size > 0
                && self.plane_size > 0
                && self.block_size > 0,
            ZeroDimensionSnafu
        );
        ensure!(
            self.overprovisioning < 100,
            OverprovisioningOutOfRangeSnafu {
                value: self.overprovisioning,
            }
        );

        let total_blocks = u64::from(self.ssd_size)
            * u64::from(self.package_size)
            * u64::from(self.die_size)
            * u64::from(self.plane_size);
        let total_pages = total_blocks * u64::from(self.block_size);
        let reserved_blocks = (u64::from(self.overprovisioning) * total_blocks) / 100;

        ensure!(reserved_blocks >= 1, NoReservedBlocksSnafu);

        let data_blocks = total_blocks - reserved_blocks;
        let cleaning_block_index = total_blocks - 1;

        Ok(Derived {
            geometry: *self,
            total_blocks,
            total_pages,
            reserved_blocks,
            data_blocks,
            cleaning_block_index,
        })
    }
}

/// Quantities derived from a [`Geometry`], computed once and held for the life of the FTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    /// The geometry these quantities were derived from.
    pub geometry: Geometry,
    /// `SSD_SIZE · PACKAGE_SIZE · DIE_SIZE · PLANE_SIZE`.
    pub total_blocks: u64,
    /// `TOTAL_BLOCKS · BLOCK_SIZE`.
    pub total_pages: u64,
    /// `floor(OVERPROVISIONING/100 · TOTAL_BLOCKS)`.
    pub reserved_blocks: u64,
    /// `TOTAL_BLOCKS − RESERVED_BLOCKS`.
    pub data_blocks: u64,
    /// `TOTAL_BLOCKS − 1`, the block index permanently reserved for GC staging.
    pub cleaning_block_index: u64,

}

impl Derived {
    /// The first LBA in the overprovisioned range, i.e. the exclusive upper bound of the
    /// host-addressable data region.
    #[must_use]
    pub fn data_region_end_lba(&self) -> u64 {
        self.data_blocks * u64::from(self.geometry.block_size)
    }

    /// The number of log-reservation blocks available to the directory, i.e. every reserved
    /// block except the cleaning block.
    #[must_use]
    pub fn log_reservation_capacity(&self) -> u64 {
        self.reserved_blocks - 1
    }

    /// The block index of the `k`-th log block ever allocated (0-indexed).
    #[must_use]
    pub fn log_block_index(&self, k: u64) -> u64 {
        self.data_blocks + k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn small() -> Geometry {
        Geometry {
            ssd_size: 2,
            package_size: 2,
            die_size: 2,
            plane_size: 2,
            block_size: 4,
            overprovisioning: 10,
        }
    }

    #[test]
    fn derives_expected_quantities() {
        let d = small().derive().unwrap();
        assert_eq!(d.total_blocks, 16);
        assert_eq!(d.total_pages, 64);
        assert_eq!(d.reserved_blocks, 1);
        assert_eq!(d.data_blocks, 15);
        assert_eq!(d.cleaning_block_index, 15);
    }

    #[test]
    fn log_reservation_capacity_excludes_cleaning_block() {
        let g = Geometry {
            overprovisioning: 50,
            ..small()
        };
        let d = g.derive().unwrap();
        assert_eq!(d.reserved_blocks, 8);
        assert_eq!(d.log_reservation_capacity(), 7);
    }

    #[test_case(0, 2, 2, 2, 4; "ssd_size zero")]
    #[test_case(2, 0, 2, 2, 4; "package_size zero")]
    #[test_case(2, 2, 0, 2, 4; "die_size zero")]
    #[test_case(2, 2, 2, 0, 4; "plane_size zero")]
    #[test_case(2, 2, 2, 2, 0; "block_size zero")]
    fn rejects_zero_dimensions(
        ssd_size: u32,
        package_size: u32,
        die_size: u32,
        plane_size: u32,
        block_size: u32,
    ) {
        let g = Geometry {
            ssd_size,
            package_size,
            die_size,
            plane_size,
            block_size,
            overprovisioning: 10,
        };
        assert_eq!(g.derive().unwrap_err(), InvalidGeometry::ZeroDimension);
    }

    #[test]
    fn rejects_overprovisioning_at_or_above_100() {
        let g = Geometry {
            overprovisioning: 100,
            ..small()
        };
        assert!(matches!(
            g.derive().unwrap_err(),
            InvalidGeometry::OverprovisioningOutOfRange { value: 100 }
        ));
    }

    #[test]
    fn rejects_zero_reservation() {
        let g = Geometry {
            overprovisioning: 0,
            ..small()
        };
        assert_eq!(g.derive().unwrap_err(), InvalidGeometry::NoReservedBlocks);
    }

    #[test]
    fn data_region_end_lba_matches_data_blocks_times_block_size() {
        let d = small().derive().unwrap();
        assert_eq!(d.data_region_end_lba(), 15 * 4);
    }

    #[test]
    fn log_block_index_is_offset_from_data_blocks() {
        let d = small().derive().unwrap();
        assert_eq!(d.log_block_index(0), d.data_blocks);
        assert_eq!(d.log_block_index(3), d.data_blocks + 3);
    }
}
