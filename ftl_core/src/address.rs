//! Physical addresses and the bijection between them and the linear LBA space.

use crate::geometry::Derived;

/// The finest hierarchy level populated in an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Valid {
    /// Only `package` is meaningful.
    Package,
    /// `package`, `die`, `plane` and `block` are meaningful; `page` is not.
    Block,
    /// All five fields are meaningful.
    Page,
}

/// A physical block address: the 5-tuple `(package, die, plane, block, page)`.
///
/// `valid` records how much of the tuple was actually populated by whoever constructed it;
/// fields beyond that level are `0` by convention but should not be relied upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// Package index.
    pub package: u32,
    /// Die index within the package.
    pub die: u32,
    /// Plane index within the die.
    pub plane: u32,
    /// Block index within the plane.
    pub block: u32,
    /// Page index within the block.
    pub page: u32,
    /// The finest level actually populated.
    pub valid: Valid,
}

impl Address {
    /// A block-level address, with `page` left at `0` and [`Valid::Block`].
    #[must_use]
    pub fn block(package: u32, die: u32, plane: u32, block: u32) -> Self {
        Self {
            package,
            die,
            plane,
            block,
            page: 0,
            valid: Valid::Block,
        }
    }

    /// A page-level address.
    #[must_use]
    pub fn page(package: u32, die: u32, plane: u32, block: u32, page: u32) -> Self {
        Self {
            package,
            die,
            plane,
            block,
            page,
            valid: Valid::Page,
        }
    }

    /// This address with its `page` field replaced, re-tagged as [`Valid::Page`].
    #[must_use]
    pub fn with_page(self, page: u32) -> Self {
        Self {
            page,
            valid: Valid::Page,
            ..self
        }
    }

    /// The linear block index `((pkg · PACKAGE_SIZE + die) · DIE_SIZE + plane) · PLANE_SIZE + block`.
    #[must_use]
    pub fn block_index(&self, g: &Derived) -> u64 {
        let geo = &g.geometry;
        (((u64::from(self.package) * u64::from(geo.package_size) + u64::from(self.die))
            * u64::from(geo.die_size)
            + u64::from(self.plane))
            * u64::from(geo.plane_size)
            + u64::from(self.block)
    }
}

/// Decompose a linear LBA into its `(package, die, plane, block, page)` tuple.
///
/// Per-level division and modulo by the product of the sizes below that level; the page
/// offset is simply `lba % BLOCK_SIZE` (the cleaner, mathematically equivalent form of the
/// two-step modulo used by the original implementation).
#[must_use]
pub fn decompose(g: &Derived, lba: u64) -> Address {
    let geo = &g.geometry;
    let block_size = u64::from(geo.block_size);
    let plane_size = u64::from(geo.plane_size);
    let die_size = u64::from(geo.die_size);
    let package_size = u64::from(geo.package_size);

    let page = (lba % block_size) as u32;
    let block_linear = lba / block_size;

    let block = (block_linear % plane_size) as u32;
    let plane_linear = block_linear / plane_size;

    let plane = (plane_linear % die_size) as u32;
    let die_linear = plane_linear / die_size;

    let die = (die_linear % package_size) as u32;
    let package = (die_linear / package_size) as u32;

    Address::page(package, die, plane, block, page)
}

/// Compose a block-level address back into the LBA of its first page.
#[must_use]
pub fn compose_block_base(g: &Derived, package: u32, die: u32, plane: u32, block: u32) -> u64 {
    let geo = &g.geometry;
    let block_linear = ((u64::from(package) * u64::from(geo.package_size) + u64::from(die))
        * u64::from(geo.die_size)
        + u64::from(plane))
        * u64::from(geo.plane_size)
        + u64::from(block);
    block_linear * u64::from(geo.block_size)
}

/// Decompose a block-index (not an LBA) into its `(package, die, plane, block)` tuple.
#[must_use]
pub fn decompose_block_index(g: &Derived, block_index: u64) -> Address {
    decompose(g, block_index * u64::from(g.geometry.block_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use test_case::test_matrix;

    fn geometry() -> Derived {
        Geometry {
            ssd_size: 2,
            package_size: 2,
            die_size: 2,
            plane_size: 2,
            block_size: 4,
            overprovisioning: 10,
        }
        .derive()
        .unwrap()
    }

    #[test]
    fn decompose_then_recompose_round_trips_block_base() {
        let g = geometry();
        for block_index in 0..g.total_blocks {
            let addr = decompose_block_index(&g, block_index);
            let base = compose_block_base(&g, addr.package, addr.die, addr.plane, addr.block);
            assert_eq!(base, block_index * u64::from(g.geometry.block_size));
        }
    }

    #[test]
    fn decompose_is_total_across_the_whole_address_space() {
        let g = geometry();
        for lba in 0..g.total_pages {
            let addr = decompose(&g, lba);
            assert!(addr.package < g.geometry.ssd_size);
            assert!(addr.die < g.geometry.package_size);
            assert!(addr.plane < g.geometry.die_size);
            assert!(addr.block < g.geometry.plane_size);
            assert!(addr.page < g.geometry.block_size);
        }
    }

    #[test_matrix([0, 1, 4, 5, 63])]
    fn page_offset_is_lba_mod_block_size(lba: u64) {
        let g = geometry();
        let addr = decompose(&g, lba);
        assert_eq!(u64::from(addr.page), lba % u64::from(g.geometry.block_size));
    }

    #[test]
    fn block_index_matches_decompose_block_index() {
        let g = geometry();
        for block_index in 0..g.total_blocks {
            let addr = decompose_block_index(&g, block_index);
            assert_eq!(addr.block_index(&g), block_index);
        }
    }

    #[test]
    fn with_page_preserves_block_coordinates() {
        let g = geometry();
        let addr = decompose_block_index(&g, 3).with_page(2);
        assert_eq!(addr.page, 2);
        assert_eq!(addr.valid, Valid::Page);
        assert_eq!(addr.block_index(&g), 3);
    }
}
