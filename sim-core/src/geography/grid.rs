// Fixed 2D lattice of firms with a Moore-neighborhood adjacency

use rand::Rng;

use crate::agents::Firm;
use crate::types::FirmCoord;

/// Firms laid out on a `width` x `height` lattice, one per cell.
///
/// Topology never changes after construction. Adjacency is derived from
/// coordinates, not stored.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    /// Row-major in x: index = x * height + y
    firms: Vec<Firm>,
}

impl Grid {
    /// Build a grid by calling `make` for every cell in scan order.
    pub fn from_fn(width: u32, height: u32, mut make: impl FnMut(FirmCoord) -> Firm) -> Self {
        let mut firms = Vec::with_capacity(width as usize * height as usize);
        for x in 0..width {
            for y in 0..height {
                let coord = FirmCoord::new(x, y);
                let firm = make(coord);
                assert_eq!(firm.coord, coord, "firm built for {coord} reports {}", firm.coord);
                firms.push(firm);
            }
        }
        Self {
            width,
            height,
            firms,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.firms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.firms.is_empty()
    }

    pub fn contains(&self, coord: FirmCoord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    fn slot(&self, coord: FirmCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.x as usize * self.height as usize + coord.y as usize)
    }

    pub fn get(&self, coord: FirmCoord) -> Option<&Firm> {
        self.slot(coord).map(|i| &self.firms[i])
    }

    pub fn get_mut(&mut self, coord: FirmCoord) -> Option<&mut Firm> {
        self.slot(coord).map(move |i| &mut self.firms[i])
    }

    /// Firms in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &Firm> {
        self.firms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Firm> {
        self.firms.iter_mut()
    }

    pub fn coords(&self) -> impl Iterator<Item = FirmCoord> + '_ {
        self.firms.iter().map(|f| f.coord)
    }

    /// Cells within Chebyshev distance `radius` of `center`, excluding the
    /// center itself, clipped at the edges.
    ///
    /// Ordered by x offset, then y offset, so tie-breaks downstream are
    /// reproducible.
    pub fn neighbors(&self, center: FirmCoord, radius: u32) -> Vec<FirmCoord> {
        let mut out = Vec::new();
        if !self.contains(center) {
            return out;
        }

        let x_lo = center.x.saturating_sub(radius);
        let x_hi = center.x.saturating_add(radius).min(self.width - 1);
        let y_lo = center.y.saturating_sub(radius);
        let y_hi = center.y.saturating_add(radius).min(self.height - 1);

        for x in x_lo..=x_hi {
            for y in y_lo..=y_hi {
                let coord = FirmCoord::new(x, y);
                if coord != center {
                    out.push(coord);
                }
            }
        }
        out
    }

    /// A uniformly random cell. Draws x first, then y.
    pub fn random_coord<R: Rng>(&self, rng: &mut R) -> FirmCoord {
        let x = rng.random_range(0..self.width);
        let y = rng.random_range(0..self.height);
        FirmCoord::new(x, y)
    }
}

impl std::ops::Index<FirmCoord> for Grid {
    type Output = Firm;

    fn index(&self, coord: FirmCoord) -> &Firm {
        self.get(coord)
            .unwrap_or_else(|| panic!("{coord} outside {}x{} grid", self.width, self.height))
    }
}

impl std::ops::IndexMut<FirmCoord> for Grid {
    fn index_mut(&mut self, coord: FirmCoord) -> &mut Firm {
        let (width, height) = (self.width, self.height);
        self.get_mut(coord)
            .unwrap_or_else(|| panic!("{coord} outside {width}x{height} grid"))
    }
}
