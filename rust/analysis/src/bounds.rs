// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding-box accumulation from CARTESIAN_POINT coordinates.
//!
//! Gives a quick sense of model scale and coordinate range without
//! any geometry evaluation. Points are taken as written; placements
//! and transforms are not applied.

use crate::types::BoundingBox;

/// Incremental min/max accumulator in f64 precision.
#[derive(Debug, Clone)]
pub(crate) struct BoundsAccumulator {
    min_x: f64,
    min_y: f64,
    min_z: f64,
    max_x: f64,
    max_y: f64,
    max_z: f64,
    count: u64,
}

impl BoundsAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            min_z: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
            max_z: f64::MIN,
            count: 0,
        }
    }

    /// Expand the bounds to include a point.
    #[inline]
    pub(crate) fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.min_z = self.min_z.min(z);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.max_z = self.max_z.max(z);
        self.count += 1;
    }

    /// Finish: `None` when no point ever contributed.
    pub(crate) fn into_bounding_box(self) -> Option<BoundingBox> {
        if self.count == 0 {
            return None;
        }
        Some(BoundingBox {
            min_x: self.min_x,
            min_y: self.min_y,
            min_z: self.min_z,
            max_x: self.max_x,
            max_y: self.max_y,
            max_z: self.max_z,
            point_count: self.count,
        })
    }
}
