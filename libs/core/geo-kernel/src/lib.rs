// [libs/core/geo-kernel/src/lib.rs]
// =================================================================
// APARATO: GEOMETRY KERNEL (ESTRATO L1)
// RESPONSABILIDAD: AREA / UNION / INTERSECT / DIFFERENCE / CENTROID / KINKS
// =================================================================
//!
//! §9's design notes assume "an external geometry kernel providing
//! `area`, `union`, `intersect`, `difference`, `centroid`, `kinks`".
//! This crate is that seam: a small trait (`GeoKernel`) plus a default
//! implementation (`GeoCrateKernel`) backed by the `geo` crate's
//! `BooleanOps`/`Area`/`Centroid` traits. The topology validator in
//! `atlas-validators` depends on the trait, not this implementation
//! directly, so a future PostGIS-backed kernel can be substituted
//! without touching C6.

use geo::{Area, BooleanOps, Centroid};
use geo_types::{Coord, MultiPolygon, Point, Polygon};
use rayon::prelude::*;

/// A single self-intersection ("kink") found in a ring, located by the
/// coordinate index pair of the two crossing segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kink {
    pub segment_a: usize,
    pub segment_b: usize,
    pub at: Coord<f64>,
}

pub trait GeoKernel: Send + Sync {
    fn area(&self, polygon: &MultiPolygon<f64>) -> f64;
    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;
    fn centroid(&self, polygon: &MultiPolygon<f64>) -> Option<Point<f64>>;
    /// Self-intersections ("kinks") in every ring of `polygon`. Empty
    /// means topologically simple.
    fn kinks(&self, polygon: &MultiPolygon<f64>) -> Vec<Kink>;
}

/// Default kernel, backed by the `geo` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoCrateKernel;

impl GeoKernel for GeoCrateKernel {
    fn area(&self, polygon: &MultiPolygon<f64>) -> f64 {
        polygon.unsigned_area()
    }

    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        a.union(b)
    }

    fn intersection(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        a.intersection(b)
    }

    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        a.difference(b)
    }

    fn centroid(&self, polygon: &MultiPolygon<f64>) -> Option<Point<f64>> {
        polygon.centroid()
    }

    /// §5: "CPU-bound validation (geometry operations) should be
    /// offloaded to a worker pool." Each polygon's ring scan is
    /// independent, so the per-polygon kink search is fanned out
    /// across `rayon`'s global pool rather than run sequentially.
    fn kinks(&self, polygon: &MultiPolygon<f64>) -> Vec<Kink> {
        polygon.0.par_iter().flat_map_iter(kinks_in_ring).collect()
    }
}

/// Every non-adjacent pair of segments in every ring of `polygon`,
/// tested for intersection. O(n^2) in ring length; acceptable here
/// since boundary rings rarely exceed a few thousand vertices and this
/// runs once per layer validation, not per request.
fn kinks_in_ring(polygon: &Polygon<f64>) -> Vec<Kink> {
    let mut found = Vec::new();
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        let coords: Vec<Coord<f64>> = ring.coords().copied().collect();
        if coords.len() < 4 {
            continue;
        }
        let segment_count = coords.len() - 1;
        for i in 0..segment_count {
            for j in (i + 2)..segment_count {
                // Skip the pair that shares the ring's closing vertex.
                if i == 0 && j == segment_count - 1 {
                    continue;
                }
                if let Some(at) = segment_intersection(
                    coords[i],
                    coords[i + 1],
                    coords[j],
                    coords[j + 1],
                ) {
                    found.push(Kink {
                        segment_a: i,
                        segment_b: j,
                        at,
                    });
                }
            }
        }
    }
    found
}

/// Proper intersection point of two line segments, or `None` if they
/// don't cross (parallel, disjoint, or only touching at an endpoint).
fn segment_intersection(
    p1: Coord<f64>,
    p2: Coord<f64>,
    p3: Coord<f64>,
    p4: Coord<f64>,
) -> Option<Coord<f64>> {
    let d1x = p2.x - p1.x;
    let d1y = p2.y - p1.y;
    let d2x = p4.x - p3.x;
    let d2y = p4.y - p3.y;

    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < f64::EPSILON {
        return None; // Parallel or collinear.
    }

    let t = ((p3.x - p1.x) * d2y - (p3.y - p1.y) * d2x) / denom;
    let u = ((p3.x - p1.x) * d1y - (p3.y - p1.y) * d1x) / denom;

    const EPS: f64 = 1e-9;
    if t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS {
        Some(Coord {
            x: p1.x + t * d1x,
            y: p1.y + t * d1y,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Coord};

    fn square(x0: f64, y0: f64, side: f64) -> MultiPolygon<f64> {
        let p: Polygon<f64> = polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ];
        MultiPolygon(vec![p])
    }

    #[test]
    fn area_of_unit_square_is_one() {
        let kernel = GeoCrateKernel;
        assert!((kernel.area(&square(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_squares_have_zero_intersection_area() {
        let kernel = GeoCrateKernel;
        let a = square(0.0, 0.0, 1.0);
        let b = square(10.0, 10.0, 1.0);
        let inter = kernel.intersection(&a, &b);
        assert!(kernel.area(&inter) < 1e-9);
    }

    #[test]
    fn overlapping_squares_have_positive_intersection_area() {
        let kernel = GeoCrateKernel;
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let inter = kernel.intersection(&a, &b);
        assert!((kernel.area(&inter) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn simple_square_has_no_kinks() {
        let kernel = GeoCrateKernel;
        assert!(kernel.kinks(&square(0.0, 0.0, 1.0)).is_empty());
    }

    #[test]
    fn bowtie_ring_has_a_kink() {
        let kernel = GeoCrateKernel;
        let bowtie: Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 1.0, y: 0.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        let mp = MultiPolygon(vec![bowtie]);
        let found = kernel.kinks(&mp);
        assert_eq!(found.len(), 1);
        assert!((found[0].at - Coord { x: 0.5, y: 0.5 }).x.abs() < 1e-9);
    }

    proptest::proptest! {
        /// Area is translation-invariant regardless of where the
        /// square sits on the plane — a basic sanity property for the
        /// `geo`-backed kernel that the hand-picked unit tests above
        /// don't sweep.
        #[test]
        fn area_is_translation_invariant(x0 in -1000.0f64..1000.0, y0 in -1000.0f64..1000.0, side in 0.1f64..500.0) {
            let kernel = GeoCrateKernel;
            let at_origin = kernel.area(&square(0.0, 0.0, side));
            let translated = kernel.area(&square(x0, y0, side));
            proptest::prop_assert!((at_origin - translated).abs() < 1e-6);
        }

        /// Axis-aligned, non-self-crossing rectangles never report a
        /// kink, whatever their position or size (§4.6: only actually
        /// crossing rings are topology errors).
        #[test]
        fn axis_aligned_rectangle_never_has_a_kink(x0 in -1000.0f64..1000.0, y0 in -1000.0f64..1000.0, side in 0.1f64..500.0) {
            let kernel = GeoCrateKernel;
            proptest::prop_assert!(kernel.kinks(&square(x0, y0, side)).is_empty());
        }
    }
}
