//! Ecliptic-longitude aspect geometry.
//!
//! An aspect is a target angle between the longitudes of two bodies. The
//! signed residual `normalize(lon_a - lon_b - target)` crosses zero when the
//! aspect is exact, which is what the aspect calendar searches for.

/// A named target angle with the orb used for instantaneous detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aspect {
    pub name: &'static str,
    pub angle_deg: f64,
    /// Maximum deviation from `angle_deg` still reported by [`find_aspects`].
    pub orb_deg: f64,
}

impl Aspect {
    pub const fn new(name: &'static str, angle_deg: f64, orb_deg: f64) -> Self {
        Self {
            name,
            angle_deg,
            orb_deg,
        }
    }

    /// Signed longitude differences at which the aspect is exact.
    ///
    /// Conjunction and opposition have one; every other aspect occurs on
    /// both sides, e.g. a square at +90° and at -90°.
    pub fn targets(&self) -> Vec<f64> {
        let angle = longitude_offset(self.angle_deg);
        if angle == 0.0 || angle == 180.0 {
            vec![angle]
        } else {
            vec![angle, -angle]
        }
    }
}

pub const CONJUNCTION: Aspect = Aspect::new("conjunction", 0.0, 8.0);
pub const SEXTILE: Aspect = Aspect::new("sextile", 60.0, 6.0);
pub const SQUARE: Aspect = Aspect::new("square", 90.0, 7.0);
pub const TRINE: Aspect = Aspect::new("trine", 120.0, 8.0);
pub const OPPOSITION: Aspect = Aspect::new("opposition", 180.0, 8.0);

pub const MAJOR_ASPECTS: [Aspect; 5] = [CONJUNCTION, SEXTILE, SQUARE, TRINE, OPPOSITION];

/// Normalize an angle in degrees into (-180, +180].
pub fn longitude_offset(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Signed distance of the pair from an exact aspect at `target_deg`.
pub fn aspect_offset(lon_a: f64, lon_b: f64, target_deg: f64) -> f64 {
    longitude_offset(lon_a - lon_b - target_deg)
}

/// Smallest angle between two longitudes, in [0, 180].
pub fn angle_diff(a: f64, b: f64) -> f64 {
    longitude_offset(a - b).abs()
}

/// An aspect in orb at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct AspectHit {
    pub body_a: String,
    pub body_b: String,
    pub aspect: Aspect,
    /// Current angular separation in [0, 180].
    pub separation_deg: f64,
    /// `|separation - aspect angle|`.
    pub deviation_deg: f64,
}

/// Every aspect within orb for each unordered pair of named longitudes.
///
/// Pairs follow input order (`a` before `b`); non-finite longitudes are
/// ignored.
pub fn find_aspects(longitudes: &[(&str, f64)], aspects: &[Aspect]) -> Vec<AspectHit> {
    let mut hits = Vec::new();
    for (i, &(name_a, lon_a)) in longitudes.iter().enumerate() {
        for &(name_b, lon_b) in &longitudes[i + 1..] {
            if !lon_a.is_finite() || !lon_b.is_finite() {
                continue;
            }
            let separation_deg = angle_diff(lon_a, lon_b);
            for aspect in aspects {
                let deviation_deg = (separation_deg - aspect.angle_deg).abs();
                if deviation_deg <= aspect.orb_deg {
                    hits.push(AspectHit {
                        body_a: name_a.to_owned(),
                        body_b: name_b.to_owned(),
                        aspect: *aspect,
                        separation_deg,
                        deviation_deg,
                    });
                }
            }
        }
    }
    hits
}

/// Great-circle separation in degrees between two equatorial positions.
///
/// Right ascensions are in hours, declinations in degrees.
pub fn angular_separation_deg(ra1_h: f64, dec1_deg: f64, ra2_h: f64, dec2_deg: f64) -> f64 {
    let ra1 = (ra1_h * 15.0).to_radians();
    let ra2 = (ra2_h * 15.0).to_radians();
    let dec1 = dec1_deg.to_radians();
    let dec2 = dec2_deg.to_radians();
    let cos_sep = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}
