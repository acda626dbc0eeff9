use std::f64::consts::TAU;

/// Sector layout for a roster of `sector_count` participants.
///
/// Angles are in radians in the wheel's own frame, before rotation. The pointer
/// sits at angle 0 of the viewer frame, so a wheel rotated by `r` shows the
/// sector containing `-r` under the pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelGeometry {
    sector_count: usize,
    sector_width: f64,
}

impl WheelGeometry {
    /// `None` for an empty roster.
    pub fn new(sector_count: usize) -> Option<Self> {
        if sector_count == 0 {
            return None;
        }
        Some(Self {
            sector_count,
            sector_width: TAU / sector_count as f64,
        })
    }

    pub fn sector_count(&self) -> usize {
        self.sector_count
    }

    pub fn sector_width(&self) -> f64 {
        self.sector_width
    }

    /// `[start, end)` of sector `index`, or `None` past the roster.
    pub fn sector_range(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.sector_count {
            return None;
        }
        let start = index as f64 * self.sector_width;
        Some((start, start + self.sector_width))
    }

    pub fn sector_mid(&self, index: usize) -> Option<f64> {
        self.sector_range(index)
            .map(|(start, _)| start + self.sector_width / 2.0)
    }

    /// Rotation that leaves the pointer on the middle of `winning_index`.
    pub fn target_rotation(&self, winning_index: usize, full_spins: u32) -> Option<f64> {
        let mid = self.sector_mid(winning_index)?;
        Some(full_spins as f64 * TAU - mid)
    }

    pub fn sector_at_pointer(&self, rotation: f64) -> usize {
        let angle = (-rotation).rem_euclid(TAU);
        let index = (angle / self.sector_width).floor() as usize;
        index.min(self.sector_count - 1)
    }
}

pub fn ease_out_quint(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(5)
}

/// One spin from rest to the winning sector, as a function of wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinPlan {
    geometry: WheelGeometry,
    winning_index: usize,
    full_spins: u32,
    target_rotation: f64,
    started_at_ms: f64,
    duration_ms: f64,
}

impl SpinPlan {
    pub fn new(
        sector_count: usize,
        winning_index: usize,
        full_spins: u32,
        started_at_ms: f64,
        duration_ms: f64,
    ) -> Option<Self> {
        let geometry = WheelGeometry::new(sector_count)?;
        let target_rotation = geometry.target_rotation(winning_index, full_spins)?;
        Some(Self {
            geometry,
            winning_index,
            full_spins,
            target_rotation,
            started_at_ms,
            duration_ms: duration_ms.max(0.0),
        })
    }

    pub fn geometry(&self) -> WheelGeometry {
        self.geometry
    }

    pub fn winning_index(&self) -> usize {
        self.winning_index
    }

    pub fn full_spins(&self) -> u32 {
        self.full_spins
    }

    pub fn target_rotation(&self) -> f64 {
        self.target_rotation
    }

    pub fn ends_at_ms(&self) -> f64 {
        self.started_at_ms + self.duration_ms
    }

    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_at_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn rotation_at(&self, now_ms: f64) -> f64 {
        self.target_rotation * ease_out_quint(self.progress(now_ms))
    }

    pub fn is_settled(&self, now_ms: f64) -> bool {
        now_ms >= self.ends_at_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roster_has_no_geometry() {
        assert!(WheelGeometry::new(0).is_none());
        assert!(SpinPlan::new(0, 0, 12, 0.0, 7_000.0).is_none());
    }

    #[test]
    fn sectors_tile_the_circle() {
        let geometry = WheelGeometry::new(4).unwrap();
        assert_eq!(geometry.sector_range(0), Some((0.0, TAU / 4.0)));
        let (start, end) = geometry.sector_range(3).unwrap();
        assert!((start - 3.0 * TAU / 4.0).abs() < 1e-12);
        assert!((end - TAU).abs() < 1e-12);
        assert_eq!(geometry.sector_range(4), None);
    }

    #[test]
    fn target_rotation_lands_on_winner_for_every_roster() {
        for n in 1..=64usize {
            let geometry = WheelGeometry::new(n).unwrap();
            for index in 0..n {
                for spins in [12u32, 13, 16, 40] {
                    let rotation = geometry.target_rotation(index, spins).unwrap();
                    assert_eq!(geometry.sector_at_pointer(rotation), index, "n={n} i={index}");

                    let pointer = (-rotation).rem_euclid(TAU);
                    let (start, end) = geometry.sector_range(index).unwrap();
                    assert!(pointer >= start - 1e-9 && pointer < end, "n={n} i={index}");
                }
            }
        }
    }

    #[test]
    fn full_spins_do_not_change_the_landing_sector() {
        let geometry = WheelGeometry::new(7).unwrap();
        let a = geometry.target_rotation(5, 12).unwrap();
        let b = geometry.target_rotation(5, 15).unwrap();
        assert!(((b - a) - 3.0 * TAU).abs() < 1e-9);
    }

    #[test]
    fn ease_out_curve_is_monotonic_and_bounded() {
        assert_eq!(ease_out_quint(0.0), 0.0);
        assert_eq!(ease_out_quint(1.0), 1.0);
        assert_eq!(ease_out_quint(2.0), 1.0);
        let mut last = 0.0;
        for step in 1..=100 {
            let value = ease_out_quint(step as f64 / 100.0);
            assert!(value >= last);
            last = value;
        }
        assert!(ease_out_quint(0.5) > 0.9);
    }

    #[test]
    fn spin_is_a_function_of_elapsed_time() {
        let plan = SpinPlan::new(5, 2, 12, 10_000.0, 7_000.0).unwrap();
        assert_eq!(plan.rotation_at(9_000.0), 0.0);
        assert_eq!(plan.rotation_at(10_000.0), 0.0);
        let mid = plan.rotation_at(13_500.0);
        assert_eq!(mid, plan.rotation_at(13_500.0));
        assert!(mid > 0.0 && mid < plan.target_rotation());
        assert!(!plan.is_settled(16_999.0));
        assert!(plan.is_settled(17_000.0));
        assert_eq!(plan.rotation_at(17_000.0), plan.target_rotation());
        assert_eq!(plan.rotation_at(99_000.0), plan.target_rotation());
        assert_eq!(plan.geometry().sector_at_pointer(plan.rotation_at(17_000.0)), 2);
    }
}
