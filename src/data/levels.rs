//! Built-in dataset: cumulative experience thresholds per character level.

use crate::domain::Observation;

/// Cumulative experience required to reach each character level, indexed by
/// level. Level 0 needs nothing; the table tops out at level 50.
pub const LEVEL_XP: [u32; 51] = [
    0, 2000, 4620, 8040, 12489, 18258, 25712, 35309,
    47622, 63364, 83419, 108879, 141086, 181683, 231075, 313656,
    424067, 571190, 766569, 1025154, 1366227, 1814568, 2401895, 3168651,
    4166200, 5459523, 7130496, 9281874, 12042092, 15571031, 20066900, 25774405,
    32994399, 42095202, 53525811, 67831218, 85670061, 107834823, 135274799, 169122009,
    210720231, 261657253, 323800420, 399335440, 490808349, 601170414, 733825617, 892680222,
    1082908612, 1310707109, 1583495809,
];

/// The level/XP table as fit-ready observations.
pub fn observations() -> Vec<Observation> {
    LEVEL_XP
        .iter()
        .enumerate()
        .map(|(level, &xp)| Observation {
            x: level as f64,
            y: xp as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_levels_zero_through_fifty() {
        let obs = observations();
        assert_eq!(obs.len(), 51);
        assert_eq!(obs[0].x, 0.0);
        assert_eq!(obs[0].y, 0.0);
        assert_eq!(obs[50].x, 50.0);
        assert_eq!(obs[50].y, 1_583_495_809.0);
    }

    #[test]
    fn thresholds_strictly_increase() {
        assert!(LEVEL_XP.windows(2).all(|w| w[0] < w[1]));
    }
}
