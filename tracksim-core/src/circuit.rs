//! Built-in reference circuit
//!
//! ~5.95 km road course with 25 segments and 30 timing gates.

use crate::error::SimError;
use crate::track::{Direction::*, Track};

/// Gate distances in gate order; the final entry is the start/finish line
const GATE_DISTANCES_M: [f64; 30] = [
    198.374, 396.749, 595.123, 793.497, 991.872, 1190.246, 1388.620, 1586.995, 1785.369, 1983.743,
    2182.118, 2380.492, 2578.866, 2777.240, 2975.615, 3173.989, 3372.363, 3570.738, 3769.112,
    3967.486, 4165.861, 4364.235, 4562.609, 4760.984, 4959.358, 5157.732, 5356.107, 5554.481,
    5752.856, 0.0,
];

pub fn reference_circuit() -> Result<Track, SimError> {
    Track::builder("Zenith Park")
        .straight("Start/Finish Straight", 700.0)
        .arc("T1 Right Hairpin", 94.248, 45.0, Right)
        .straight("Short Straight A", 90.0)
        .arc("T2 Right Tight", 85.018, 65.0, Right)
        .arc("T3 Left Kink", 27.925, 40.0, Left)
        .straight("Medium Straight", 250.0)
        .arc("T4 S-entry R", 79.419, 70.0, Right)
        .arc("T5 Esses L", 62.832, 60.0, Left)
        .arc("T6 Right Sweep", 235.619, 150.0, Right)
        .straight("Back Straight", 900.0)
        .arc("Chicane", 35.391, 30.0, Left)
        .arc("T7 Left Medium", 76.771, 80.0, Left)
        .straight("Short Straight B", 120.0)
        .arc("T8 Right Hairpin", 99.492, 38.0, Right)
        .arc("T9 Left Sweep", 146.607, 120.0, Left)
        .arc("Long Right HighSpeed", 365.184, 220.0, Right)
        .straight("Infield Straight", 400.0)
        .arc("T10 Left Tight", 69.813, 50.0, Left)
        .arc("T11 Right Kink", 18.330, 35.0, Right)
        .arc("Complex Esses", 116.938, 50.0, Left)
        .straight("Pre-Finish Straight", 500.0)
        .arc("Final Curve Left", 139.626, 160.0, Left)
        .arc("T12 Right Mega-Sweep", 628.319, 300.0, Right)
        .straight("Straight C", 360.0)
        .straight("Final Connector", 350.0)
        .with_gate_distances(&GATE_DISTANCES_M)
}
