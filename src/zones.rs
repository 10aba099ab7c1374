//! Intensity zones and the fixed zone -> rank table used for delta
//! computation and zone ceilings.
//!
//! Zones are the 7-band ordinal model (z1 recovery .. z7 neuromuscular).
//! Labels coming from plans and devices are normalized through a fixed
//! alias table; anything unrecognized falls back to z2, the aerobic base
//! band, which is also the default when a zone distribution is missing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ordinal intensity band. `Ord` follows intensity: z1 < z2 < ... < z7.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Z1,
    Z2,
    Z3,
    Z4,
    Z5,
    Z6,
    Z7,
}

impl Zone {
    /// Numeric intensity rank, 1..=7
    pub fn rank(self) -> u8 {
        match self {
            Zone::Z1 => 1,
            Zone::Z2 => 2,
            Zone::Z3 => 3,
            Zone::Z4 => 4,
            Zone::Z5 => 5,
            Zone::Z6 => 6,
            Zone::Z7 => 7,
        }
    }

    /// Normalize a zone label to a band.
    ///
    /// Recognizes `z1`..`z7` plus descriptive aliases (English and the
    /// Italian labels used by imported plans). Unknown labels map to z2.
    pub fn from_label(label: &str) -> Zone {
        match label.trim().to_lowercase().as_str() {
            "z1" | "recovery" | "recupero" => Zone::Z1,
            "z2" | "endurance" | "resistenza" => Zone::Z2,
            "z3" | "tempo" => Zone::Z3,
            "z4" | "threshold" | "soglia" => Zone::Z4,
            "z5" | "vo2max" => Zone::Z5,
            "z6" | "anaerobic" => Zone::Z6,
            "z7" | "neuromuscular" => Zone::Z7,
            _ => Zone::Z2,
        }
    }

    /// Reduce a seconds-per-zone distribution to the single band with the
    /// most time. Entries are visited in label order so ties resolve
    /// deterministically; an absent or empty map yields z2.
    pub fn dominant(distribution: Option<&HashMap<String, u32>>) -> Zone {
        let Some(dist) = distribution else {
            return Zone::Z2;
        };

        let mut entries: Vec<(&String, &u32)> = dist.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut best: Option<(&str, u32)> = None;
        for (label, &seconds) in entries {
            match best {
                Some((_, best_seconds)) if seconds <= best_seconds => {}
                _ => best = Some((label, seconds)),
            }
        }

        match best {
            Some((label, _)) => Zone::from_label(label),
            None => Zone::Z2,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "z{}", self.rank())
    }
}
