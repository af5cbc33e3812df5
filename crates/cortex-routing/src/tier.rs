//! Score-to-tier selection under a routing preference

use cortex_config::{RoutingPreference, ThresholdsConfig, Tier};

/// Map a difficulty score to a capability tier
///
/// Each preference carries its own threshold table: scores below the
/// cheap bound route cheap, below the mid bound route mid, and anything
/// at or above the mid bound routes premium. Total over all inputs.
pub fn select_tier(score: f64, preference: RoutingPreference, thresholds: &ThresholdsConfig) -> Tier {
    let table = thresholds.for_preference(preference);

    if score < table.cheap {
        Tier::Cheap
    } else if score < table.mid {
        Tier::Mid
    } else {
        Tier::Premium
    }
}
