/// Linear fare: `base + per_km * km + per_min * min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FareRule {
    pub base: f64,
    pub per_km: f64,
    pub per_min: f64,
}

pub const FARE_ECONOMY: FareRule = FareRule {
    base: 50.0,
    per_km: 12.0,
    per_min: 2.0,
};

pub const FARE_PREMIUM: FareRule = FareRule {
    base: 90.0,
    per_km: 20.0,
    per_min: 3.0,
};

impl FareRule {
    pub fn cost(&self, distance_km: f64, duration_min: f64) -> f64 {
        self.base + self.per_km * distance_km + self.per_min * duration_min
    }
}

/// Only "premium" (any case) selects the premium rule; everything else,
/// unknown classes included, prices as economy.
pub fn rule_for(vehicle_type: &str) -> &'static FareRule {
    if vehicle_type.eq_ignore_ascii_case("premium") {
        &FARE_PREMIUM
    } else {
        &FARE_ECONOMY
    }
}

/// Rule-based base cost. Inputs are not validated; the caller hands in
/// finite, non-negative distance and duration.
pub fn estimate_base_cost(vehicle_type: &str, distance_km: f64, duration_min: f64) -> f64 {
    rule_for(vehicle_type).cost(distance_km, duration_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_selection_is_case_insensitive() {
        for v in ["Premium", "premium", "PREMIUM", "pReMiUm"] {
            assert_eq!(rule_for(v), &FARE_PREMIUM, "{v} should select premium");
        }
    }

    #[test]
    fn test_everything_else_is_economy() {
        for v in ["", "Economy", "economy", "SUV", "premium ", "Premium+"] {
            assert_eq!(rule_for(v), &FARE_ECONOMY, "{v:?} should select economy");
        }
    }

    #[test]
    fn test_base_cost_values() {
        assert_eq!(estimate_base_cost("Economy", 10.0, 20.0), 210.0);
        assert_eq!(estimate_base_cost("Premium", 10.0, 20.0), 350.0);
        assert_eq!(estimate_base_cost("Economy", 5.0, 15.0), 140.0);
        assert_eq!(estimate_base_cost("Unknown", 0.0, 0.0), 50.0);
    }
}
