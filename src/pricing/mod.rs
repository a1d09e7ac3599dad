use serde::{Deserialize, Serialize};

use crate::models::booking::VehicleType;

// Surge bands are a regulatory curve, not an operator knob.
const SURGE_MILD_MIN: f64 = 1.2;
const SURGE_MILD_MAX: f64 = 1.4;
const SURGE_MEDIUM_MIN: f64 = 1.5;
const SURGE_MEDIUM_MAX: f64 = 1.8;
const SURGE_CAP: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub base_fare: f64,
    pub rate_per_km: f64,
    pub rate_per_min: f64,
    pub gst_rate: f64,
    pub cancellation_fare_percentage: f64,
    pub cancellation_fare_max: f64,
    pub cancellation_fee_hatchback: f64,
    pub cancellation_fee_sedan: f64,
    pub cancellation_fee_suv: f64,
    pub cancellation_fee_premium: f64,
    pub cancellation_threshold_minutes: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: 50.0,
            rate_per_km: 10.0,
            rate_per_min: 2.0,
            gst_rate: 0.06,
            cancellation_fare_percentage: 0.10,
            cancellation_fare_max: 100.0,
            cancellation_fee_hatchback: 60.0,
            cancellation_fee_sedan: 90.0,
            cancellation_fee_suv: 100.0,
            cancellation_fee_premium: 90.0,
            cancellation_threshold_minutes: 5.0,
        }
    }
}

impl PricingConfig {
    fn category_fee(&self, vehicle_type: VehicleType) -> f64 {
        match vehicle_type {
            VehicleType::Hatchback => self.cancellation_fee_hatchback,
            VehicleType::Sedan => self.cancellation_fee_sedan,
            VehicleType::Suv => self.cancellation_fee_suv,
            VehicleType::Premium => self.cancellation_fee_premium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CancellationFee {
    pub before_gst: f64,
    pub gst_amount: f64,
    pub total: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Demand-based surge factor on the passenger-to-driver ratio. Zero
/// available drivers saturates the curve at the cap.
pub fn surge_multiplier(demand_count: usize, available_driver_count: usize) -> f64 {
    if available_driver_count == 0 {
        return SURGE_CAP;
    }

    let ratio = demand_count as f64 / available_driver_count as f64;

    if ratio < 1.0 {
        1.0
    } else if ratio < 1.5 {
        round2(SURGE_MILD_MIN + (ratio - 1.0) / 0.5 * (SURGE_MILD_MAX - SURGE_MILD_MIN))
    } else if ratio < 1.8 {
        round2(SURGE_MEDIUM_MIN + (ratio - 1.5) / 0.3 * (SURGE_MEDIUM_MAX - SURGE_MEDIUM_MIN))
    } else {
        SURGE_CAP
    }
}

/// Fare = (base + km rate + minute rate) x surge, rounded to 2 decimals.
pub fn fare(
    config: &PricingConfig,
    distance_km: f64,
    duration_minutes: f64,
    surge: f64,
) -> f64 {
    let metered = config.base_fare
        + distance_km * config.rate_per_km
        + duration_minutes * config.rate_per_min;
    round2(metered * surge)
}

/// Cancellation fee: min(10% of fare, cap) as the floor, the per-category
/// fee once the grace window has elapsed, plus GST on top.
pub fn cancellation_fee(
    config: &PricingConfig,
    total_fare: f64,
    vehicle_type: VehicleType,
    elapsed_minutes: f64,
) -> CancellationFee {
    let base_fee = (total_fare * config.cancellation_fare_percentage)
        .min(config.cancellation_fare_max)
        .max(0.0);

    let before_gst = if elapsed_minutes >= config.cancellation_threshold_minutes {
        base_fee.max(config.category_fee(vehicle_type))
    } else {
        base_fee
    };

    let before_gst = round2(before_gst);
    let total = round2(before_gst * (1.0 + config.gst_rate));

    CancellationFee {
        before_gst,
        gst_amount: round2(total - before_gst),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::{CancellationFee, PricingConfig, cancellation_fee, fare, surge_multiplier};
    use crate::models::booking::VehicleType;

    #[test]
    fn no_surge_below_parity() {
        assert_eq!(surge_multiplier(0, 5), 1.0);
        assert_eq!(surge_multiplier(4, 5), 1.0);
        assert_eq!(surge_multiplier(99, 100), 1.0);
    }

    #[test]
    fn mild_band_interpolates_between_1_2_and_1_4() {
        assert_eq!(surge_multiplier(10, 10), 1.2);
        assert_eq!(surge_multiplier(5, 4), 1.3);
        assert_eq!(surge_multiplier(149, 100), 1.4);
    }

    #[test]
    fn medium_band_interpolates_between_1_5_and_1_8() {
        assert_eq!(surge_multiplier(3, 2), 1.5);
        assert_eq!(surge_multiplier(33, 20), 1.65);
        assert_eq!(surge_multiplier(179, 100), 1.79);
    }

    #[test]
    fn high_demand_hits_the_cap() {
        assert_eq!(surge_multiplier(9, 5), 2.0);
        assert_eq!(surge_multiplier(1000, 1), 2.0);
    }

    #[test]
    fn zero_drivers_saturates_the_cap() {
        assert_eq!(surge_multiplier(1, 0), 2.0);
        assert_eq!(surge_multiplier(0, 0), 2.0);
    }

    #[test]
    fn surge_is_monotone_and_bounded() {
        let mut previous = 0.0;
        for demand in 0..400 {
            let surge = surge_multiplier(demand, 100);
            assert!(surge >= previous, "dip at demand {demand}");
            assert!((1.0..=2.0).contains(&surge));
            previous = surge;
        }
    }

    #[test]
    fn fare_matches_reference_example() {
        let config = PricingConfig::default();
        // (50 + 10*15 + 2*30) * 1.5 = 390
        assert_eq!(fare(&config, 15.0, 30.0, 1.5), 390.0);
    }

    #[test]
    fn fare_without_surge_is_the_metered_amount() {
        let config = PricingConfig::default();
        assert_eq!(fare(&config, 0.0, 0.0, 1.0), 50.0);
        assert_eq!(fare(&config, 10.0, 20.0, 1.0), 190.0);
    }

    #[test]
    fn fare_is_rounded_to_two_decimals() {
        let config = PricingConfig::default();
        let amount = fare(&config, 1.234, 5.678, 1.17);
        assert_eq!((amount * 100.0).round() / 100.0, amount);
    }

    #[test]
    fn cancellation_within_grace_window_uses_percentage_only() {
        let config = PricingConfig::default();
        let fee = cancellation_fee(&config, 300.0, VehicleType::Sedan, 3.0);
        assert_eq!(fee.before_gst, 30.0);
        assert_eq!(fee.total, 31.8);
    }

    #[test]
    fn cancellation_after_grace_window_matches_reference_example() {
        let config = PricingConfig::default();
        // fare=300, sedan, 6 min elapsed: max(30, 90) * 1.06 = 95.40
        let fee = cancellation_fee(&config, 300.0, VehicleType::Sedan, 6.0);
        assert_eq!(
            fee,
            CancellationFee {
                before_gst: 90.0,
                gst_amount: 5.4,
                total: 95.4,
            }
        );
    }

    #[test]
    fn percentage_component_is_capped() {
        let config = PricingConfig::default();
        let fee = cancellation_fee(&config, 5000.0, VehicleType::Suv, 1.0);
        assert_eq!(fee.before_gst, 100.0);
        assert_eq!(fee.total, 106.0);
    }

    #[test]
    fn category_fee_depends_on_vehicle_type() {
        let config = PricingConfig::default();
        let hatchback = cancellation_fee(&config, 100.0, VehicleType::Hatchback, 10.0);
        let suv = cancellation_fee(&config, 100.0, VehicleType::Suv, 10.0);
        assert_eq!(hatchback.before_gst, 60.0);
        assert_eq!(suv.before_gst, 100.0);
    }

    #[test]
    fn cancellation_fee_is_never_negative() {
        let config = PricingConfig::default();
        let fee = cancellation_fee(&config, 0.0, VehicleType::Hatchback, 0.0);
        assert_eq!(fee.before_gst, 0.0);
        assert_eq!(fee.total, 0.0);
    }
}
