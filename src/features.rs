use crate::geo::Route;
use crate::service::RideRequest;

pub const NUMERIC_COLUMNS: [&str; 6] = [
    "Number_of_Riders",
    "Number_of_Drivers",
    "Number_of_Past_Rides",
    "Average_Ratings",
    "Expected_Ride_Duration",
    "Historical_Cost_of_Ride",
];

pub const CATEGORICAL_COLUMNS: [&str; 4] = [
    "Location_Category",
    "Customer_Loyalty_Status",
    "Time_of_Booking",
    "Vehicle_Type",
];

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue<'a> {
    Numeric(f64),
    Categorical(&'a str),
}

/// One model input row, in the column layout the pipeline was fit on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub number_of_riders: f64,
    pub number_of_drivers: f64,
    pub number_of_past_rides: f64,
    pub average_ratings: f64,
    pub expected_ride_duration: f64,
    pub historical_cost_of_ride: f64,
    pub location_category: String,
    pub customer_loyalty_status: String,
    pub time_of_booking: String,
    pub vehicle_type: String,
}

impl FeatureRow {
    /// Named columns, numeric block first, in training order.
    pub fn columns(&self) -> [(&'static str, FeatureValue<'_>); 10] {
        use FeatureValue::{Categorical, Numeric};
        [
            (NUMERIC_COLUMNS[0], Numeric(self.number_of_riders)),
            (NUMERIC_COLUMNS[1], Numeric(self.number_of_drivers)),
            (NUMERIC_COLUMNS[2], Numeric(self.number_of_past_rides)),
            (NUMERIC_COLUMNS[3], Numeric(self.average_ratings)),
            (NUMERIC_COLUMNS[4], Numeric(self.expected_ride_duration)),
            (NUMERIC_COLUMNS[5], Numeric(self.historical_cost_of_ride)),
            (CATEGORICAL_COLUMNS[0], Categorical(&self.location_category)),
            (CATEGORICAL_COLUMNS[1], Categorical(&self.customer_loyalty_status)),
            (CATEGORICAL_COLUMNS[2], Categorical(&self.time_of_booking)),
            (CATEGORICAL_COLUMNS[3], Categorical(&self.vehicle_type)),
        ]
    }
}

/// Builds the row from the request plus values derived from `route`.
/// Distance only reaches the model through `base_cost`.
pub fn assemble(req: &RideRequest, route: &Route, base_cost: f64, time_bucket: &str) -> FeatureRow {
    FeatureRow {
        number_of_riders: f64::from(req.number_of_riders),
        number_of_drivers: f64::from(req.number_of_drivers),
        number_of_past_rides: f64::from(req.number_of_past_rides),
        average_ratings: req.average_ratings,
        expected_ride_duration: route.duration_min,
        historical_cost_of_ride: base_cost,
        location_category: req.location_category.clone(),
        customer_loyalty_status: req.customer_loyalty_status.clone(),
        time_of_booking: time_bucket.to_string(),
        vehicle_type: req.vehicle_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUTE: Route = Route {
        distance_km: 5.0,
        duration_min: 15.0,
    };

    fn request() -> RideRequest {
        serde_json::from_value(serde_json::json!({
            "origin": "A",
            "destination": "B",
            "vehicle_type": "PREMIUM",
            "number_of_riders": 42,
            "average_ratings": 7.5
        }))
        .unwrap()
    }

    #[test]
    fn test_assemble_maps_fields() {
        let row = assemble(&request(), &ROUTE, 140.0, "Evening");
        assert_eq!(row.number_of_riders, 42.0);
        assert_eq!(row.number_of_drivers, 25.0);
        assert_eq!(row.number_of_past_rides, 10.0);
        // out-of-range ratings pass through
        assert_eq!(row.average_ratings, 7.5);
        assert_eq!(row.expected_ride_duration, 15.0);
        assert_eq!(row.historical_cost_of_ride, 140.0);
        assert_eq!(row.location_category, "Urban");
        assert_eq!(row.customer_loyalty_status, "Regular");
        assert_eq!(row.time_of_booking, "Evening");
        assert_eq!(row.vehicle_type, "PREMIUM");
    }

    #[test]
    fn test_columns_follow_training_order() {
        let row = assemble(&request(), &ROUTE, 140.0, "Night");
        let names: Vec<&str> = row.columns().iter().map(|(n, _)| *n).collect();
        let expected: Vec<&str> = NUMERIC_COLUMNS
            .iter()
            .chain(CATEGORICAL_COLUMNS.iter())
            .copied()
            .collect();
        assert_eq!(names, expected);

        let cols = row.columns();
        assert_eq!(cols[4].1, FeatureValue::Numeric(15.0));
        assert_eq!(cols[8].1, FeatureValue::Categorical("Night"));
    }
}
