//! Fixture records and service helpers.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tablestore_client::{InMemoryConfig, InMemoryTableService};
use tablestore_codec::table_entity;

/// Connection string accepted by the in-memory service.
pub const DEV_CONNECTION_STRING: &str = "UseDevelopmentStorage=true";

/// Owner of a [`Vehicle`], stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    /// Full name.
    pub name: String,
    /// Contact phone numbers.
    pub phones: Vec<String>,
}

/// A vehicle record keyed by city and plate number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vehicle {
    /// Plate number, used as the row key.
    pub plate_no: String,
    /// Registration city, used as the partition key.
    pub city: String,
    /// Manufacturer.
    pub make: String,
    /// Number of seats.
    pub seats: i32,
    /// Odometer reading.
    pub odometer_km: i64,
    /// Whether the vehicle is electric.
    pub electric: bool,
    /// Registration date.
    pub registered: Option<DateTime<Utc>>,
    /// Owner details.
    pub owner: Owner,
    /// Service history by date.
    pub services: BTreeMap<String, String>,
}

table_entity!(Vehicle {
    native plate_no => "PlateNo",
    native city => "City",
    native make => "Make",
    native seats => "Seats",
    native odometer_km => "OdometerKm",
    native electric => "Electric",
    native registered => "Registered",
    json owner => "Owner",
    json services => "Services",
});

impl Vehicle {
    /// Creates a fully populated vehicle.
    pub fn sample(plate_no: &str, city: &str) -> Self {
        Self {
            plate_no: plate_no.to_string(),
            city: city.to_string(),
            make: "Volvo".to_string(),
            seats: 5,
            odometer_km: 48_210,
            electric: false,
            registered: Utc.with_ymd_and_hms(2019, 4, 2, 9, 30, 0).single(),
            owner: Owner {
                name: "Ada Moss".to_string(),
                phones: vec!["555-0101".to_string()],
            },
            services: BTreeMap::from([("2023-05-01".to_string(), "brakes".to_string())]),
        }
    }

    /// Partition key selector.
    pub fn partition_key(&self) -> String {
        self.city.clone()
    }

    /// Row key selector.
    pub fn row_key(&self) -> String {
        self.plate_no.clone()
    }
}

/// Creates vehicles spread over the given cities, `per_city` each.
pub fn vehicles_in(cities: &[&str], per_city: usize) -> Vec<Vehicle> {
    cities
        .iter()
        .flat_map(|city| {
            let prefix: String = city.chars().next().into_iter().collect();
            (0..per_city).map(move |i| Vehicle::sample(&format!("{prefix}{i:03}"), city))
        })
        .collect()
}

/// Creates an in-memory service with the given page size.
pub fn service_with_page_size(page_size: usize) -> InMemoryTableService {
    InMemoryTableService::with_config(InMemoryConfig::new().page_size(page_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_codec::{EntityCodec, JSON_COLUMN_PREFIX};

    #[test]
    fn sample_round_trips() {
        let car = Vehicle::sample("ABC123", "Westview");
        let entity = EntityCodec::to_entity(&car, car.partition_key(), car.row_key()).unwrap();
        assert!(entity.contains_column(&format!("{JSON_COLUMN_PREFIX}Owner")));
        assert!(!entity.contains_column("Owner"));

        let decoded: Vehicle = EntityCodec::decode(&entity).unwrap();
        assert_eq!(decoded, car);
    }

    #[test]
    fn vehicles_are_spread() {
        let cars = vehicles_in(&["Westview", "Eastbrook"], 3);
        assert_eq!(cars.len(), 6);
        assert_eq!(cars[0].plate_no, "W000");
        assert_eq!(cars[3].plate_no, "E000");
    }

    #[test]
    fn vehicles_handle_empty_and_multibyte_cities() {
        let cars = vehicles_in(&["", "Škofja Loka"], 1);
        assert_eq!(cars[0].plate_no, "000");
        assert_eq!(cars[1].plate_no, "Š000");
    }
}
