//! Vehicle registry demo.
//!
//! Stores a small fleet in an in-memory table, then reads it back by
//! partition, by key and in full. Set `RUST_LOG=debug` to see every store
//! request.

use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tablestore_client::InMemoryTableService;
use tablestore_codec::table_entity;
use tablestore_core::{CoreResult, StoreConfig, TypedStore, UntypedStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Owner {
    name: String,
    licence: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Vehicle {
    plate_no: String,
    city: String,
    make: String,
    seats: i32,
    owner: Owner,
}

table_entity!(Vehicle {
    native plate_no => "PlateNo",
    native city => "City",
    native make => "Make",
    native seats => "Seats",
    json owner => "Owner",
});

fn vehicle(plate_no: &str, city: &str, make: &str, seats: i32, owner: &str) -> Vehicle {
    Vehicle {
        plate_no: plate_no.to_string(),
        city: city.to_string(),
        make: make.to_string(),
        seats,
        owner: Owner {
            name: owner.to_string(),
            licence: format!("L{}", plate_no.len() * 1000 + owner.len()),
        },
    }
}

#[tokio::main]
async fn main() -> CoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let service = InMemoryTableService::new();
    let config = StoreConfig::with_connection_string("vehicles", "UseDevelopmentStorage=true");
    let untyped = UntypedStore::connect(&service, config).await?;
    let store = TypedStore::with_selectors(
        untyped,
        |v: &Vehicle| v.city.clone(),
        |v: &Vehicle| v.plate_no.clone(),
    );

    let fleet = vec![
        vehicle("ABC123", "Westview", "Volvo", 5, "Ada Moss"),
        vehicle("XYZ789", "Westview", "Saab", 4, "Joe Park"),
        vehicle("JKL456", "Eastbrook", "Fiat", 2, "Lin Ortiz"),
    ];
    let summary = store.store_multiple(&fleet).await?;
    info!(
        partitions = ?summary.partitions,
        records = summary.operations,
        "stored fleet"
    );

    let westview: Vec<Vehicle> = store.query(Some("Westview"), None)?.try_collect().await?;
    for v in &westview {
        println!("Westview: {} {} ({} seats), owner {}", v.plate_no, v.make, v.seats, v.owner.name);
    }

    if let Some(v) = store.query_single("Eastbrook", "JKL456").await? {
        println!("Found {} in {}", v.plate_no, v.city);
    }

    store.delete_match(&fleet[1]).await?;
    let remaining: Vec<Vehicle> = store.retrieve_full_table().try_collect().await?;
    println!("{} vehicle(s) left after deleting {}", remaining.len(), fleet[1].plate_no);

    Ok(())
}
