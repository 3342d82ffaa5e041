//! Demo: run a full delivery against simulated hardware.

use anyhow::Result;
use droneport::aerial::{AerialCommander, AerialConfig, GeoPoint};
use droneport::cabinet::{CabinetClient, PickupCode, RegisterMap};
use droneport::channel::sim::{SimulatedCabinet, SimulatedVehicle};
use droneport::delivery::{DeliveryConfig, DeliveryContext, DeliveryRoute};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let addr = RegisterMap::default();
    let mut cabinet = SimulatedCabinet::new();
    cabinet.script_reads(addr.mode_status, &[10, 12]);
    cabinet.set_register(addr.storage_status, 11);
    cabinet.script_reads(addr.door, &[10, 11]);
    cabinet.set_register(addr.code1, 123);
    cabinet.set_register(addr.code2, 456);

    let route = DeliveryRoute {
        takeoff: GeoPoint::new(31.2304, 121.4737),
        takeoff_altitude_m: 60.0,
        destination: GeoPoint::new(31.3000, 121.5000),
        destination_altitude_m: 0.0,
        return_point: GeoPoint::new(31.2304, 121.4737),
    };

    let mut delivery = DeliveryContext::new(
        AerialCommander::new(AerialConfig::default()),
        SimulatedVehicle::new(),
        CabinetClient::new(cabinet),
        route,
        PickupCode::new(123, 456)?,
    )
    .with_config(DeliveryConfig {
        arm_settle: Duration::from_secs(1),
        ..Default::default()
    });

    delivery.run_full_delivery().await?;
    info!(
        "simulated vehicle received {} messages",
        delivery.vehicle.sent().len()
    );

    let code = delivery.cabinet.read_pickup_code().await?;
    info!("cabinet reports pickup code {}", code);
    Ok(())
}
