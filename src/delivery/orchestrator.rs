//! Delivery Orchestrator
//!
//! Composes the aerial driver and the cabinet operation set into the three
//! delivery choreographies. Phases run strictly in order; the first failed
//! phase ends the workflow and nothing is rolled back here — compensation
//! (closing a door that stayed open, clearing the pad) is the caller's
//! decision.

use crate::aerial::{AerialCommander, FlightMode, GeoPoint, Mission, MissionItem, MissionSubmode};
use crate::cabinet::{CabinetClient, PickupCode, StorageOutcome};
use crate::channel::{CommandChannel, RegisterChannel};
use crate::error::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Fixed geography of one delivery.
#[derive(Debug, Clone)]
pub struct DeliveryRoute {
    /// Launch pad position.
    pub takeoff: GeoPoint,
    /// Climb target above the launch pad.
    pub takeoff_altitude_m: f32,
    /// Destination cabinet position.
    pub destination: GeoPoint,
    /// Touch-down altitude at the destination.
    pub destination_altitude_m: f32,
    /// Where the return leg lands.
    pub return_point: GeoPoint,
}

/// Operational defaults the command driver keeps explicit.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Cruise speed programmed into outbound plans.
    pub cruise_speed_mps: f32,
    /// Transit altitude between pads.
    pub cruise_altitude_m: f32,
    /// Altitude for the immediate climb-out after arming.
    pub climb_out_altitude_m: f32,
    /// Actuator channel driving the package gripper.
    pub gripper_channel: u8,
    /// PWM for a released gripper.
    pub gripper_open_pwm: u16,
    /// PWM for a closed gripper.
    pub gripper_close_pwm: u16,
    /// Settle time between arming (or launching) and the next step.
    pub arm_settle: Duration,
    /// Settle time after closing the gripper on a package.
    pub gripper_settle: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            cruise_speed_mps: 15.0,
            cruise_altitude_m: 100.0,
            climb_out_altitude_m: 50.0,
            gripper_channel: 8,
            gripper_open_pwm: 2300,
            gripper_close_pwm: 800,
            arm_settle: Duration::from_secs(5),
            gripper_settle: Duration::from_secs(3),
        }
    }
}

/// Everything one delivery owns: the two sessions, the geography and the
/// pickup code. Created per request, discarded after the workflow ends;
/// nothing is shared between concurrent deliveries.
pub struct DeliveryContext<C, R> {
    pub commander: AerialCommander,
    pub vehicle: C,
    pub cabinet: CabinetClient<R>,
    pub route: DeliveryRoute,
    pub pickup_code: PickupCode,
    pub config: DeliveryConfig,
}

impl<C, R> DeliveryContext<C, R>
where
    C: CommandChannel,
    R: RegisterChannel,
{
    pub fn new(
        commander: AerialCommander,
        vehicle: C,
        cabinet: CabinetClient<R>,
        route: DeliveryRoute,
        pickup_code: PickupCode,
    ) -> Self {
        Self {
            commander,
            vehicle,
            cabinet,
            route,
            pickup_code,
            config: DeliveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DeliveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Outbound delivery with full cabinet preparation.
    ///
    /// Linear phases: auto mode, storage gate, door, six-item plan upload
    /// and verification, then launch. Control returns to the caller once
    /// the vehicle is in auto-mission mode; flight progress is monitored
    /// externally.
    pub async fn run_full_delivery(&mut self) -> Result<()> {
        info!("full delivery: preparing cabinet");
        self.cabinet.ensure_auto_mode().await?;
        self.cabinet.ensure_storage_allowed().await?;
        self.cabinet.open_door().await?;

        info!("full delivery: programming flight plan");
        let mission = self.outbound_mission();
        self.upload_and_verify(&mission).await?;
        self.launch().await?;
        info!("full delivery: vehicle away");
        Ok(())
    }

    /// Package hand-off at the destination cabinet, optionally collecting a
    /// return package, then the return leg.
    ///
    /// The branch point is the storage outcome: only a cycle that ends in
    /// "needs pickup" — and a caller that opted in — runs the collection
    /// sequence and launches the return leg before clearing the pad. Both
    /// branches close the door last.
    pub async fn run_storage_and_return(
        &mut self,
        collect_return_package: bool,
    ) -> Result<StorageOutcome> {
        info!("storage and return: vehicle on pad");
        self.cabinet.confirm_drone_on_pad().await?;
        self.cabinet.start_storage(&self.pickup_code).await?;

        let ready_store = self.cabinet.profile().codes.servo_ready_store;
        let ready_collect = self.cabinet.profile().codes.servo_ready_collect;
        self.cabinet.wait_servo_ready(ready_store).await?;

        self.commander
            .set_actuator(
                &self.vehicle,
                self.config.gripper_channel,
                self.config.gripper_open_pwm,
            )
            .await?;
        self.cabinet.open_servo().await?;

        let outcome = self.cabinet.wait_storage_complete().await?;

        if outcome == StorageOutcome::NeedsPickup && collect_return_package {
            info!("storage and return: collecting return package");
            self.cabinet.wait_servo_ready(ready_collect).await?;
            self.commander
                .set_actuator(
                    &self.vehicle,
                    self.config.gripper_channel,
                    self.config.gripper_close_pwm,
                )
                .await?;
            sleep(self.config.gripper_settle).await;
            self.cabinet.close_servo().await?;
            self.cabinet.wait_package_taken().await?;

            info!("storage and return: programming return leg");
            let mission = self.return_mission();
            self.upload_and_verify(&mission).await?;
            self.launch().await?;
            sleep(self.config.arm_settle).await;
            self.cabinet.clear_parking().await?;
        } else {
            info!("storage and return: no package to collect");
            self.cabinet.close_servo().await?;
            self.cabinet.clear_parking().await?;
        }

        self.cabinet.close_door().await?;
        info!("storage and return: complete ({:?})", outcome);
        Ok(outcome)
    }

    /// Plain point-to-point flight without any cabinet interaction.
    pub async fn run_simple_delivery(&mut self) -> Result<()> {
        info!("simple delivery: programming flight plan");
        let mission = self.simple_mission();
        self.upload_and_verify(&mission).await?;
        self.launch().await?;
        info!("simple delivery: vehicle away");
        Ok(())
    }

    /// Send the plan, then read it back and accept it.
    async fn upload_and_verify(&mut self, mission: &Mission) -> Result<()> {
        self.commander.upload_mission(&self.vehicle, mission).await?;
        self.commander
            .verify_mission(&self.vehicle, mission.len())
            .await
    }

    /// Arm, let the vehicle settle, climb out, and hand control to the
    /// stored plan.
    async fn launch(&mut self) -> Result<()> {
        self.commander.arm(&self.vehicle).await?;
        sleep(self.config.arm_settle).await;
        self.commander
            .takeoff_now(&self.vehicle, self.config.climb_out_altitude_m)
            .await?;
        self.commander
            .set_flight_mode(&self.vehicle, FlightMode::Mission, MissionSubmode::AutoMission)
            .await
    }

    fn outbound_mission(&self) -> Mission {
        let r = &self.route;
        let c = &self.config;
        Mission::new(vec![
            MissionItem::takeoff(0, r.takeoff, r.takeoff_altitude_m),
            MissionItem::cruise_speed(1, c.cruise_speed_mps),
            MissionItem::waypoint(2, r.takeoff, c.cruise_altitude_m, f32::NAN),
            MissionItem::waypoint(3, r.takeoff, c.cruise_altitude_m, f32::NAN),
            MissionItem::landing(4, r.destination, 0.0, false),
            MissionItem::landing(5, r.destination, 0.0, true),
        ])
    }

    fn return_mission(&self) -> Mission {
        let r = &self.route;
        Mission::new(vec![
            MissionItem::takeoff(0, r.return_point, self.config.climb_out_altitude_m),
            MissionItem::landing(1, r.return_point, 0.0, false),
            MissionItem::landing(2, r.return_point, 0.0, true),
        ])
    }

    fn simple_mission(&self) -> Mission {
        let r = &self.route;
        Mission::new(vec![
            MissionItem::takeoff(0, r.takeoff, r.takeoff_altitude_m),
            MissionItem::landing(1, r.destination, r.destination_altitude_m, false),
            MissionItem::landing(2, r.destination, r.destination_altitude_m, true),
        ])
    }
}
