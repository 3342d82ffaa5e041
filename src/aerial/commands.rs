//! Aerial Command Driver
//!
//! Builds one protocol message per call from explicit parameters and sends
//! it over the given command channel. Every send is fire-and-forget: the
//! driver never waits for an acknowledgment (mission acceptance is its own
//! explicit call). Defaults for speeds, altitudes and actuator values are
//! applied one level up, in the orchestrator.

use crate::aerial::mission::{FlightMode, GeoPoint, Mission, MissionCommand, MissionItem, MissionSubmode};
use crate::channel::CommandChannel;
use crate::error::Result;
use mavlink::common::{
    MavCmd, MavFrame, MavMessage, MavMissionResult, COMMAND_LONG_DATA, MISSION_ACK_DATA,
    MISSION_COUNT_DATA, MISSION_ITEM_INT_DATA, MISSION_REQUEST_INT_DATA,
    MISSION_REQUEST_LIST_DATA, SET_HOME_POSITION_DATA,
};
use tracing::{debug, info};

/// Addressing identity used on every outbound message.
///
/// All four ids default to 1, which matches a single-vehicle deployment;
/// fleets address each vehicle through its own commander instance.
#[derive(Debug, Clone, Copy)]
pub struct AerialConfig {
    pub system_id: u8,
    pub component_id: u8,
    pub target_system: u8,
    pub target_component: u8,
}

impl Default for AerialConfig {
    fn default() -> Self {
        Self {
            system_id: 1,
            component_id: 1,
            target_system: 1,
            target_component: 1,
        }
    }
}

/// Sends vehicle commands over a [`CommandChannel`].
#[derive(Debug, Default)]
pub struct AerialCommander {
    config: AerialConfig,
}

impl AerialCommander {
    pub fn new(config: AerialConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AerialConfig {
        &self.config
    }

    async fn send<C>(&self, channel: &C, message: MavMessage) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        channel
            .send(self.config.system_id, self.config.component_id, &message)
            .await
    }

    /// Declare the flight-plan length. Must precede the items.
    pub async fn set_mission_count<C>(&self, channel: &C, count: u16) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("declaring mission count {}", count);
        self.send(
            channel,
            MavMessage::MISSION_COUNT(MISSION_COUNT_DATA {
                target_system: self.config.target_system,
                target_component: self.config.target_component,
                count,
            }),
        )
        .await
    }

    /// Send one flight-plan item.
    pub async fn send_mission_item<C>(&self, channel: &C, item: &MissionItem) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        let (command, param1, param2, param3, param4, autocontinue) = match item.command {
            MissionCommand::Takeoff => (MavCmd::MAV_CMD_NAV_TAKEOFF, 2.0, 0.0, 0.0, f32::NAN, 1),
            MissionCommand::Waypoint { heading_deg } => {
                (MavCmd::MAV_CMD_NAV_WAYPOINT, 0.0, 0.0, 0.0, heading_deg, 1)
            }
            MissionCommand::Landing { final_landing } => (
                MavCmd::MAV_CMD_NAV_LAND,
                0.0,
                0.0,
                0.0,
                f32::NAN,
                // A final landing ends the plan; intermediate touch points
                // auto-continue to the next item.
                if final_landing { 0 } else { 1 },
            ),
            MissionCommand::CruiseSpeed { meters_per_second } => (
                MavCmd::MAV_CMD_DO_CHANGE_SPEED,
                0.0,
                meters_per_second,
                -1.0,
                0.0,
                1,
            ),
        };

        debug!("mission item {}: {:?}", item.seq, item.command);
        self.send(
            channel,
            MavMessage::MISSION_ITEM_INT(MISSION_ITEM_INT_DATA {
                param1,
                param2,
                param3,
                param4,
                x: item.position.encoded_latitude(),
                y: item.position.encoded_longitude(),
                z: item.altitude_m,
                seq: item.seq,
                command,
                target_system: self.config.target_system,
                target_component: self.config.target_component,
                frame: MavFrame::MAV_FRAME_GLOBAL,
                current: 0,
                autocontinue,
            }),
        )
        .await
    }

    /// Send the declared count followed by every item, in order.
    pub async fn upload_mission<C>(&self, channel: &C, mission: &Mission) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        self.set_mission_count(channel, mission.len()).await?;
        for item in mission.items() {
            self.send_mission_item(channel, item).await?;
        }
        Ok(())
    }

    /// Read the plan back and accept it: request the full download, request
    /// each of `count` items by sequence, then send the acceptance ack.
    pub async fn verify_mission<C>(&self, channel: &C, count: u16) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        self.request_mission_download(channel).await?;
        for seq in 0..count {
            self.request_mission_item(channel, seq).await?;
        }
        self.acknowledge_mission(channel).await
    }

    /// Unlock the motors.
    pub async fn arm<C>(&self, channel: &C) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("sending arm command");
        self.arm_disarm(channel, 1.0).await
    }

    /// Lock the motors.
    pub async fn disarm<C>(&self, channel: &C) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("sending disarm command");
        self.arm_disarm(channel, 0.0).await
    }

    async fn arm_disarm<C>(&self, channel: &C, param1: f32) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        self.command_long(channel, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM, [
            param1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
        ])
        .await
    }

    /// Immediate climb-out to `altitude_m` from the current position.
    pub async fn takeoff_now<C>(&self, channel: &C, altitude_m: f32) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("immediate takeoff to {} m", altitude_m);
        self.command_long(channel, MavCmd::MAV_CMD_NAV_TAKEOFF_LOCAL, [
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, altitude_m,
        ])
        .await
    }

    /// Select a flight mode and submode.
    pub async fn set_flight_mode<C>(
        &self,
        channel: &C,
        mode: FlightMode,
        submode: MissionSubmode,
    ) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("setting flight mode {:?}/{:?}", mode, submode);
        self.command_long(channel, MavCmd::MAV_CMD_DO_SET_MODE, [
            1.0,
            mode as u8 as f32,
            submode as u8 as f32,
            0.0,
            0.0,
            0.0,
            0.0,
        ])
        .await
    }

    /// Drive an actuator channel to a PWM value (e.g. the package gripper).
    pub async fn set_actuator<C>(&self, channel: &C, servo_channel: u8, pwm: u16) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("actuator channel {} -> {} us", servo_channel, pwm);
        self.command_long(channel, MavCmd::MAV_CMD_DO_SET_SERVO, [
            servo_channel as f32,
            pwm as f32,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
        ])
        .await
    }

    /// Set the return-to-launch position. Altitude is millimetres above
    /// sea level, per the wire message.
    pub async fn set_home_position<C>(
        &self,
        channel: &C,
        position: GeoPoint,
        altitude_mm: i32,
    ) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!(
            "setting home position {:.7},{:.7}",
            position.latitude_deg, position.longitude_deg
        );
        self.send(
            channel,
            MavMessage::SET_HOME_POSITION(SET_HOME_POSITION_DATA {
                latitude: position.encoded_latitude(),
                longitude: position.encoded_longitude(),
                altitude: altitude_mm,
                x: 0.0,
                y: 0.0,
                z: 0.0,
                q: [0.0, 0.0, 0.0, 0.0],
                approach_x: 0.0,
                approach_y: 0.0,
                approach_z: 0.0,
                target_system: self.config.target_system,
            }),
        )
        .await
    }

    /// Fly back to the home position.
    pub async fn return_to_launch<C>(&self, channel: &C) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("sending return-to-launch");
        self.command_long(channel, MavCmd::MAV_CMD_NAV_RETURN_TO_LAUNCH, [0.0; 7])
            .await
    }

    /// Ask the vehicle to stream its stored plan back.
    pub async fn request_mission_download<C>(&self, channel: &C) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        debug!("requesting mission download");
        self.send(
            channel,
            MavMessage::MISSION_REQUEST_LIST(MISSION_REQUEST_LIST_DATA {
                target_system: self.config.target_system,
                target_component: self.config.target_component,
            }),
        )
        .await
    }

    /// Ask for one stored plan item by sequence index.
    pub async fn request_mission_item<C>(&self, channel: &C, seq: u16) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        debug!("requesting mission item {}", seq);
        self.send(
            channel,
            MavMessage::MISSION_REQUEST_INT(MISSION_REQUEST_INT_DATA {
                seq,
                target_system: self.config.target_system,
                target_component: self.config.target_component,
            }),
        )
        .await
    }

    /// Tell the vehicle the uploaded plan is accepted.
    pub async fn acknowledge_mission<C>(&self, channel: &C) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        info!("acknowledging mission");
        self.send(
            channel,
            MavMessage::MISSION_ACK(MISSION_ACK_DATA {
                target_system: self.config.target_system,
                target_component: self.config.target_component,
                mavtype: MavMissionResult::MAV_MISSION_ACCEPTED,
            }),
        )
        .await
    }

    async fn command_long<C>(&self, channel: &C, command: MavCmd, params: [f32; 7]) -> Result<()>
    where
        C: CommandChannel + ?Sized,
    {
        self.send(
            channel,
            MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
                param1: params[0],
                param2: params[1],
                param3: params[2],
                param4: params[3],
                param5: params[4],
                param6: params[5],
                param7: params[6],
                command,
                target_system: self.config.target_system,
                target_component: self.config.target_component,
                confirmation: 0,
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::sim::SimulatedVehicle;

    fn commander() -> AerialCommander {
        AerialCommander::new(AerialConfig::default())
    }

    #[tokio::test]
    async fn arm_builds_component_arm_disarm() {
        let vehicle = SimulatedVehicle::new();
        commander().arm(&vehicle).await.unwrap();

        match &vehicle.sent()[..] {
            [MavMessage::COMMAND_LONG(data)] => {
                assert_eq!(data.command, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM);
                assert_eq!(data.param1, 1.0);
                assert_eq!(data.target_system, 1);
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[tokio::test]
    async fn final_landing_clears_autocontinue() {
        let vehicle = SimulatedVehicle::new();
        let pad = GeoPoint::new(31.2304, 121.4737);
        let cmd = commander();

        cmd.send_mission_item(&vehicle, &MissionItem::landing(4, pad, 0.0, false))
            .await
            .unwrap();
        cmd.send_mission_item(&vehicle, &MissionItem::landing(5, pad, 0.0, true))
            .await
            .unwrap();

        let sent = vehicle.sent();
        match (&sent[0], &sent[1]) {
            (MavMessage::MISSION_ITEM_INT(pass), MavMessage::MISSION_ITEM_INT(last)) => {
                assert_eq!(pass.autocontinue, 1);
                assert_eq!(last.autocontinue, 0);
                assert_eq!(last.command, MavCmd::MAV_CMD_NAV_LAND);
                assert_eq!(last.x, 312_304_000);
                assert_eq!(last.y, 1_214_737_000);
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_declares_count_matching_items_before_ack() {
        let vehicle = SimulatedVehicle::new();
        let pad = GeoPoint::new(31.0, 121.0);
        let mission = Mission::new(vec![
            MissionItem::takeoff(0, pad, 50.0),
            MissionItem::cruise_speed(1, 15.0),
            MissionItem::landing(2, pad, 0.0, true),
        ]);
        let cmd = commander();
        cmd.upload_mission(&vehicle, &mission).await.unwrap();
        cmd.verify_mission(&vehicle, mission.len()).await.unwrap();

        let sent = vehicle.sent();
        let declared = sent
            .iter()
            .find_map(|m| match m {
                MavMessage::MISSION_COUNT(c) => Some(c.count),
                _ => None,
            })
            .expect("count declared");
        let ack_index = sent
            .iter()
            .position(|m| matches!(m, MavMessage::MISSION_ACK(_)))
            .expect("ack sent");

        let mut item_seqs: Vec<u16> = sent[..ack_index]
            .iter()
            .filter_map(|m| match m {
                MavMessage::MISSION_ITEM_INT(i) => Some(i.seq),
                _ => None,
            })
            .collect();
        item_seqs.dedup();
        assert_eq!(declared as usize, item_seqs.len());
        assert_eq!(item_seqs, vec![0, 1, 2]);

        // The verify pass requests each declared item before accepting.
        let requested: Vec<u16> = sent
            .iter()
            .filter_map(|m| match m {
                MavMessage::MISSION_REQUEST_INT(r) => Some(r.seq),
                _ => None,
            })
            .collect();
        assert_eq!(requested, vec![0, 1, 2]);
        assert_eq!(ack_index, sent.len() - 1);
    }

    #[tokio::test]
    async fn mode_change_carries_mode_and_submode() {
        let vehicle = SimulatedVehicle::new();
        commander()
            .set_flight_mode(&vehicle, FlightMode::Mission, MissionSubmode::AutoMission)
            .await
            .unwrap();

        match &vehicle.sent()[..] {
            [MavMessage::COMMAND_LONG(data)] => {
                assert_eq!(data.command, MavCmd::MAV_CMD_DO_SET_MODE);
                assert_eq!(data.param1, 1.0);
                assert_eq!(data.param2, 4.0);
                assert_eq!(data.param3, 4.0);
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[tokio::test]
    async fn home_position_encodes_fixed_point_coordinates() {
        let vehicle = SimulatedVehicle::new();
        let cmd = commander();
        cmd.set_home_position(&vehicle, GeoPoint::new(31.2304, 121.4737), 4500)
            .await
            .unwrap();
        cmd.return_to_launch(&vehicle).await.unwrap();

        let sent = vehicle.sent();
        match &sent[0] {
            MavMessage::SET_HOME_POSITION(data) => {
                assert_eq!(data.latitude, 312_304_000);
                assert_eq!(data.longitude, 1_214_737_000);
                assert_eq!(data.altitude, 4500);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(matches!(
            &sent[1],
            MavMessage::COMMAND_LONG(c) if c.command == MavCmd::MAV_CMD_NAV_RETURN_TO_LAUNCH
        ));
    }

    #[tokio::test]
    async fn cruise_speed_item_carries_speed_in_param2() {
        let vehicle = SimulatedVehicle::new();
        commander()
            .send_mission_item(&vehicle, &MissionItem::cruise_speed(1, 15.0))
            .await
            .unwrap();

        match &vehicle.sent()[..] {
            [MavMessage::MISSION_ITEM_INT(data)] => {
                assert_eq!(data.command, MavCmd::MAV_CMD_DO_CHANGE_SPEED);
                assert_eq!(data.param2, 15.0);
                assert_eq!(data.param3, -1.0);
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }
}
