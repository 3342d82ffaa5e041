//! Cabinet Operation Set
//!
//! Named locker operations, each an instance of the register poller with
//! addresses and codes supplied by the injected firmware profile.

use crate::cabinet::poller::{read_one, PendingPolicy, RegisterOperation};
use crate::cabinet::profile::CabinetProfile;
use crate::channel::RegisterChannel;
use crate::error::{Error, Result};
use std::fmt;
use tracing::info;

/// How a completed storage cycle ended. The two terminal codes are distinct
/// outcomes, never collapsed into a boolean: one of them obliges the
/// vehicle to carry a return package home.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOutcome {
    /// Package stored; a return package waits on the tray.
    NeedsPickup,
    /// Package stored; nothing to collect.
    NoPickup,
}

/// A six-digit pickup code split into the two register-sized halves the
/// cabinet stores it as. Each half is in [0, 999].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupCode {
    first: u16,
    second: u16,
}

impl PickupCode {
    pub fn new(first: u16, second: u16) -> Result<Self> {
        for half in [first, second] {
            if half > 999 {
                return Err(Error::InvalidPickupCode(half));
            }
        }
        Ok(Self { first, second })
    }

    pub fn first(&self) -> u16 {
        self.first
    }

    pub fn second(&self) -> u16 {
        self.second
    }
}

impl fmt::Display for PickupCode {
    /// Two zero-padded 3-digit groups, no separator: (123, 456) → "123456".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}{:03}", self.first, self.second)
    }
}

/// Executes the locker operations over one register session.
pub struct CabinetClient<R> {
    channel: R,
    profile: CabinetProfile,
}

impl<R: RegisterChannel> CabinetClient<R> {
    /// Client with the documented default firmware profile.
    pub fn new(channel: R) -> Self {
        Self::with_profile(channel, CabinetProfile::default())
    }

    /// Client for a deployment-specific firmware profile.
    pub fn with_profile(channel: R, profile: CabinetProfile) -> Self {
        Self { channel, profile }
    }

    pub fn profile(&self) -> &CabinetProfile {
        &self.profile
    }

    pub fn channel_mut(&mut self) -> &mut R {
        &mut self.channel
    }

    /// Release the session. Idempotence and error swallowing are the
    /// channel's contract.
    pub async fn close(&mut self) {
        self.channel.close().await;
    }

    /// Put the cabinet into automatic mode if it is not already there.
    ///
    /// Reads the mode state first; only a cabinet not yet in automatic mode
    /// gets the one mode request written.
    pub async fn ensure_auto_mode(&mut self) -> Result<()> {
        let p = &self.profile;
        self.channel.ensure_connected().await?;
        let current = read_one(&mut self.channel, p.registers.mode_status).await?;
        if current == p.codes.mode_auto_active {
            info!("cabinet already in automatic mode");
            return Ok(());
        }

        self.channel
            .write_register(p.registers.mode_set, p.codes.mode_auto_request)
            .await?;
        RegisterOperation {
            address: p.registers.mode_status,
            write_value: None,
            success_values: vec![p.codes.mode_auto_active],
            failure_values: Vec::new(),
            pending: PendingPolicy::Only(vec![p.codes.mode_switching]),
            poll_interval: p.timing.poll_interval,
            timeout: p.timing.operation_timeout,
        }
        .execute(&mut self.channel)
        .await?;
        info!("cabinet switched to automatic mode");
        Ok(())
    }

    /// Open the hatch door.
    pub async fn open_door(&mut self) -> Result<()> {
        info!("opening door");
        self.command_response(self.profile.registers.door, true).await
    }

    /// Close the hatch door.
    pub async fn close_door(&mut self) -> Result<()> {
        info!("closing door");
        self.command_response(self.profile.registers.door, false).await
    }

    /// Confirm a vehicle is sitting on the landing pad.
    pub async fn confirm_drone_on_pad(&mut self) -> Result<()> {
        info!("confirming vehicle on pad");
        self.command_response(self.profile.registers.parking, true)
            .await
    }

    /// Mark the landing pad empty again.
    pub async fn clear_parking(&mut self) -> Result<()> {
        info!("clearing pad occupancy");
        self.command_response(self.profile.registers.parking, false)
            .await
    }

    /// May a package be stored right now? Pure read, no side effect.
    pub async fn can_store(&mut self) -> Result<bool> {
        let p = &self.profile;
        self.channel.ensure_connected().await?;
        let state = read_one(&mut self.channel, p.registers.storage_status).await?;
        Ok(state == p.codes.storage_allowed)
    }

    /// Like [`can_store`](Self::can_store), but a blocked slot is an error
    /// so workflows abort cleanly.
    pub async fn ensure_storage_allowed(&mut self) -> Result<()> {
        let p = &self.profile;
        self.channel.ensure_connected().await?;
        let state = read_one(&mut self.channel, p.registers.storage_status).await?;
        if state == p.codes.storage_allowed {
            Ok(())
        } else {
            Err(Error::NotAllowed {
                address: p.registers.storage_status,
                observed: state,
            })
        }
    }

    /// Begin a storage cycle and program the pickup code. Completion is a
    /// separate wait ([`wait_storage_complete`](Self::wait_storage_complete))
    /// because the vehicle-side choreography happens in between.
    pub async fn start_storage(&mut self, code: &PickupCode) -> Result<()> {
        let p = &self.profile;
        info!("starting storage cycle, pickup code {}", code);
        self.channel.ensure_connected().await?;
        self.channel
            .write_register(p.registers.storage, p.codes.storage_begin)
            .await?;
        self.channel
            .write_register(p.registers.code1, code.first())
            .await?;
        self.channel
            .write_register(p.registers.code2, code.second())
            .await
    }

    /// Wait until the servo register shows `readiness` (1 = ready to take a
    /// package in, 2 = ready to hand one out).
    pub async fn wait_servo_ready(&mut self, readiness: u16) -> Result<()> {
        let p = &self.profile;
        RegisterOperation::wait_for(
            p.registers.servo,
            vec![readiness],
            p.timing.poll_interval,
            p.timing.servo_ready_timeout,
        )
        .execute(&mut self.channel)
        .await?;
        info!("servo ready ({})", readiness);
        Ok(())
    }

    /// Open the locker arm. Refuses without writing anything unless the
    /// servo reports the take-in readiness code.
    pub async fn open_servo(&mut self) -> Result<()> {
        let ready = self.profile.codes.servo_ready_store;
        self.servo_command(ready, true).await
    }

    /// Close the locker arm. Refuses without writing anything unless the
    /// servo reports the hand-out readiness code.
    pub async fn close_servo(&mut self) -> Result<()> {
        let ready = self.profile.codes.servo_ready_collect;
        self.servo_command(ready, false).await
    }

    async fn servo_command(&mut self, required_readiness: u16, open: bool) -> Result<()> {
        let servo = self.profile.registers.servo;
        self.channel.ensure_connected().await?;
        let state = read_one(&mut self.channel, servo).await?;
        if state != required_readiness {
            return Err(Error::NotAllowed {
                address: servo,
                observed: state,
            });
        }
        info!("{} servo", if open { "opening" } else { "closing" });
        self.command_response(servo, open).await
    }

    /// Wait for the storage cycle started earlier to reach one of its two
    /// terminal codes.
    pub async fn wait_storage_complete(&mut self) -> Result<StorageOutcome> {
        let p = &self.profile;
        let observed = RegisterOperation {
            address: p.registers.storage,
            write_value: None,
            success_values: vec![p.codes.storage_done_pickup, p.codes.storage_done_no_pickup],
            failure_values: Vec::new(),
            pending: PendingPolicy::Only(vec![p.codes.storage_begin]),
            poll_interval: p.timing.poll_interval,
            timeout: p.timing.operation_timeout,
        }
        .execute(&mut self.channel)
        .await?;

        let outcome = if observed == p.codes.storage_done_pickup {
            StorageOutcome::NeedsPickup
        } else {
            StorageOutcome::NoPickup
        };
        info!("storage cycle complete: {:?}", outcome);
        Ok(outcome)
    }

    /// Wait until the cabinet registers that the return package left the
    /// tray.
    pub async fn wait_package_taken(&mut self) -> Result<()> {
        let p = &self.profile;
        RegisterOperation::wait_for(
            p.registers.storage,
            vec![p.codes.storage_taken],
            p.timing.poll_interval,
            p.timing.operation_timeout,
        )
        .execute(&mut self.channel)
        .await?;
        info!("return package taken");
        Ok(())
    }

    /// User pickup addressed by box number: program the box, then trigger
    /// and wait for acceptance.
    pub async fn pickup_by_box(&mut self, box_no: u16) -> Result<()> {
        let box_register = self.profile.registers.pickup_box;
        let trigger = self.profile.registers.pickup_trigger;
        let request = self.profile.codes.accept_request;
        info!("user pickup from box {}", box_no);
        self.channel.ensure_connected().await?;
        self.channel.write_register(box_register, box_no).await?;
        self.accept_request(trigger, request).await
    }

    /// User pickup addressed by the six-digit code written straight to the
    /// trigger register.
    pub async fn pickup_by_code(&mut self, code: u16) -> Result<()> {
        let trigger = self.profile.registers.pickup_trigger;
        info!("user pickup by code");
        self.accept_request(trigger, code).await
    }

    /// Remotely recycle an empty package box: two sequential stages, the
    /// second attempted only after the first is accepted.
    pub async fn recycle_empty(&mut self) -> Result<()> {
        let step1 = self.profile.registers.recycle_step1;
        let step2 = self.profile.registers.recycle_step2;
        let request = self.profile.codes.accept_request;
        info!("recycling empty box, stage 1");
        self.accept_request(step1, request).await?;
        info!("recycling empty box, stage 2");
        self.accept_request(step2, request).await
    }

    /// Hand an empty box out to a sending user.
    pub async fn collect_empty_box(&mut self) -> Result<()> {
        let p = &self.profile;
        info!("handing out empty box");
        let op = RegisterOperation {
            address: p.registers.recycle_step2,
            write_value: Some(p.codes.handout_request),
            success_values: vec![p.codes.handout_done],
            failure_values: Vec::new(),
            pending: PendingPolicy::AnyOther,
            poll_interval: p.timing.poll_interval,
            timeout: p.timing.operation_timeout,
        };
        op.execute(&mut self.channel).await?;
        Ok(())
    }

    /// Accept a user's deposit into the sending slot.
    pub async fn remote_deposit(&mut self) -> Result<()> {
        let deposit = self.profile.registers.deposit;
        let request = self.profile.codes.accept_request;
        info!("accepting remote deposit");
        self.accept_request(deposit, request).await
    }

    /// Is the deposit slot free? Pure read, no side effect.
    pub async fn can_deposit(&mut self) -> Result<bool> {
        let p = &self.profile;
        self.channel.ensure_connected().await?;
        let state = read_one(&mut self.channel, p.registers.deposit_status).await?;
        Ok(state == p.codes.deposit_free)
    }

    /// Read the pickup code the cabinet generated for the stored package.
    pub async fn read_pickup_code(&mut self) -> Result<PickupCode> {
        let p = &self.profile;
        self.channel.ensure_connected().await?;
        let halves = self.channel.read_registers(p.registers.code1, 2).await?;
        match halves[..] {
            [first, second] => {
                let code = PickupCode::new(first, second)?;
                info!("pickup code read: {}", code);
                Ok(code)
            }
            _ => Err(Error::ProtocolSend(format!(
                "expected 2 code registers, got {}",
                halves.len()
            ))),
        }
    }

    /// Write the open/close command and strict-poll for the matching done
    /// code, treating only the command echo as in-progress.
    async fn command_response(&mut self, address: u16, open: bool) -> Result<()> {
        let c = &self.profile.codes;
        let (command, done) = if open {
            (c.open_command, c.open_done)
        } else {
            (c.close_command, c.close_done)
        };
        RegisterOperation::command_response(
            address,
            command,
            done,
            self.profile.timing.poll_interval,
            self.profile.timing.operation_timeout,
        )
        .execute(&mut self.channel)
        .await?;
        Ok(())
    }

    /// Write a request value and tolerant-poll the same register for the
    /// acceptance code.
    async fn accept_request(&mut self, address: u16, request: u16) -> Result<()> {
        let p = &self.profile;
        let op = RegisterOperation {
            address,
            write_value: Some(request),
            success_values: vec![p.codes.accept_done],
            failure_values: Vec::new(),
            pending: PendingPolicy::AnyOther,
            poll_interval: p.timing.poll_interval,
            timeout: p.timing.operation_timeout,
        };
        op.execute(&mut self.channel).await?;
        Ok(())
    }
}
