//! Cabinet firmware profile: register addresses, status codes, timing
//!
//! Every literal the cabinet operations depend on lives here, so a
//! deployment running a different firmware revision overrides one injected
//! object instead of hunting for constants.

use std::time::Duration;

/// Logical signal name to register address.
#[derive(Debug, Clone)]
pub struct RegisterMap {
    /// Hatch door command/state.
    pub door: u16,
    /// Landing-pad occupancy confirmation.
    pub parking: u16,
    /// Package storage operation state.
    pub storage: u16,
    /// Cabinet-side servo (locker arm) command/state.
    pub servo: u16,
    /// Read-only gate: may a package be stored right now.
    pub storage_status: u16,
    /// First half of the pickup code.
    pub code1: u16,
    /// Second half of the pickup code.
    pub code2: u16,
    /// Box number for a box-directed user pickup.
    pub pickup_box: u16,
    /// User pickup trigger/acceptance.
    pub pickup_trigger: u16,
    /// Remote recycle, first stage.
    pub recycle_step1: u16,
    /// Remote recycle, second stage (also empty-box handout).
    pub recycle_step2: u16,
    /// Remote deposit trigger/acceptance.
    pub deposit: u16,
    /// Read-only gate: is the deposit slot free.
    pub deposit_status: u16,
    /// Operating-mode request register.
    pub mode_set: u16,
    /// Operating-mode state register.
    pub mode_status: u16,
}

impl Default for RegisterMap {
    fn default() -> Self {
        Self {
            door: 0x0BB8,
            parking: 0x0BB9,
            storage: 0x0BBA,
            servo: 0x0BBB,
            storage_status: 0x0BBE,
            code1: 0x0BC0,
            code2: 0x0BC1,
            pickup_box: 0x0BC2,
            pickup_trigger: 0x0BC3,
            recycle_step1: 0x0BC4,
            recycle_step2: 0x0BC5,
            deposit: 0x0BC7,
            deposit_status: 0x0BD2,
            mode_set: 0x0BCC,
            mode_status: 0x0BCD,
        }
    }
}

/// Command and state codes the firmware uses on those registers.
#[derive(Debug, Clone)]
pub struct StatusCodes {
    /// Written to `mode_set` to request automatic mode.
    pub mode_auto_request: u16,
    /// `mode_status` while the switch is in progress.
    pub mode_switching: u16,
    /// `mode_status` once automatic mode is active.
    pub mode_auto_active: u16,

    /// Door/parking/servo command-response convention: write the command
    /// code, read it echoed back while in progress, then the done code.
    pub open_command: u16,
    pub open_done: u16,
    pub close_command: u16,
    pub close_done: u16,

    /// Written to `storage` to begin a storage cycle.
    pub storage_begin: u16,
    /// Storage finished; the vehicle must pick a return package up.
    pub storage_done_pickup: u16,
    /// Storage finished; nothing to pick up.
    pub storage_done_no_pickup: u16,
    /// The return package has been taken off the tray.
    pub storage_taken: u16,
    /// `storage_status` value permitting a store.
    pub storage_allowed: u16,
    /// `storage_status` value forbidding a store.
    pub storage_blocked: u16,

    /// Servo readiness preconditions.
    pub servo_ready_store: u16,
    pub servo_ready_collect: u16,

    /// User/remote request acceptance convention.
    pub accept_request: u16,
    pub accept_done: u16,
    /// Handout convention for the empty-box slot.
    pub handout_request: u16,
    pub handout_done: u16,

    /// `deposit_status` value meaning the slot is free.
    pub deposit_free: u16,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            mode_auto_request: 0x0A,
            mode_switching: 10,
            mode_auto_active: 12,
            open_command: 10,
            open_done: 11,
            close_command: 20,
            close_done: 21,
            storage_begin: 110,
            storage_done_pickup: 111,
            storage_done_no_pickup: 122,
            storage_taken: 121,
            storage_allowed: 11,
            storage_blocked: 10,
            servo_ready_store: 1,
            servo_ready_collect: 2,
            accept_request: 210,
            accept_done: 211,
            handout_request: 110,
            handout_done: 111,
            deposit_free: 10,
        }
    }
}

/// Poll cadence and bounds for cabinet operations.
#[derive(Debug, Clone)]
pub struct CabinetTiming {
    /// Delay between successive status reads.
    pub poll_interval: Duration,
    /// Bound on ordinary command-response operations.
    pub operation_timeout: Duration,
    /// Bound on waiting for the servo readiness codes.
    pub servo_ready_timeout: Duration,
}

impl Default for CabinetTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            operation_timeout: Duration::from_secs(10),
            servo_ready_timeout: Duration::from_secs(30),
        }
    }
}

/// The complete firmware profile injected into the cabinet operation set.
#[derive(Debug, Clone, Default)]
pub struct CabinetProfile {
    pub registers: RegisterMap,
    pub codes: StatusCodes,
    pub timing: CabinetTiming,
}
