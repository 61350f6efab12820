//! Tracking collaborator: hand samples from hardware or the mouse.
//!
//! The public interface is a [`TrackerHandle`]: raw samples arrive over a
//! `mpsc` channel, control commands go the other way. Consumers don't need
//! to know whether samples came from a LeapMotion controller or from the
//! pointer simulator.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use glam::Vec3;
use thiserror::Error;
use tracing::warn;

use blade_tracking::landmarks::*;
use blade_tracking::{Handedness, RawHandSample};

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking device unavailable: {0}")]
    Unavailable(String),
    #[error("tracking frame failed: {0}")]
    Frame(String),
}

// ════════════════════════════════════════════════════════════════════════════
// HandSensor trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can answer "which hands are visible right now?".
pub trait HandSensor: Send + 'static {
    /// One sample. `Ok(None)` means the sensor had no new frame, so the
    /// previous hands stand. An error is treated as "no hands" by the
    /// tracker thread.
    fn detect(&mut self) -> Result<Option<Vec<RawHandSample>>, TrackingError>;

    /// Pause between requests. Blocking sensors return zero.
    fn pace(&self) -> Duration { Duration::from_millis(16) }
}

// ════════════════════════════════════════════════════════════════════════════
// Tracker thread
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerCommand {
    /// Resume sensor requests.
    Enable,
    /// Stop issuing sensor requests until re-enabled.
    Disable,
    /// Terminate the thread.
    Quit,
}

/// Handle to the tracking thread.
pub struct TrackerHandle {
    pub cmd_tx:    Sender<TrackerCommand>,
    pub sample_rx: Receiver<Vec<RawHandSample>>,
}

impl TrackerHandle {
    pub fn enable(&self)  { let _ = self.cmd_tx.send(TrackerCommand::Enable);  }
    pub fn disable(&self) { let _ = self.cmd_tx.send(TrackerCommand::Disable); }
    pub fn quit(&self)    { let _ = self.cmd_tx.send(TrackerCommand::Quit);    }

    /// Drain pending samples and keep only the newest (non-blocking).
    pub fn latest(&self) -> Option<Vec<RawHandSample>> {
        let mut last = None;
        while let Ok(s) = self.sample_rx.try_recv() { last = Some(s); }
        last
    }
}

/// Spawn a sensor on its own thread. It starts enabled.
pub fn spawn_tracker<S: HandSensor>(sensor: S) -> TrackerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (sample_tx, sample_rx) = mpsc::channel();
    thread::spawn(move || tracker_thread(sensor, cmd_rx, sample_tx));
    TrackerHandle { cmd_tx, sample_rx }
}

fn tracker_thread<S: HandSensor>(
    mut sensor: S,
    cmd_rx:     Receiver<TrackerCommand>,
    sample_tx:  Sender<Vec<RawHandSample>>,
) {
    let mut enabled = true;

    loop {
        // ── drain commands ────────────────────────────────────────────────
        loop {
            match cmd_rx.try_recv() {
                Ok(TrackerCommand::Enable)  => enabled = true,
                Ok(TrackerCommand::Disable) => enabled = false,
                Ok(TrackerCommand::Quit)    => return,
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        if !enabled {
            thread::sleep(Duration::from_millis(10));
            continue;
        }

        let hands = sensor.detect().unwrap_or_else(|e| {
            warn!(error = %e, "tracking sample failed; reporting no hands");
            Some(Vec::new())
        });
        if let Some(hands) = hands {
            if sample_tx.send(hands).is_err() { return; }
        }

        let pace = sensor.pace();
        if !pace.is_zero() { thread::sleep(pace); }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PointerSensor: mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw pointer event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Pointer position in window pixels, with the current window size.
    PointerMoved { x: f32, y: f32, width: f32, height: f32 },
    /// The pointer left the window.
    PointerLeft,
}

/// One simulated right hand whose index fingertip follows the pointer.
///
/// The visualizer sends [`SimInput`] events here; this sensor turns the
/// latest position into a full 21-landmark sample with fingers fanned
/// upward from a wrist below the pointer.
pub struct PointerSensor {
    rx:      Receiver<SimInput>,
    pointer: Option<(f32, f32)>,
}

impl PointerSensor {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        PointerSensor { rx, pointer: None }
    }

    fn drain(&mut self) -> Result<(), TrackingError> {
        loop {
            match self.rx.try_recv() {
                Ok(SimInput::PointerMoved { x, y, width, height }) if width > 0.0 && height > 0.0 => {
                    self.pointer = Some((x / width, y / height));
                }
                Ok(SimInput::PointerMoved { .. }) => {}
                Ok(SimInput::PointerLeft) => self.pointer = None,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    return Err(TrackingError::Unavailable("pointer window closed".into()));
                }
            }
        }
    }
}

impl HandSensor for PointerSensor {
    fn detect(&mut self) -> Result<Option<Vec<RawHandSample>>, TrackingError> {
        self.drain()?;
        Ok(Some(self.pointer.map(|(u, v)| pointer_hand(u, v)).into_iter().collect()))
    }
}

/// Offsets from the index tip in screen-normalized units, per finger chain
/// `[base, joint, joint, tip]`, thumb first.
const FAN: [[(f32, f32); 4]; 5] = [
    [(-0.050, 0.170), (-0.075, 0.140), (-0.090, 0.110), (-0.100, 0.085)],
    [( 0.000, 0.130), ( 0.000, 0.085), ( 0.000, 0.040), ( 0.000, 0.000)],
    [( 0.025, 0.130), ( 0.030, 0.080), ( 0.035, 0.035), ( 0.040,-0.005)],
    [( 0.050, 0.135), ( 0.058, 0.090), ( 0.065, 0.050), ( 0.072, 0.018)],
    [( 0.072, 0.145), ( 0.085, 0.110), ( 0.095, 0.080), ( 0.105, 0.055)],
];
const WRIST_OFFSET: (f32, f32) = (0.030, 0.220);

/// Synthesize a sample whose index tip sits at screen-normalized `(u, v)`.
///
/// The sensor frame is the un-mirrored camera image, so `x = 1 - u`. The
/// hand is reported with the sensor label `Left`, which the normalizer
/// stores as the player's right hand.
pub fn pointer_hand(u: f32, v: f32) -> RawHandSample {
    let at = |(du, dv): (f32, f32)| Vec3::new(1.0 - (u + du), v + dv, 0.0);

    let mut points = [Vec3::ZERO; LANDMARK_COUNT];
    points[WRIST] = at(WRIST_OFFSET);
    for (base, chain) in FINGER_CHAINS.iter().zip(FAN.iter()) {
        for (k, &offset) in chain.iter().enumerate() {
            points[base + k] = at(offset);
        }
    }
    RawHandSample::new(points, Some(Handedness::Left))
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSensor: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Sensor backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Leap positions are millimetres above the device; they are mapped onto
/// the camera-image frame the normalizer expects, with the interaction box
/// spanning `±LEAP_HALF_WIDTH_MM` horizontally and `LEAP_FLOOR_MM` up to
/// `LEAP_FLOOR_MM + LEAP_HEIGHT_MM` vertically.
#[cfg(feature = "leap")]
pub struct LeapSensor {
    connection: leaprs::Connection,
}

#[cfg(feature = "leap")]
const LEAP_HALF_WIDTH_MM: f32 = 200.0;
#[cfg(feature = "leap")]
const LEAP_FLOOR_MM:      f32 = 100.0;
#[cfg(feature = "leap")]
const LEAP_HEIGHT_MM:     f32 = 350.0;

#[cfg(feature = "leap")]
impl LeapSensor {
    pub fn open() -> Result<Self, TrackingError> {
        use leaprs::{Connection, ConnectionConfig};

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| TrackingError::Unavailable(format!("{e:?}")))?;
        connection.open()
            .map_err(|e| TrackingError::Unavailable(format!("{e:?}")))?;
        tracing::debug!("LeapC connection open");
        Ok(LeapSensor { connection })
    }
}

#[cfg(feature = "leap")]
fn leap_to_sensor(x: f32, y: f32, z: f32) -> Vec3 {
    // Camera frame is un-mirrored: the player's right is sensor-left.
    Vec3::new(
        0.5 - x / (2.0 * LEAP_HALF_WIDTH_MM),
        1.0 - (y - LEAP_FLOOR_MM) / LEAP_HEIGHT_MM,
        z / (2.0 * LEAP_HALF_WIDTH_MM),
    )
}

#[cfg(feature = "leap")]
macro_rules! joint {
    ($v:expr) => {{
        let v = $v;
        leap_to_sensor(v.x, v.y, v.z)
    }};
}

#[cfg(feature = "leap")]
impl HandSensor for LeapSensor {
    fn detect(&mut self) -> Result<Option<Vec<RawHandSample>>, TrackingError> {
        use leaprs::{Event, HandType};

        let msg = self.connection.poll(100)
            .map_err(|e| TrackingError::Frame(format!("{e:?}")))?;

        // Device and policy events carry no hands; keep the last frame.
        let Event::Tracking(frame) = msg.event() else { return Ok(None) };

        let samples = frame.hands().map(|hand| {
            let mut points = [Vec3::ZERO; LANDMARK_COUNT];
            let digits: Vec<_> = hand.digits().collect();
            if let Some(middle) = digits.get(2) {
                points[WRIST] = joint!(middle.metacarpal().prev_joint());
            }
            for (base, digit) in FINGER_CHAINS.iter().zip(digits.iter()) {
                points[base]     = joint!(digit.metacarpal().next_joint());
                points[base + 1] = joint!(digit.proximal().next_joint());
                points[base + 2] = joint!(digit.intermediate().next_joint());
                points[base + 3] = joint!(digit.distal().next_joint());
            }
            // Leap reports true handedness; the camera convention is mirrored.
            let label = match hand.hand_type() {
                HandType::Left  => Handedness::Right,
                HandType::Right => Handedness::Left,
            };
            RawHandSample::new(points, Some(label))
        }).collect();

        Ok(Some(samples))
    }

    fn pace(&self) -> Duration { Duration::ZERO }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
