//! Hold-Action State Machine
//!
//! Decides between a reboot and a shutdown from how long the button stays
//! held: a press starts a fixed countdown, and the line is re-sampled only
//! once the countdown has elapsed. Still held means shutdown, released
//! means reboot. There is no mid-countdown cancellation; releasing early
//! only changes which action is decided.
//!
//! The machine only emits the decision. Invoking the privileged system
//! command is the caller's responsibility.

use std::time::Duration;

use tokio::time::sleep;
use tracing::info;

use crate::error::ReadError;

/// Countdown timing for the hold decision
pub mod timing {
    use std::time::Duration;

    /// Number of countdown steps (the legacy 4 one-second sleeps)
    pub const COUNTDOWN_STEPS: u32 = 4;

    /// Duration of one countdown step
    pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);
}

/// The decided system action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Button still held after the countdown
    Shutdown,
    /// Button released during the countdown
    Reboot,
}

/// Hold machine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    /// Waiting for a press
    Idle,
    /// Countdown in progress
    Counting,
    /// Terminal: shutdown decided
    ShutdownRequested,
    /// Terminal: reboot decided
    RebootRequested,
}

/// Hold-to-decide state machine over a pressed-state sampler
///
/// Holds a sampling capability instead of subclassing a button: any closure
/// returning the logical pressed state works, typically
/// [`crate::Button::hold_action`] wiring in a reader.
pub struct HoldAction<F> {
    sample: F,
    state: HoldState,
    steps: u32,
    step: Duration,
}

impl<F> HoldAction<F>
where
    F: FnMut() -> Result<bool, ReadError>,
{
    /// Create a machine with the legacy 4x1s countdown
    pub fn new(sample: F) -> Self {
        Self {
            sample,
            state: HoldState::Idle,
            steps: timing::COUNTDOWN_STEPS,
            step: timing::COUNTDOWN_STEP,
        }
    }

    /// Override the countdown length
    pub fn with_countdown(mut self, steps: u32, step: Duration) -> Self {
        self.steps = steps;
        self.step = step;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> HoldState {
        self.state
    }

    /// Sample the button and run the countdown decision
    ///
    /// Returns `Ok(None)` immediately, without transitioning, when the
    /// button is not pressed. Once a terminal state is reached the decided
    /// action is returned again without re-sampling.
    pub async fn check(&mut self) -> Result<Option<Action>, ReadError> {
        match self.state {
            HoldState::ShutdownRequested => return Ok(Some(Action::Shutdown)),
            HoldState::RebootRequested => return Ok(Some(Action::Reboot)),
            HoldState::Idle | HoldState::Counting => {}
        }

        if !self.sample_pressed()? {
            return Ok(None);
        }

        self.state = HoldState::Counting;
        info!("hold detected, counting down");
        sleep(self.step).await;
        for remaining in (1..self.steps).rev() {
            info!("{}", remaining);
            sleep(self.step).await;
        }

        if self.sample_pressed()? {
            self.state = HoldState::ShutdownRequested;
            info!("still held after countdown: shutdown requested");
            Ok(Some(Action::Shutdown))
        } else {
            self.state = HoldState::RebootRequested;
            info!("released during countdown: reboot requested");
            Ok(Some(Action::Reboot))
        }
    }

    fn sample_pressed(&mut self) -> Result<bool, ReadError> {
        match (self.sample)() {
            Ok(pressed) => Ok(pressed),
            Err(e) => {
                // A failed sample abandons the countdown so the caller can
                // retry from scratch.
                self.state = HoldState::Idle;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    fn scripted(samples: &[Result<bool, ReadError>]) -> (
        impl FnMut() -> Result<bool, ReadError>,
        Arc<Mutex<VecDeque<Result<bool, ReadError>>>>,
    ) {
        let queue: Arc<Mutex<VecDeque<Result<bool, ReadError>>>> =
            Arc::new(Mutex::new(samples.iter().cloned().collect()));
        let shared = queue.clone();
        let sample = move || {
            shared
                .lock()
                .unwrap()
                .pop_front()
                .expect("sampler called more often than scripted")
        };
        (sample, queue)
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_through_countdown_requests_shutdown() {
        let (sample, _) = scripted(&[Ok(true), Ok(true)]);
        let mut hold = HoldAction::new(sample);

        assert_eq!(hold.check().await, Ok(Some(Action::Shutdown)));
        assert_eq!(hold.state(), HoldState::ShutdownRequested);
    }

    #[tokio::test(start_paused = true)]
    async fn test_released_during_countdown_requests_reboot() {
        let (sample, _) = scripted(&[Ok(true), Ok(false)]);
        let mut hold = HoldAction::new(sample);

        assert_eq!(hold.check().await, Ok(Some(Action::Reboot)));
        assert_eq!(hold.state(), HoldState::RebootRequested);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_pressed_returns_none_without_transition() {
        let (sample, queue) = scripted(&[Ok(false)]);
        let mut hold = HoldAction::new(sample);

        assert_eq!(hold.check().await, Ok(None));
        assert_eq!(hold.state(), HoldState::Idle);
        // Exactly one sample taken, no countdown resample
        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resamples_only_at_countdown_end() {
        // Two samples total for a full countdown: one at Idle, one at the
        // end, never during the steps.
        let (sample, queue) = scripted(&[Ok(true), Ok(false)]);
        let mut hold = HoldAction::new(sample);

        hold.check().await.unwrap();
        assert!(queue.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_state_repeats_decision_without_sampling() {
        let (sample, _) = scripted(&[Ok(true), Ok(true)]);
        let mut hold = HoldAction::new(sample);

        assert_eq!(hold.check().await, Ok(Some(Action::Shutdown)));
        // No samples left in the script; a re-check must not consume any.
        assert_eq!(hold.check().await, Ok(Some(Action::Shutdown)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sampler_error_resets_to_idle() {
        let (sample, _) = scripted(&[Ok(true), Err(ReadError::Io("read failed".to_string()))]);
        let mut hold = HoldAction::new(sample);

        assert_eq!(
            hold.check().await,
            Err(ReadError::Io("read failed".to_string()))
        );
        assert_eq!(hold.state(), HoldState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_countdown() {
        let (sample, _) = scripted(&[Ok(true), Ok(true)]);
        let mut hold =
            HoldAction::new(sample).with_countdown(2, Duration::from_millis(50));

        assert_eq!(hold.check().await, Ok(Some(Action::Shutdown)));
    }
}
