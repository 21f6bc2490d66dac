//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use lexo_client::{ClientEvent, Notification};

use crate::View;

/// Something the driver observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverEvent {
    /// A user command.
    Input(ClientEvent),
    /// The channel requested by [`Driver::connect`] is open.
    Opened,
    /// A text frame arrived.
    Received(String),
    /// The channel closed. `clean` when the close handshake completed.
    Closed {
        /// Whether the close was orderly.
        clean: bool,
    },
    /// The user wants to exit.
    Shutdown,
}

/// Abstracts I/O operations for the session runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`crate::Runtime`] handles orchestration logic. This ensures
/// the same orchestration code runs in the terminal client and simulation.
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next event.
    ///
    /// Returns `None` if nothing happened within `timeout`. A `None` timeout
    /// waits indefinitely.
    fn next_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send;

    /// Start opening a channel to `url`.
    ///
    /// Success means the attempt is under way. The outcome arrives later as
    /// [`DriverEvent::Opened`] or [`DriverEvent::Closed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt could not be started at all.
    fn connect(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send one text frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is gone.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Begin an orderly close. Completion arrives as [`DriverEvent::Closed`].
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Surface a notification to the user.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn notify(&mut self, notification: &Notification) -> Result<(), Self::Error>;

    /// Render the current view.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &View<'_>) -> Result<(), Self::Error>;

    /// Stop the driver and clean up resources.
    fn stop(&mut self);
}
