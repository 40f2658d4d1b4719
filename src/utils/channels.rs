use crate::controller::ControllerCommand;
use crate::speech::{CaptureEvent, SynthesisEvent};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Channels feeding the controller's event loop.
///
/// The controller keeps the senders alive itself so these never disconnect.
pub struct ControllerChannels {
    pub command_tx: Sender<ControllerCommand>,
    pub command_rx: Receiver<ControllerCommand>,
    pub capture_tx: Sender<CaptureEvent>,
    pub capture_rx: Receiver<CaptureEvent>,
    pub synthesis_tx: Sender<SynthesisEvent>,
    pub synthesis_rx: Receiver<SynthesisEvent>,
}

impl ControllerChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (command_tx, command_rx) = bounded(buffer_size);
        let (capture_tx, capture_rx) = bounded(buffer_size);
        let (synthesis_tx, synthesis_rx) = bounded(buffer_size);

        Self {
            command_tx,
            command_rx,
            capture_tx,
            capture_rx,
            synthesis_tx,
            synthesis_rx,
        }
    }
}

impl Default for ControllerChannels {
    fn default() -> Self {
        Self::new(64)
    }
}
