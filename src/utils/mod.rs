pub mod channels;

pub use channels::ControllerChannels;
