// Audio module - clock abstraction, click synthesis, and the CPAL backend

pub mod clock;
pub mod engine;
pub mod parameters;
pub mod timing;
pub mod tone;
