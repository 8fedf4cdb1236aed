pub mod commands;
pub mod types;

pub use commands::{handle_event, handle_line};
pub use types::{
    CopyAndPasteEvent, EndSessionRequest, Event, EventError, NewSessionRequest, ResizePageEvent,
    Response, TimeTakenEvent,
};
