//! Session state: one dispatcher consuming one event stream

mod dispatcher;
mod events;
mod phone_link;

pub use dispatcher::Dispatcher;
pub use events::SessionEvent;
pub use phone_link::PhoneLink;
