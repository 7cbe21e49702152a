pub mod decay;
pub mod gesture;
pub mod messages;

pub use messages::Message;
