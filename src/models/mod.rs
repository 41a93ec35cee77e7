pub mod matches;
pub mod message;
pub mod session;
pub mod user;

pub use matches::MatchList;
pub use message::{Conversation, Message, MessageKind, ReadState};
pub use session::TokenSet;
pub use user::{AccountStatus, Profile, User};
