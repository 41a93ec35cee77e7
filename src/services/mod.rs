pub mod conversation_service;
pub mod match_service;
pub mod profile_service;
pub mod session_service;

pub use conversation_service::ConversationService;
pub use match_service::MatchService;
pub use profile_service::ProfileService;
pub use session_service::SessionService;
