pub mod auth;
pub mod matches;
pub mod media;
pub mod messages;
pub mod users;
pub mod wsroute;
