// Application layer: data providers, user notifications and the session
// that ties them to the team-building core.

pub mod notify;
pub mod provider;
pub mod session;
