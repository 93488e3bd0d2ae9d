pub mod password;
pub mod session;

pub use session::{ResolvedSession, SessionProvider, SessionToken};
