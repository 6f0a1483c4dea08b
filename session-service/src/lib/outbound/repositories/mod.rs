pub mod blacklist;
pub mod refresh_token;
pub mod reset_token;
pub mod user;

pub use blacklist::PostgresTokenBlacklistRepository;
pub use refresh_token::PostgresRefreshTokenRepository;
pub use reset_token::PostgresResetTokenRepository;
pub use user::PostgresUserRepository;
