pub mod credentials;
pub mod db;
pub mod identity;
pub mod tokens;

pub use credentials::Argon2Hasher;
pub use db::PgStore;
pub use identity::UserInfoVerifier;
pub use tokens::JwtTokenIssuer;
