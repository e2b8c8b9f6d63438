pub mod claims;
pub mod codec;
pub mod config;
pub mod error;
pub mod extractors;
pub mod guards;
pub mod service;
pub mod signer;

pub use claims::{Claims, Header};
pub use config::{SigningSecret, TokenConfig};
pub use error::{AuthError, AuthResult, ConfigError, IssueError, VerifyError};
pub use extractors::AuthContext;
pub use guards::{authorize, ensure_role, GuardError, RoleDirectory};
pub use service::TokenService;
pub use signer::Signer;
