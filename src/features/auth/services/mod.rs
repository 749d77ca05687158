pub mod auth_service;
pub mod license_service;
pub mod password;
pub mod token_service;

pub use auth_service::AuthService;
pub use license_service::LicenseService;
pub use token_service::TokenService;
