use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub upload: UploadConfig,
    pub rate_limit: RateLimitConfig,
    pub licenses: LicenseConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_allowed_origins: Vec<String>,
    /// Base URL used to build public box view links (QR code target)
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory where uploaded files are stored
    pub dir: String,
    /// Maximum size per uploaded file, in bytes
    pub max_file_size: usize,
    /// Maximum number of files accepted in one upload request
    pub max_files_per_upload: usize,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

/// Registration license codes seeded into the database at startup.
#[derive(Debug, Clone)]
pub struct LicenseConfig {
    pub codes: Vec<LicenseSeed>,
}

#[derive(Debug, Clone)]
pub struct LicenseSeed {
    pub code: String,
    pub max_uses: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            licenses: LicenseConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        Ok(Self {
            host,
            port,
            environment,
            cors_allowed_origins,
            public_base_url,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

    pub fn from_env() -> Result<Self, String> {
        let path = env::var("DATABASE_PATH").unwrap_or_else(|_| "./database.sqlite".to_string());

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            path,
            max_connections,
            acquire_timeout_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60; // 7 days

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let token_ttl_secs = env::var("JWT_EXPIRES_IN_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TOKEN_TTL_SECS.to_string())
            .parse::<i64>()
            .map_err(|_| "JWT_EXPIRES_IN_SECS must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            token_ttl_secs,
        })
    }
}

impl UploadConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024; // 50 MiB
    const DEFAULT_MAX_FILES_PER_UPLOAD: usize = 10;

    pub fn from_env() -> Result<Self, String> {
        let dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let max_file_size = env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_FILE_SIZE must be a valid number".to_string())?;

        let max_files_per_upload = env::var("MAX_FILES_PER_UPLOAD")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_FILES_PER_UPLOAD.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_FILES_PER_UPLOAD must be a valid number".to_string())?;

        Ok(Self {
            dir,
            max_file_size,
            max_files_per_upload,
        })
    }
}

impl RateLimitConfig {
    const DEFAULT_WINDOW_MS: u64 = 15 * 60 * 1000; // 15 minutes
    const DEFAULT_MAX_REQUESTS: u32 = 100;

    pub fn from_env() -> Result<Self, String> {
        let window_ms = env::var("RATE_LIMIT_WINDOW_MS")
            .unwrap_or_else(|_| Self::DEFAULT_WINDOW_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "RATE_LIMIT_WINDOW_MS must be a valid number".to_string())?;

        let max_requests = env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUESTS.to_string())
            .parse::<u32>()
            .map_err(|_| "RATE_LIMIT_MAX_REQUESTS must be a valid number".to_string())?;

        Ok(Self {
            window_ms,
            max_requests,
        })
    }
}

impl LicenseConfig {
    /// Parse `LICENSE_CODES` in `code:max_uses` comma-separated form,
    /// e.g. `LICENSE_CODES=ALPHA-2024:5,BETA-2024:10`.
    pub fn from_env() -> Result<Self, String> {
        let raw = env::var("LICENSE_CODES").unwrap_or_default();
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, String> {
        let mut codes = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (code, max_uses) = entry
                .split_once(':')
                .ok_or_else(|| format!("Invalid LICENSE_CODES entry '{}'", entry))?;
            let max_uses = max_uses
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("Invalid max_uses in LICENSE_CODES entry '{}'", entry))?;
            codes.push(LicenseSeed {
                code: code.trim().to_string(),
                max_uses,
            });
        }

        Ok(Self { codes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_codes_parse() {
        let config = LicenseConfig::parse("ALPHA-2024:5, BETA-2024:10").unwrap();
        assert_eq!(config.codes.len(), 2);
        assert_eq!(config.codes[0].code, "ALPHA-2024");
        assert_eq!(config.codes[0].max_uses, 5);
        assert_eq!(config.codes[1].code, "BETA-2024");
        assert_eq!(config.codes[1].max_uses, 10);
    }

    #[test]
    fn test_license_codes_empty() {
        assert!(LicenseConfig::parse("").unwrap().codes.is_empty());
    }

    #[test]
    fn test_license_codes_rejects_malformed() {
        assert!(LicenseConfig::parse("NO-COLON").is_err());
        assert!(LicenseConfig::parse("CODE:abc").is_err());
    }
}
