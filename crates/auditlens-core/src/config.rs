use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub geoip_path: String,
    pub auth_mode: AuthMode,
    /// Zone used to resolve calendar days for date ranges.
    pub timezone: Tz,
    pub cors_origins: Vec<String>,
    pub duckdb_memory_limit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    /// Every caller is treated as an administrator. Local development only.
    None,
    /// Holds the HS256 secret read from `AUDITLENS_JWT_SECRET`.
    Jwt(String),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("AUDITLENS_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("AUDITLENS_DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string()),
            geoip_path: std::env::var("AUDITLENS_GEOIP_PATH")
                .unwrap_or_else(|_| "./GeoLite2-City.mmdb".to_string()),
            auth_mode: {
                let raw = std::env::var("AUDITLENS_AUTH").unwrap_or_else(|_| "jwt".to_string());
                match raw.as_str() {
                    "none" => AuthMode::None,
                    _ => {
                        let secret = std::env::var("AUDITLENS_JWT_SECRET").map_err(|_| {
                            "AUDITLENS_JWT_SECRET required when AUTH=jwt".to_string()
                        })?;
                        AuthMode::Jwt(secret)
                    }
                }
            },
            timezone: match std::env::var("AUDITLENS_TIMEZONE") {
                Ok(raw) => raw
                    .trim()
                    .parse::<Tz>()
                    .map_err(|_| format!("invalid timezone: {raw}"))?,
                Err(_) => Tz::UTC,
            },
            cors_origins: std::env::var("AUDITLENS_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            duckdb_memory_limit: std::env::var("AUDITLENS_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
        })
    }
}
