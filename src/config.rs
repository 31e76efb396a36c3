use std::env;

/// Przelewy24 merchant credentials, loaded once at startup and passed
/// into the gateway client (never read from the environment at request time).
#[derive(Debug, Clone)]
pub struct P24Config {
    pub merchant_id: i64,
    pub pos_id: i64,
    /// CRC key used in request signatures.
    pub crc: String,
    /// REST API key (basic auth secret).
    pub api_key: String,
    /// API base, e.g. https://sandbox.przelewy24.pl
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public URL of this API (callback/webhook URLs are derived from it).
    pub base_url: String,
    /// Public URL of the parish-facing frontend (redirect targets).
    pub frontend_url: String,
    pub dev_mode: bool,
    pub p24: P24Config,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("KOLEKTA_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3001".to_string());

        let p24 = P24Config {
            merchant_id: env::var("P24_MERCHANT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            pos_id: env::var("P24_POS_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            crc: env::var("P24_CRC").unwrap_or_default(),
            api_key: env::var("P24_API_KEY").unwrap_or_default(),
            api_base: env::var("P24_API_BASE")
                .unwrap_or_else(|_| "https://sandbox.przelewy24.pl".to_string()),
        };

        if p24.merchant_id == 0 || p24.crc.is_empty() {
            tracing::warn!("P24 credentials not fully configured; gateway calls will fail");
        }

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "kolekta.db".to_string()),
            base_url,
            frontend_url,
            dev_mode,
            p24,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
