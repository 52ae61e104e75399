use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub data_service_url: String,
    pub odds_warehouse_url: String,

    pub queue_driver: String,
    pub queue_url: String,

    pub server_port: u16,

    pub user: UserConfig,
}

/// Hardcoded single-user credentials until abstract user management lands.
#[derive(Clone, Debug)]
pub struct UserConfig {
    pub id: String,
    pub email: String,
    pub betfair_username: String,
    pub betfair_password: String,
    pub betfair_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port_str = env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_string());
        let server_port = port_str.parse().unwrap_or_else(|_| {
            eprintln!("Warning: Invalid SERVER_PORT '{}', defaulting to 8080", port_str);
            8080
        });

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            data_service_url: env::var("DATA_SERVICE_URL").unwrap_or_default(),
            odds_warehouse_url: env::var("ODDS_WAREHOUSE_URL").unwrap_or_default(),

            queue_driver: env::var("QUEUE_DRIVER").unwrap_or_else(|_| "log".to_string()),
            queue_url: env::var("QUEUE_URL").unwrap_or_default(),

            server_port,

            user: UserConfig {
                id: env::var("USER_ID").unwrap_or_default(),
                email: env::var("USER_EMAIL").unwrap_or_default(),
                betfair_username: env::var("BETFAIR_USERNAME").unwrap_or_default(),
                betfair_password: env::var("BETFAIR_PASSWORD").unwrap_or_default(),
                betfair_key: env::var("BETFAIR_KEY").unwrap_or_default(),
            },
        }
    }
}
