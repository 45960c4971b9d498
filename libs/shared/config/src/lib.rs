use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_port: u16,
    pub default_slot_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_port = env::var("SALON_API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| {
                warn!("SALON_API_PORT not set or invalid, defaulting to 3000");
                3000
            });

        let default_slot_minutes = env::var("SALON_SLOT_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|m: &i64| *m > 0)
            .unwrap_or_else(|| {
                warn!("SALON_SLOT_MINUTES not set or invalid, defaulting to 30");
                30
            });

        Self {
            bind_port,
            default_slot_minutes,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_port: 3000,
            default_slot_minutes: 30,
        }
    }
}
