use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub clinic_timezone: Tz,
    pub queue_max_waiting: usize,
    pub queue_avg_service_minutes: u32,
    pub default_slot_minutes: u32,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            clinic_timezone: Tz::UTC,
            queue_max_waiting: 5,
            queue_avg_service_minutes: 5,
            default_slot_minutes: 30,
            server_port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            clinic_timezone: parse_var("CLINIC_TIMEZONE", defaults.clinic_timezone),
            queue_max_waiting: parse_var("QUEUE_MAX_WAITING", defaults.queue_max_waiting),
            queue_avg_service_minutes: parse_var(
                "QUEUE_AVG_SERVICE_MINUTES",
                defaults.queue_avg_service_minutes,
            ),
            default_slot_minutes: parse_var("DEFAULT_SLOT_MINUTES", defaults.default_slot_minutes),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
        };

        if !config.is_configured() {
            warn!("Appointment ledger not configured - falling back to in-memory storage");
        }

        config
    }

    /// True when the Supabase-backed appointment ledger can be used.
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn is_auth_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
