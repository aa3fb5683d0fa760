use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub mailer_api_url: String,
    pub mailer_api_key: String,
    pub mailer_from_address: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            mailer_api_url: env::var("MAILER_API_URL")
                .unwrap_or_else(|_| {
                    warn!("MAILER_API_URL not set, using empty value");
                    String::new()
                }),
            mailer_api_key: env::var("MAILER_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("MAILER_API_KEY not set, using empty value");
                    String::new()
                }),
            mailer_from_address: env::var("MAILER_FROM_ADDRESS")
                .unwrap_or_else(|_| {
                    warn!("MAILER_FROM_ADDRESS not set, using default");
                    "reminders@clinic.example".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
    }

    pub fn is_mailer_configured(&self) -> bool {
        !self.mailer_api_url.is_empty()
            && !self.mailer_api_key.is_empty()
            && !self.mailer_from_address.is_empty()
    }
}
