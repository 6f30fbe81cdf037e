use anyhow::{anyhow, Result};
use calsh_core::date_range::DateRange;
use calsh_core::event::{Event, NewEvent};
use calsh_core::protocol::Command as ProviderCommand;
use calsh_core::provider::Provider;

use crate::config::Config;

/// Where the shell reads and writes events.
pub trait Calendar {
    async fn list_events(&self, range: &DateRange) -> Result<Vec<Event>>;
    async fn create_event(&self, event: &NewEvent) -> Result<Event>;
    async fn delete_event(&self, event_id: &str) -> Result<()>;
}

/// A calendar living behind a provider binary.
pub struct RemoteCalendar {
    provider: Provider,
    account: Option<String>,
    calendar_id: String,
}

impl RemoteCalendar {
    pub fn new(provider: Provider, account: Option<String>, calendar_id: impl Into<String>) -> Self {
        RemoteCalendar {
            provider,
            account,
            calendar_id: calendar_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let provider = Provider::from_name(&config.provider).with_timeout(config.provider_timeout());
        RemoteCalendar::new(provider, config.account.clone(), &config.calendar_id)
    }

    /// Provider-specific params, e.g. `google_account` and `google_calendar_id`.
    fn params(&self) -> Result<serde_json::Value> {
        let name = self.provider.name();
        let account = self.account.as_deref().ok_or_else(|| {
            anyhow!(
                "No {} account configured. Run `calsh auth {}` and set `account` in config.toml",
                name,
                name
            )
        })?;

        let mut params = serde_json::Map::new();
        params.insert(format!("{}_account", name), account.into());
        params.insert(format!("{}_calendar_id", name), self.calendar_id.clone().into());
        Ok(serde_json::Value::Object(params))
    }
}

impl Calendar for RemoteCalendar {
    async fn list_events(&self, range: &DateRange) -> Result<Vec<Event>> {
        let mut params = self.params()?;
        params["time_min"] = range.from_rfc3339().into();
        params["time_max"] = range.to_rfc3339().into();

        Ok(self
            .provider
            .call_with_timeout(ProviderCommand::ListEvents, params)
            .await?)
    }

    async fn create_event(&self, event: &NewEvent) -> Result<Event> {
        let mut params = self.params()?;
        params["event"] = serde_json::to_value(event)?;

        Ok(self
            .provider
            .call_with_timeout(ProviderCommand::CreateEvent, params)
            .await?)
    }

    async fn delete_event(&self, event_id: &str) -> Result<()> {
        let mut params = self.params()?;
        params["event_id"] = serde_json::Value::String(event_id.to_string());

        Ok(self
            .provider
            .call_with_timeout(ProviderCommand::DeleteEvent, params)
            .await?)
    }
}
