//! Typed view of `settings.yaml`, `ladders.yaml` and `secrets.yaml`.
//!
//! Every section is `#[serde(default)]`: a missing key takes its default, an
//! unknown key is ignored, and a key of the wrong type fails validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The whole dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AppSettings {
    /// Ports, log level and environment.
    pub system: SystemSettings,
    /// Order sizing and pacing.
    pub trading: TradingSettings,
    /// ATR guard, position caps and daily limits.
    pub risk_control: RiskControlSettings,
    /// Human-like interaction timing.
    pub behavior: BehaviorSettings,
    /// Outbound notification channels.
    pub notifications: NotificationSettings,
    /// Local database.
    pub database: DatabaseSettings,
    /// Log file policy.
    pub logging: LoggingSettings,
    /// Point ladders, loaded from `ladders.yaml`.
    pub ladders: LadderSettings,
    /// Credentials, loaded from `secrets.yaml`. Never serialized.
    #[serde(skip_serializing)]
    pub secrets: SecretSettings,
}

/// `system` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SystemSettings {
    /// Browser remote-debugging port.
    pub debug_port: u16,
    /// HTTP API port.
    pub api_port: u16,
    /// Log level name.
    pub log_level: String,
    /// `development` or `production`.
    pub environment: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            debug_port: 9222,
            api_port: 8000,
            log_level: "INFO".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// `trading` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct TradingSettings {
    /// Daily points goal.
    pub target_points_per_day: u32,
    /// Upper bound on trades per day.
    pub max_trade_count: u32,
    /// Smallest order, in quote currency.
    pub min_order_value: f64,
    /// Largest order, in quote currency.
    pub max_order_value: f64,
    /// Accepted relative deviation from the reference price.
    pub price_deviation: f64,
    /// Seconds between market checks.
    pub check_interval: u64,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            target_points_per_day: 5,
            max_trade_count: 50,
            min_order_value: 10.0,
            max_order_value: 100.0,
            price_deviation: 0.001,
            check_interval: 60,
        }
    }
}

/// `risk_control` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RiskControlSettings {
    /// Volatility guard.
    pub atr: AtrSettings,
    /// Position caps.
    pub position: PositionSettings,
    /// Per-day caps.
    pub daily_limits: DailyLimitSettings,
}

/// `risk_control.atr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AtrSettings {
    /// Whether the guard runs.
    pub enabled: bool,
    /// Candles in the ATR window.
    pub period: u32,
    /// ATR multiple that pauses trading.
    pub multiplier: f64,
    /// Seconds between recomputations.
    pub interval: u64,
}

impl Default for AtrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            period: 14,
            multiplier: 1.5,
            interval: 300,
        }
    }
}

/// `risk_control.position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PositionSettings {
    /// Cap on all open positions together.
    pub max_total_value: f64,
    /// Cap on one position.
    pub max_single_value: f64,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            max_total_value: 500.0,
            max_single_value: 100.0,
        }
    }
}

/// `risk_control.daily_limits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DailyLimitSettings {
    /// Loss that stops trading for the day.
    pub max_loss: f64,
    /// Volume that stops trading for the day.
    pub max_volume: f64,
}

impl Default for DailyLimitSettings {
    fn default() -> Self {
        Self {
            max_loss: 50.0,
            max_volume: 5000.0,
        }
    }
}

/// `behavior` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BehaviorSettings {
    /// Pause between actions.
    pub random_delay: RandomDelaySettings,
    /// Pointer movement.
    pub mouse_simulation: MouseSimulationSettings,
    /// Idle scrolling.
    pub page_scroll: PageScrollSettings,
}

/// `behavior.random_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RandomDelaySettings {
    /// Whether delays are inserted.
    pub enabled: bool,
    /// Shortest delay, seconds.
    pub min: u32,
    /// Longest delay, seconds.
    pub max: u32,
}

impl Default for RandomDelaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min: 1,
            max: 5,
        }
    }
}

/// `behavior.mouse_simulation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct MouseSimulationSettings {
    /// Whether pointer movement is simulated.
    pub enabled: bool,
    /// `slow`, `medium` or `fast`.
    pub speed: String,
}

impl Default for MouseSimulationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            speed: "medium".to_string(),
        }
    }
}

/// `behavior.page_scroll`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PageScrollSettings {
    /// Whether idle scrolling happens.
    pub enabled: bool,
    /// Chance of a scroll per idle tick.
    pub probability: f64,
}

impl Default for PageScrollSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.3,
        }
    }
}

/// `notifications` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NotificationSettings {
    /// Discord webhook.
    pub discord: NotificationChannel,
    /// Telegram bot.
    pub telegram: NotificationChannel,
    /// SMTP mail.
    pub email: NotificationChannel,
}

/// One notification channel. Which fields apply depends on the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NotificationChannel {
    /// Whether the channel is used.
    pub enabled: bool,
    /// Discord webhook URL.
    pub webhook: Option<String>,
    /// Telegram bot token.
    pub bot_token: Option<String>,
    /// Telegram chat id.
    pub chat_id: Option<String>,
    /// SMTP host.
    pub smtp_server: Option<String>,
    /// SMTP port.
    pub smtp_port: Option<u16>,
    /// Sender address.
    pub from_addr: Option<String>,
    /// Recipient address.
    pub to_addr: Option<String>,
}

/// `database` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Backend name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Database file.
    pub path: String,
    /// Whether statements are logged.
    pub echo: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            kind: "sqlite".to_string(),
            path: "data/alpha-score.db".to_string(),
            echo: false,
        }
    }
}

/// `logging` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level name.
    pub level: String,
    /// Line format.
    pub format: String,
    /// Rotation policy.
    pub rotation: String,
    /// Days of files to keep.
    pub retention: u32,
    /// Largest file, MiB.
    pub max_size: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: "%(asctime)s - %(name)s - %(levelname)s - %(message)s".to_string(),
            rotation: "daily".to_string(),
            retention: 30,
            max_size: 100,
        }
    }
}

/// `ladders.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LadderSettings {
    /// Points by account balance.
    pub balance_ladders: Vec<LadderStep>,
    /// Points by daily volume.
    pub volume_ladders: Vec<LadderStep>,
}

/// One ladder rung.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LadderStep {
    /// `[low, high]`; `null` means unbounded.
    pub range: Vec<Option<f64>>,
    /// Points awarded inside the range.
    pub points: f64,
}

/// `secrets.yaml`.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SecretSettings {
    /// Exchange API keys by name.
    pub api_keys: BTreeMap<String, String>,
    /// Token signing options.
    #[schema(value_type = Object)]
    pub jwt: BTreeMap<String, serde_json::Value>,
    /// Notification credentials.
    pub notifications: BTreeMap<String, String>,
    /// Mail credentials.
    pub email: BTreeMap<String, String>,
}

impl fmt::Debug for SecretSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSettings")
            .field("api_keys", &self.api_keys.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let Ok(settings) = serde_json::from_value::<AppSettings>(serde_json::json!({})) else {
            panic!("empty object must deserialize");
        };
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.system.api_port, 8000);
        assert_eq!(settings.risk_control.atr.period, 14);
        assert_eq!(settings.database.kind, "sqlite");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let raw = serde_json::json!({ "trading": { "max_trade_count": 80 }, "extra": true });
        let Ok(settings) = serde_json::from_value::<AppSettings>(raw) else {
            panic!("partial section must deserialize");
        };
        assert_eq!(settings.trading.max_trade_count, 80);
        assert_eq!(settings.trading.target_points_per_day, 5);
    }

    #[test]
    fn wrong_type_is_rejected() {
        let raw = serde_json::json!({ "system": { "api_port": "eight thousand" } });
        assert!(serde_json::from_value::<AppSettings>(raw).is_err());
    }

    #[test]
    fn secrets_never_serialize() {
        let mut settings = AppSettings::default();
        settings
            .secrets
            .api_keys
            .insert("binance".to_string(), "k3y".to_string());
        let Ok(value) = serde_json::to_value(&settings) else {
            panic!("settings must serialize");
        };
        assert!(value.get("secrets").is_none());
        assert!(!format!("{settings:?}").contains("k3y"));
    }
}
