// Typed application settings with defaults, plus the optional overlay read from YAML
use crate::indicators::{IndicatorParameters, KdjParams, MacdParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub currencies: Vec<CurrencyConfig>,
    pub analysis: AnalysisConfig,
    pub notification: NotificationConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    CoinGecko,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub provider: ProviderKind,
    pub coingecko: CoinGeckoConfig,
    pub csv: CsvSourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    /// Demo API key; empty means unauthenticated.
    pub api_key: String,
    /// Seconds a fetched response stays fresh.
    pub cache_ttl: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvSourceConfig {
    /// Directory holding one `{coin_id}.csv` per currency.
    pub directory: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub symbol: String,
    pub name: String,
    pub coin_id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Days of history requested from the market-data provider.
    pub lookback_days: u32,
    pub indicators: IndicatorsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorsConfig {
    pub ma: MaConfig,
    pub macd: MacdConfig,
    pub kdj: KdjConfig,
    pub skdj: KdjConfig,
    pub obv: ObvConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaConfig {
    pub enabled: bool,
    pub periods: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdConfig {
    pub enabled: bool,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KdjConfig {
    pub enabled: bool,
    pub period: usize,
    pub k_period: usize,
    pub d_period: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObvConfig {
    pub enabled: bool,
    pub period: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub telegram: TelegramConfig,
    pub console: ConsoleConfig,
    /// Seconds before the same (currency, kind) notification may be sent again.
    pub cooldown: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub check_interval: u64,
    /// Percent change between two checks that triggers a price alert.
    pub alert_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
    /// Size at which the log file is rotated, e.g. `10MB`.
    pub max_size: String,
    /// Rotated files kept next to the active one.
    pub backup_count: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig {
                provider: ProviderKind::CoinGecko,
                coingecko: CoinGeckoConfig {
                    base_url: "https://api.coingecko.com/api/v3".to_string(),
                    api_key: String::new(),
                    cache_ttl: 300,
                    timeout_secs: 15,
                },
                csv: CsvSourceConfig {
                    directory: PathBuf::from("data"),
                },
            },
            currencies: vec![
                CurrencyConfig {
                    symbol: "BTC".to_string(),
                    name: "Bitcoin".to_string(),
                    coin_id: "bitcoin".to_string(),
                    enabled: true,
                },
                CurrencyConfig {
                    symbol: "ETH".to_string(),
                    name: "Ethereum".to_string(),
                    coin_id: "ethereum".to_string(),
                    enabled: true,
                },
            ],
            analysis: AnalysisConfig {
                lookback_days: 7,
                indicators: IndicatorsConfig {
                    ma: MaConfig {
                        enabled: true,
                        periods: vec![5, 48, 180],
                    },
                    macd: MacdConfig {
                        enabled: true,
                        fast: 6,
                        slow: 7,
                        signal: 6,
                    },
                    kdj: KdjConfig {
                        enabled: true,
                        period: 9,
                        k_period: 3,
                        d_period: 3,
                    },
                    skdj: KdjConfig {
                        enabled: true,
                        period: 9,
                        k_period: 3,
                        d_period: 3,
                    },
                    obv: ObvConfig {
                        enabled: true,
                        period: 30,
                    },
                },
            },
            notification: NotificationConfig {
                enabled: true,
                telegram: TelegramConfig {
                    enabled: true,
                    bot_token: String::new(),
                    chat_id: String::new(),
                },
                console: ConsoleConfig { enabled: true },
                cooldown: 300,
            },
            monitoring: MonitoringConfig {
                enabled: true,
                check_interval: 60,
                alert_threshold: 1.0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
                max_size: "10MB".to_string(),
                backup_count: 5,
            },
        }
    }
}

impl IndicatorsConfig {
    /// Parameter sets for the enabled indicator families.
    pub fn indicator_parameters(&self) -> IndicatorParameters {
        let kdj_params = |c: &KdjConfig| KdjParams {
            period: c.period,
            k_period: c.k_period,
            d_period: c.d_period,
        };
        IndicatorParameters {
            ma_periods: self.ma.enabled.then(|| self.ma.periods.clone()),
            macd: self.macd.enabled.then_some(MacdParams {
                fast: self.macd.fast,
                slow: self.macd.slow,
                signal: self.macd.signal,
            }),
            kdj: self.kdj.enabled.then(|| kdj_params(&self.kdj)),
            skdj: self.skdj.enabled.then(|| kdj_params(&self.skdj)),
            obv_period: self.obv.enabled.then_some(self.obv.period),
        }
    }
}

// ---------------------------------------------------------------------------
// Overlay: every field optional; only supplied fields replace the defaults.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub api: Option<ApiOverlay>,
    pub currencies: Option<Vec<CurrencyConfig>>,
    pub analysis: Option<AnalysisOverlay>,
    pub notification: Option<NotificationOverlay>,
    pub monitoring: Option<MonitoringOverlay>,
    pub logging: Option<LoggingOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiOverlay {
    pub provider: Option<ProviderKind>,
    pub coingecko: Option<CoinGeckoOverlay>,
    pub csv: Option<CsvSourceOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoinGeckoOverlay {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub cache_ttl: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CsvSourceOverlay {
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisOverlay {
    pub lookback_days: Option<u32>,
    pub indicators: Option<IndicatorsOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IndicatorsOverlay {
    pub ma: Option<MaOverlay>,
    pub macd: Option<MacdOverlay>,
    pub kdj: Option<KdjOverlay>,
    pub skdj: Option<KdjOverlay>,
    pub obv: Option<ObvOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaOverlay {
    pub enabled: Option<bool>,
    pub periods: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MacdOverlay {
    pub enabled: Option<bool>,
    pub fast: Option<usize>,
    pub slow: Option<usize>,
    pub signal: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KdjOverlay {
    pub enabled: Option<bool>,
    pub period: Option<usize>,
    pub k_period: Option<usize>,
    pub d_period: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObvOverlay {
    pub enabled: Option<bool>,
    pub period: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationOverlay {
    pub enabled: Option<bool>,
    pub telegram: Option<TelegramOverlay>,
    pub console: Option<ConsoleOverlay>,
    pub cooldown: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TelegramOverlay {
    pub enabled: Option<bool>,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsoleOverlay {
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitoringOverlay {
    pub enabled: Option<bool>,
    pub check_interval: Option<u64>,
    pub alert_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingOverlay {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub max_size: Option<String>,
    pub backup_count: Option<usize>,
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl AppConfig {
    /// Enabled currency whose symbol matches case-insensitively.
    pub fn currency(&self, symbol: &str) -> Option<&CurrencyConfig> {
        self.currencies
            .iter()
            .find(|c| c.enabled && c.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn enabled_currencies(&self) -> Vec<&CurrencyConfig> {
        self.currencies.iter().filter(|c| c.enabled).collect()
    }

    /// Overlays the fields present in `overlay`; lists are replaced wholesale.
    pub fn apply(&mut self, overlay: ConfigOverlay) {
        if let Some(api) = overlay.api {
            set(&mut self.api.provider, api.provider);
            if let Some(cg) = api.coingecko {
                set(&mut self.api.coingecko.base_url, cg.base_url);
                set(&mut self.api.coingecko.api_key, cg.api_key);
                set(&mut self.api.coingecko.cache_ttl, cg.cache_ttl);
                set(&mut self.api.coingecko.timeout_secs, cg.timeout_secs);
            }
            if let Some(csv) = api.csv {
                set(&mut self.api.csv.directory, csv.directory);
            }
        }

        set(&mut self.currencies, overlay.currencies);

        if let Some(analysis) = overlay.analysis {
            set(&mut self.analysis.lookback_days, analysis.lookback_days);
            if let Some(ind) = analysis.indicators {
                self.analysis.indicators.apply(ind);
            }
        }

        if let Some(n) = overlay.notification {
            set(&mut self.notification.enabled, n.enabled);
            set(&mut self.notification.cooldown, n.cooldown);
            if let Some(tg) = n.telegram {
                set(&mut self.notification.telegram.enabled, tg.enabled);
                set(&mut self.notification.telegram.bot_token, tg.bot_token);
                set(&mut self.notification.telegram.chat_id, tg.chat_id);
            }
            if let Some(console) = n.console {
                set(&mut self.notification.console.enabled, console.enabled);
            }
        }

        if let Some(m) = overlay.monitoring {
            set(&mut self.monitoring.enabled, m.enabled);
            set(&mut self.monitoring.check_interval, m.check_interval);
            set(&mut self.monitoring.alert_threshold, m.alert_threshold);
        }

        if let Some(l) = overlay.logging {
            set(&mut self.logging.level, l.level);
            if l.file.is_some() {
                self.logging.file = l.file;
            }
            set(&mut self.logging.max_size, l.max_size);
            set(&mut self.logging.backup_count, l.backup_count);
        }
    }
}

impl IndicatorsConfig {
    fn apply(&mut self, overlay: IndicatorsOverlay) {
        if let Some(ma) = overlay.ma {
            set(&mut self.ma.enabled, ma.enabled);
            set(&mut self.ma.periods, ma.periods);
        }
        if let Some(macd) = overlay.macd {
            set(&mut self.macd.enabled, macd.enabled);
            set(&mut self.macd.fast, macd.fast);
            set(&mut self.macd.slow, macd.slow);
            set(&mut self.macd.signal, macd.signal);
        }
        for (target, patch) in [(&mut self.kdj, overlay.kdj), (&mut self.skdj, overlay.skdj)] {
            if let Some(p) = patch {
                set(&mut target.enabled, p.enabled);
                set(&mut target.period, p.period);
                set(&mut target.k_period, p.k_period);
                set(&mut target.d_period, p.d_period);
            }
        }
        if let Some(obv) = overlay.obv {
            set(&mut self.obv.enabled, obv.enabled);
            set(&mut self.obv.period, obv.period);
        }
    }
}
