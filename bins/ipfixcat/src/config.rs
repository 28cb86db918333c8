use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser};
use serde::Deserialize;

use crate::error::CatError;

const DEFAULT_STATS_INTERVAL: u64 = 60;
const DEFAULT_TOP_FLOWS: usize = 10;

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Parser, Clone, Debug)]
#[command(name = "ipfixcat", version, about = "Печать потока IPFIX как JSON lines")]
pub struct Cli {
    /// Путь к TOML конфиг файлу (необязателен)
    #[arg(long, default_value = "ipfixcat.toml", env = "IPFIXCAT_CONFIG")]
    pub config: String,

    /// Файл словаря полей (TOML)
    #[arg(long, env = "IPFIXCAT_DICT")]
    pub dict: Option<PathBuf>,

    /// Статистика сообщений
    #[arg(long, env = "IPFIXCAT_MSTATS")]
    pub mstats: bool,

    /// Учёт трафика по потокам
    #[arg(long, env = "IPFIXCAT_ACC")]
    pub acc: bool,

    /// Писать записи в stdout (по умолчанию true)
    #[arg(long, env = "IPFIXCAT_OUTPUT", action = ArgAction::Set)]
    pub output: Option<bool>,

    /// Период статистики в секундах
    #[arg(long, env = "IPFIXCAT_STATSINTV")]
    pub statsintv: Option<u64>,

    /// Входной файл вместо stdin
    #[arg(long, env = "IPFIXCAT_INPUT")]
    pub input: Option<PathBuf>,

    /// Сколько потоков показывать в итоге учёта трафика
    #[arg(long, env = "IPFIXCAT_TOP")]
    pub top: Option<usize>,
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub dict: Option<PathBuf>,
    pub mstats: Option<bool>,
    pub acc: Option<bool>,
    pub output: Option<bool>,
    pub statsintv: Option<u64>,
    pub input: Option<PathBuf>,
    pub top: Option<usize>,
}

pub fn load_config(path: &str) -> Result<Config, CatError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CatError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| CatError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  Effective — merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: config.toml < env/CLI
#[derive(Debug, Clone, PartialEq)]
pub struct Effective {
    pub dict: Option<PathBuf>,
    pub mstats: bool,
    pub acc: bool,
    pub output: bool,
    pub stats_interval: Duration,
    pub input: Option<PathBuf>,
    pub top: usize,
}

impl Effective {
    pub fn new(cli: &Cli) -> Result<Self, CatError> {
        let cfg = match load_config(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                if Path::new(&cli.config).exists() {
                    return Err(e);
                }
                Config::default()
            }
        };
        Self::merge(cli, cfg)
    }

    fn merge(cli: &Cli, cfg: Config) -> Result<Self, CatError> {
        let eff = Self {
            dict: cli.dict.clone().or(cfg.dict),
            mstats: cli.mstats || cfg.mstats.unwrap_or(false),
            acc: cli.acc || cfg.acc.unwrap_or(false),
            output: cli.output.or(cfg.output).unwrap_or(true),
            stats_interval: Duration::from_secs(cli.statsintv.or(cfg.statsintv).unwrap_or(DEFAULT_STATS_INTERVAL)),
            input: cli.input.clone().or(cfg.input),
            top: cli.top.or(cfg.top).unwrap_or(DEFAULT_TOP_FLOWS),
        };

        if !eff.output && !eff.mstats && !eff.acc {
            return Err(CatError::Config("nothing to do: output, mstats and acc are all disabled".into()));
        }
        if eff.stats_interval.is_zero() {
            return Err(CatError::Config("statsintv must be at least 1 second".into()));
        }
        Ok(eff)
    }

    pub fn options(&self) -> pipeline::Options {
        pipeline::Options {
            output: self.output,
            message_stats: self.mstats,
            traffic_stats: self.acc,
            top_flows: self.top,
            stats_interval: self.stats_interval,
        }
    }
}
