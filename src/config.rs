use std::{env, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;

use crate::models::{Holiday, Project};
use crate::work_time_parser::ParserConfig;

/// 設定ファイルのパスを上書きする環境変数。
pub const CONFIG_ENV: &str = "WORKTRACK_CONFIG";

/// 設定ファイルの内容。
///
/// ファイルが存在しない場合はすべて既定値になる。
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub parser: ParserConfig,
    pub holidays: Vec<Holiday>,
    pub projects: Vec<Project>,
}

impl Config {
    /// 設定ファイルを読み込む。
    ///
    /// 環境変数`WORKTRACK_CONFIG`が設定されていればそのパスを、
    /// なければ`<config_dir>/worktrack/config.json`を利用する。
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                info!("Config file not found, using defaults: {}", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// 指定したパスの設定ファイルを読み込む。
    ///
    /// # Arguments
    ///
    /// * `path` - JSON形式の設定ファイル
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!("Config loaded from {}", path.display());

        Ok(config)
    }

    /// 設定ファイルのパスを返す。
    pub fn default_path() -> Option<PathBuf> {
        match env::var_os(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => dirs::config_dir().map(|dir| dir.join("worktrack").join("config.json")),
        }
    }

    /// 指定日に有効なプロジェクトを探す。
    pub fn active_project(&self, id: i64, date: chrono::NaiveDate) -> Option<&Project> {
        self.projects
            .iter()
            .find(|project| project.id == id && project.is_active_on(date))
    }
}
