use serde::Deserialize;
use std::path::Path;
use tracing::warn;

use crate::error::{AppError, AppResult, ConfigError, FileError};

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    /// 逐步驱动完整的文档处理流程
    Session,
    /// 一次性加载结果页数据
    Results,
}

impl AppMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Some(AppMode::Session),
            "results" => Some(AppMode::Results),
            _ => None,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端服务地址
    pub api_base_url: String,
    /// 余额查询使用的用户 ID
    pub user_id: String,
    /// 可信度查询使用的钱包地址
    pub wallet: String,
    /// 待处理的文档路径
    pub document_path: Option<String>,
    /// 预先选择的分类（原样传给后端）
    pub category: Option<String>,
    /// 依次向助手提出的问题
    pub chat_questions: Vec<String>,
    /// 满足条件时是否查询可信度
    pub check_trust: bool,
    /// 运行模式
    pub mode: AppMode,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 会话报告输出文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            user_id: "user-123".to_string(),
            wallet: "user-wallet-123".to_string(),
            document_path: None,
            category: None,
            chat_questions: Vec::new(),
            check_trust: true,
            mode: AppMode::Session,
            verbose_logging: false,
            output_log_file: "session_report.txt".to_string(),
        }
    }
}

/// TOML 配置文件中允许出现的字段，全部可选
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    user_id: Option<String>,
    wallet: Option<String>,
    document_path: Option<String>,
    category: Option<String>,
    chat_questions: Option<Vec<String>>,
    check_trust: Option<bool>,
    mode: Option<AppMode>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 按 默认值 < 配置文件 < 环境变量 的顺序加载
    ///
    /// 配置文件路径取自 `CONSENT_IQ_CONFIG`，未设置时跳过
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("CONSENT_IQ_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 仅从环境变量加载（在默认值之上）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载，文件中缺失的字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::File(FileError::TomlParseFailed { source, .. }) => {
                AppError::File(FileError::TomlParseFailed {
                    path: path.display().to_string(),
                    source,
                })
            }
            other => other,
        })
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            user_id: file.user_id.unwrap_or(default.user_id),
            wallet: file.wallet.unwrap_or(default.wallet),
            document_path: file.document_path.or(default.document_path),
            category: file.category.or(default.category),
            chat_questions: file.chat_questions.unwrap_or(default.chat_questions),
            check_trust: file.check_trust.unwrap_or(default.check_trust),
            mode: file.mode.unwrap_or(default.mode),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
        })
    }

    fn with_env_overrides(self) -> Self {
        let env = |name: &str| std::env::var(name).ok();
        Self {
            api_base_url: env("API_BASE_URL").unwrap_or(self.api_base_url),
            user_id: env("USER_ID").unwrap_or(self.user_id),
            wallet: env("WALLET").unwrap_or(self.wallet),
            document_path: env("DOCUMENT_PATH").or(self.document_path),
            category: env("DOCUMENT_CATEGORY").or(self.category),
            chat_questions: env("CHAT_QUESTIONS")
                .map(|v| split_questions(&v))
                .unwrap_or(self.chat_questions),
            check_trust: env("CHECK_TRUST")
                .and_then(|v| parse_or_warn("CHECK_TRUST", &v, |s| s.trim().parse().ok()))
                .unwrap_or(self.check_trust),
            mode: env("APP_MODE")
                .and_then(|v| parse_or_warn("APP_MODE", &v, AppMode::parse))
                .unwrap_or(self.mode),
            verbose_logging: env("VERBOSE_LOGGING")
                .and_then(|v| parse_or_warn("VERBOSE_LOGGING", &v, |s| s.trim().parse().ok()))
                .unwrap_or(self.verbose_logging),
            output_log_file: env("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        }
    }

    /// 校验配置，目前只检查后端地址
    pub fn validate(&self) -> AppResult<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "api_base_url".to_string(),
                value: self.api_base_url.clone(),
            }));
        }
        Ok(())
    }
}

/// 解析环境变量，无法识别时记录警告并沿用原值
fn parse_or_warn<T>(name: &str, raw: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(raw);
    if parsed.is_none() {
        warn!("⚠️ 环境变量 {} 的值 '{}' 无法识别，使用默认值", name, raw);
    }
    parsed
}

/// `CHAT_QUESTIONS` 以 `|` 分隔，空白项被忽略
fn split_questions(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}
