use std::fmt;

/// 远程操作的统一失败形态
///
/// `status` 只在失败来自带状态码的 HTTP 响应时存在，网络层失败没有 `status`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct OperationError {
    pub message: String,
    pub status: Option<u16>,
}

impl OperationError {
    /// 没有收到响应（离线、DNS、超时等）
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// 收到了非成功状态码的响应
    pub fn response(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.status.is_none()
    }
}

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// API 客户端错误
    Api(ApiError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 远程操作失败
    Operation(OperationError),
    /// 其他错误
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Operation(e) => match e.status {
                Some(status) => write!(f, "操作失败 (HTTP {}): {}", status, e.message),
                None => write!(f, "操作失败: {}", e.message),
            },
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Api(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Operation(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// API 客户端错误
#[derive(Debug)]
pub enum ApiError {
    /// 构建 HTTP 客户端失败
    ClientBuildFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端地址无效
    InvalidBaseUrl { url: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ClientBuildFailed { source } => {
                write!(f, "构建 HTTP 客户端失败: {}", source)
            }
            ApiError::InvalidBaseUrl { url } => write!(f, "无效的后端地址: {}", url),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::ClientBuildFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            ApiError::InvalidBaseUrl { .. } => None,
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 文件为空
    Empty { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::Empty { path } => write!(f, "文件为空: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 字段取值无效
    InvalidValue { field: String, value: String },
    /// 分类名称不在可选范围内
    UnknownCategory { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, value } => {
                write!(f, "配置项 {} 的值 '{}' 无效", field, value)
            }
            ConfigError::UnknownCategory { value } => {
                write!(f, "未知的文档分类: {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========

impl From<OperationError> for AppError {
    fn from(err: OperationError) -> Self {
        AppError::Operation(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Api(ApiError::ClientBuildFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
