//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{AnalysisResult, TrustResult};

/// 初始化 tracing 日志
///
/// 设置了 `RUST_LOG` 时以它为准，否则使用 `info`（详细模式下为 `debug`）。
/// 重复初始化会被忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(api_base_url: &str, mode: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 文档分析助手");
    info!("🌐 后端地址: {}", api_base_url);
    info!("📋 运行模式: {}", mode);
    info!("{}", "=".repeat(60));
}

/// 记录流程阶段
pub fn log_stage(title: &str) {
    info!("\n{}", "─".repeat(60));
    info!("▶ {}", title);
    info!("{}", "─".repeat(60));
}

/// 输出分析结果
pub fn log_analysis(analysis: &AnalysisResult) {
    info!("📝 摘要: {}", truncate_text(&analysis.summary, 200));
    for risk in &analysis.flags.risks {
        info!("  ⚠️ 风险: {}", risk);
    }
    for right in &analysis.flags.rights {
        info!("  ✅ 权利: {}", right);
    }
    for responsibility in &analysis.flags.responsibilities {
        info!("  📌 责任: {}", responsibility);
    }
}

/// 输出可信度结果
pub fn log_trust(trust: &TrustResult) {
    info!(
        "🛡️ 可信度: {:.0}% | 已验证: {} | 机构: {}",
        trust.display_score(),
        if trust.verified { "是" } else { "否" },
        trust.organization
    );
}

/// 打印会话统计
pub fn print_session_summary(succeeded: usize, failed: usize, report_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 会话结束");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功步骤: {}", succeeded);
    info!("❌ 失败步骤: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
