//! # lingo-algo - 间隔重复核心算法库
//!
//! 本 crate 提供纯 Rust 实现的复习调度算法:
//!
//! - **SM-2 Scheduler** - 根据答题质量计算下一次复习时间
//! - **Mastery Classifier** - new / learning / mastered 掌握程度分类
//! - **Review Prioritizer** - 按逾期天数与难度对到期项目排序
//! - **Learning Stats** - 等级与连续学习天数
//!
//! 所有函数都是纯函数: 当前时间由调用方传入, 无 I/O, 无随机数.
//!
//! ## 模块结构
//!
//! - [`sm2`] - SM-2 调度 (间隔、容易因子)
//! - [`mastery`] - 掌握程度分类与百分比
//! - [`priority`] - 复习优先级排序
//! - [`quality`] - 答题表现到质量评分的转换
//! - [`stats`] - 用户等级与连续天数
//! - [`sanitize`] - 数据校验 (持久化前的范围检查)
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use lingo_algo::{schedule, ItemKind, ItemProgress, MasteryLevel, Quality};
//!
//! let now = Utc::now();
//! let item = ItemProgress::new("user-1", "apple", ItemKind::Word, now);
//! let next = schedule(&item, Quality::new(5).unwrap(), now);
//!
//! assert_eq!(next.repetitions, 1);
//! assert_eq!(next.interval_days, 1);
//! assert_eq!(next.mastery_level, MasteryLevel::Learning);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod mastery;
pub mod priority;
pub mod quality;
pub mod sanitize;
pub mod sm2;
pub mod stats;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

pub use mastery::{classify, mastery_percent, MasteryDistribution};
pub use priority::{days_overdue, prioritize, priority_score};
pub use quality::Confidence;
pub use sm2::{next_easiness, schedule};
pub use stats::{apply_study_event, level_for, next_streak, StudyEvent};

/// Errors raised by the pure engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgoError {
    #[error("quality must be an integer between 0 and 5, got {0}")]
    InvalidQuality(i64),
    #[error("{0}")]
    InvalidRecord(String),
}
