//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **AppBuilder**: config の検証と store / scheduler / janitor のワイヤリング
//! - **App**: request 層から見た入口（repository 解決, submit, shutdown）
//! - **JanitorLoop**: idle partition の回収

pub mod builder;
pub mod janitor_loop;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::janitor_loop::JanitorLoop;
