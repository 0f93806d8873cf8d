//! 键模式展开
//!
//! 模板中必须恰好包含一个 `{}` 占位符，每个替换值生成一个具体键，重复键只保留一次。

use std::collections::HashSet;
use std::fmt::Display;

use crate::error::{LockError, Result};

/// 占位符
pub const PLACEHOLDER: &str = "{}";

/// 解析后的键模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    prefix: String,
    suffix: String,
}

impl KeyPattern {
    pub fn parse(template: &str) -> Result<Self> {
        let occurrences = template.matches(PLACEHOLDER).count();
        if occurrences != 1 {
            return Err(LockError::InvalidPattern(format!(
                "template {template:?} must contain exactly one \"{PLACEHOLDER}\", found {occurrences}"
            )));
        }

        let (prefix, suffix) = template
            .split_once(PLACEHOLDER)
            .ok_or_else(|| LockError::InvalidPattern(template.to_string()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// 生成单个具体键
    pub fn key_for(&self, value: impl Display) -> String {
        format!("{}{}{}", self.prefix, value, self.suffix)
    }

    /// 按输入顺序展开并去重
    pub fn expand<V: Display>(&self, values: &[V]) -> Vec<String> {
        let mut seen = HashSet::with_capacity(values.len());
        values
            .iter()
            .map(|value| self.key_for(value))
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }
}
