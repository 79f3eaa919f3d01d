//! 医生搜索过滤
//!
//! 大小写不敏感的子串匹配：姓、名、专科、城市、诊所名任一字段
//! 命中即保留。结果保持原始顺序，不做排序或加权。

use crate::provider::Provider;
use crate::seed::seed_providers;
use clinic_core::{ClinicError, Result};
use tracing::debug;

/// 按查询词过滤医生列表
///
/// 空白查询返回完整列表（对应"尚未输入任何搜索词"的行为）。
pub fn search_providers(query: &str, providers: &[Provider]) -> Vec<Provider> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return providers.to_vec();
    }

    providers
        .iter()
        .filter(|p| {
            p.first_name.to_lowercase().contains(&needle)
                || p.last_name.to_lowercase().contains(&needle)
                || p.specialty.to_lowercase().contains(&needle)
                || p.city.to_lowercase().contains(&needle)
                || p.practice_name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// 医生目录服务
#[derive(Debug, Clone)]
pub struct DirectoryService {
    providers: Vec<Provider>,
}

impl DirectoryService {
    /// 使用内置种子数据创建目录
    pub fn new() -> Self {
        Self {
            providers: seed_providers(),
        }
    }

    /// 使用给定记录创建目录
    pub fn with_providers(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    /// 搜索医生
    pub fn search(&self, query: &str) -> Vec<Provider> {
        let results = search_providers(query, &self.providers);
        debug!("Provider search '{}' matched {} of {}", query, results.len(), self.providers.len());
        results
    }

    /// 按标识符查询单个医生
    pub fn get(&self, provider_id: &str) -> Result<&Provider> {
        self.providers
            .iter()
            .find(|p| p.provider_id == provider_id)
            .ok_or_else(|| ClinicError::NotFound(format!("Provider {} not found", provider_id)))
    }

    /// 目录中的全部医生
    pub fn all(&self) -> &[Provider] {
        &self.providers
    }
}

impl Default for DirectoryService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_chen_matches_names_case_insensitively() {
        let directory = DirectoryService::new();
        let results = directory.search("chen");

        // "Emily Chen" 与 "Robert Chenoweth" 命中，"Marcus Patel" 不命中
        assert!(results.iter().any(|p| p.full_name() == "Emily Chen"));
        assert!(results.iter().any(|p| p.last_name == "Chenoweth"));
        assert!(!results.iter().any(|p| p.last_name == "Patel"));
        for p in &results {
            let name = p.full_name().to_lowercase();
            assert!(name.contains("chen"));
        }
    }

    #[test]
    fn test_search_matches_specialty_city_and_practice() {
        let directory = DirectoryService::new();

        assert!(!directory.search("cardiology").is_empty());
        assert!(!directory.search("OAKLAND").is_empty());
        assert!(!directory.search("skin clinic").is_empty());
    }

    #[test]
    fn test_empty_query_returns_full_set() {
        let directory = DirectoryService::new();
        assert_eq!(directory.search("").len(), directory.all().len());
        assert_eq!(directory.search("   ").len(), directory.all().len());
    }

    #[test]
    fn test_no_match_returns_empty() {
        let directory = DirectoryService::new();
        assert!(directory.search("zzzzzz").is_empty());
    }

    #[test]
    fn test_result_order_preserved() {
        let directory = DirectoryService::new();
        let results = directory.search("ca");
        let ids: Vec<&str> = results.iter().map(|p| p.provider_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        // 种子数据按标识符升序排列，因此保持原序时两者一致
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_get_provider_by_id() {
        let directory = DirectoryService::new();
        assert_eq!(directory.get("PRV-001").unwrap().last_name, "Chen");
        assert!(matches!(
            directory.get("PRV-999"),
            Err(ClinicError::NotFound(_))
        ));
    }
}
