use super::Category;
use accesslog_config::CriteriaConfig;
use accesslog_core::{OpKind, Operation, ResultCode};

/// One set of record criteria. Every criterion that is set must match; the
/// response criteria (result code, etime, entry count) are ignored when a
/// request is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaFilter {
    record_types: Vec<OpKind>,
    connection_ids: Vec<i64>,
    /// Lower-cased
    target_dn_suffixes: Vec<String>,
    result_codes: Vec<ResultCode>,
    etime_greater_than: Option<i64>,
    etime_less_than: Option<i64>,
    search_nentries_greater_than: Option<u64>,
}

impl From<&CriteriaConfig> for CriteriaFilter {
    fn from(config: &CriteriaConfig) -> Self {
        Self {
            record_types: config.record_types.clone(),
            connection_ids: config.connection_ids.clone(),
            target_dn_suffixes: config
                .target_dn_suffixes
                .iter()
                .map(|s| normalize_dn(s))
                .collect(),
            result_codes: config.result_codes.clone(),
            etime_greater_than: config.etime_greater_than,
            etime_less_than: config.etime_less_than,
            search_nentries_greater_than: config.search_nentries_greater_than,
        }
    }
}

impl CriteriaFilter {
    pub fn matches(&self, operation: &Operation, category: Category) -> bool {
        if !self.record_types.is_empty() && !self.record_types.contains(&operation.op_kind()) {
            return false;
        }
        if !self.connection_ids.is_empty()
            && !self.connection_ids.contains(&operation.connection_id())
        {
            return false;
        }
        if !self.target_dn_suffixes.is_empty() && !self.matches_target_dn(operation) {
            return false;
        }
        match category {
            Category::Request => true,
            Category::Response => self.matches_response(operation),
        }
    }

    fn matches_target_dn(&self, operation: &Operation) -> bool {
        let Some(dn) = operation.target_dn() else {
            return false;
        };
        let dn = normalize_dn(dn);
        self.target_dn_suffixes
            .iter()
            .any(|suffix| is_dn_suffix(&dn, suffix))
    }

    fn matches_response(&self, operation: &Operation) -> bool {
        if !self.result_codes.is_empty() && !self.result_codes.contains(&operation.result_code()) {
            return false;
        }
        let etime = operation.elapsed_time();
        if self.etime_greater_than.is_some_and(|limit| etime <= limit) {
            return false;
        }
        if self.etime_less_than.is_some_and(|limit| etime >= limit) {
            return false;
        }
        if let Some(limit) = self.search_nentries_greater_than {
            return operation.entries_sent().is_some_and(|n| n > limit);
        }
        true
    }
}

/// Lower-case and drop the spaces around RDN separators
fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(",")
        .to_lowercase()
}

/// `suffix` is `dn` itself or a whole-RDN tail of it
fn is_dn_suffix(dn: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }
    dn == suffix
        || dn
            .strip_suffix(suffix)
            .is_some_and(|head| head.ends_with(','))
}
