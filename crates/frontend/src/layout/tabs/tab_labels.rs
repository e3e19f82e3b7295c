//! Tab labels - единственный источник правды для заголовков табов.

use contracts::domain::a001_category::Category;
use contracts::domain::a002_commission_rule::aggregate::CommissionRule;
use contracts::domain::common::AggregateRoot;

pub const RULE_DETAIL_PREFIX: &str = "a002_commission_rule_detail_";

/// Возвращает читаемый заголовок таба для данного ключа. Fallback: "Page".
pub fn tab_label_for_key(key: &str) -> &'static str {
    match key {
        "a001_category" => Category::list_name(),
        "a002_commission_rule" => CommissionRule::list_name(),
        "a002_commission_rule_conflicts" => "Rule Conflicts",
        "sys_logs" => "Logs",
        k if k.starts_with(RULE_DETAIL_PREFIX) => CommissionRule::element_name(),
        _ => "Page",
    }
}

/// Заголовок detail-таба: "<сущность>: <идентификатор>"
pub fn detail_tab_label(entity_label: &'static str, identifier: &str) -> String {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        format!("{}: new", entity_label)
    } else {
        format!("{}: {}", entity_label, identifier)
    }
}

/// Ключ detail-таба правила; `None` открывает форму нового правила
pub fn rule_detail_key(id: Option<&str>) -> String {
    format!("{}{}", RULE_DETAIL_PREFIX, id.unwrap_or("new"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_for_known_keys() {
        assert_eq!(tab_label_for_key("a001_category"), "Categories");
        assert_eq!(tab_label_for_key("sys_logs"), "Logs");
        assert_eq!(tab_label_for_key("unknown"), "Page");
        assert_eq!(
            tab_label_for_key(&rule_detail_key(Some("42"))),
            CommissionRule::element_name()
        );
    }

    #[test]
    fn detail_labels() {
        assert_eq!(detail_tab_label("Rule", "  "), "Rule: new");
        assert_eq!(detail_tab_label("Rule", "Base fee"), "Rule: Base fee");
        assert_eq!(rule_detail_key(None), "a002_commission_rule_detail_new");
    }
}
