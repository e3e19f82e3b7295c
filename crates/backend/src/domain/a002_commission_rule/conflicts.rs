use contracts::domain::a002_commission_rule::aggregate::{CommissionRule, RuleState};
use contracts::domain::a002_commission_rule::dto::{ConflictKind, RuleConflict};

/// Пересекаются ли области действия двух правил (тип, поддерево, период)
fn scopes_overlap(a: &CommissionRule, b: &CommissionRule) -> bool {
    let types = match (a.category_type, b.category_type) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    };
    let paths = match (a.category_path.as_deref(), b.category_path.as_deref()) {
        (Some(x), Some(y)) => {
            x == y || x.starts_with(&format!("{}.", y)) || y.starts_with(&format!("{}.", x))
        }
        _ => true,
    };
    let periods = a.valid_from.zip(b.valid_to).map_or(true, |(from, to)| from <= to)
        && b.valid_from.zip(a.valid_to).map_or(true, |(from, to)| from <= to);
    types && paths && periods
}

fn normalized_formula(formula: &str) -> String {
    formula
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Конфликты между правилами одной команды. Архивные правила не учитываются.
pub fn detect_conflicts(rules: &[CommissionRule]) -> Vec<RuleConflict> {
    let live: Vec<&CommissionRule> = rules
        .iter()
        .filter(|r| r.state != RuleState::Archived)
        .collect();

    let mut conflicts = Vec::new();
    for (i, a) in live.iter().enumerate() {
        for b in &live[i + 1..] {
            if a.team_id != b.team_id || !scopes_overlap(a, b) {
                continue;
            }
            if a.priority == b.priority {
                conflicts.push(RuleConflict {
                    rule_a: a.to_string_id(),
                    rule_b: b.to_string_id(),
                    kind: ConflictKind::SamePriority,
                    message: format!(
                        "'{}' and '{}' overlap and share priority {}",
                        a.name, b.name, a.priority
                    ),
                });
            }
            if normalized_formula(&a.formula) == normalized_formula(&b.formula) {
                conflicts.push(RuleConflict {
                    rule_a: a.to_string_id(),
                    rule_b: b.to_string_id(),
                    kind: ConflictKind::DuplicateFormula,
                    message: format!("'{}' and '{}' use the same formula", a.name, b.name),
                });
            }
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contracts::domain::a001_category::aggregate::CategoryType;
    use contracts::domain::a002_commission_rule::dto::CommissionRuleDto;

    fn rule(name: &str, priority: i32, formula: &str, path: Option<&str>) -> CommissionRule {
        CommissionRule::new_for_insert(&CommissionRuleDto {
            team_id: "team-1".into(),
            name: name.into(),
            formula: formula.into(),
            priority: Some(priority),
            category_type: Some(CategoryType::Consumer),
            category_path: path.map(String::from),
            ..Default::default()
        })
    }

    #[test]
    fn same_priority_in_nested_scope() {
        let rules = vec![
            rule("Base", 10, "amount * 0.1", Some("aaaa")),
            rule("Shoes", 10, "amount * 0.2", Some("aaaa.bbbb")),
            rule("Books", 10, "amount * 0.3", Some("cccc")),
        ];
        let conflicts = detect_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::SamePriority);
        assert_eq!(conflicts[0].rule_a, rules[0].to_string_id());
        assert_eq!(conflicts[0].rule_b, rules[1].to_string_id());
    }

    #[test]
    fn duplicate_formula_ignores_spacing_and_case() {
        let rules = vec![
            rule("A", 1, "MAX(5, amount*0.1)", None),
            rule("B", 2, "max(5, amount * 0.1)", Some("aaaa")),
        ];
        let conflicts = detect_conflicts(&rules);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::DuplicateFormula);
    }

    #[test]
    fn archived_other_team_and_disjoint_periods_are_ignored() {
        let mut archived = rule("Archived", 5, "amount", None);
        archived.state = RuleState::Archived;
        let mut other_team = rule("Other", 5, "amount", None);
        other_team.team_id = "team-2".into();

        let mut january = rule("January", 5, "amount", None);
        january.valid_from = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        january.valid_to = Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap());
        let mut march = rule("March", 5, "amount", None);
        march.valid_from = Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        assert!(detect_conflicts(&[archived.clone(), january.clone()]).is_empty());
        assert!(detect_conflicts(&[other_team, january.clone()]).is_empty());
        assert!(detect_conflicts(&[january, march]).is_empty());
    }

    #[test]
    fn different_category_types_do_not_overlap() {
        let a = rule("A", 5, "amount", None);
        let mut b = rule("B", 5, "amount", None);
        b.category_type = Some(CategoryType::Brand);
        assert!(detect_conflicts(&[a, b]).is_empty());
    }
}
