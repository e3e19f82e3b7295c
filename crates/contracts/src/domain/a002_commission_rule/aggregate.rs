use super::dto::CommissionRuleDto;
use crate::domain::a001_category::aggregate::CategoryType;
use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommissionRuleId(pub Uuid);

impl CommissionRuleId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for CommissionRuleId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s)
            .map(CommissionRuleId)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// State
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleState {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl RuleState {
    pub const ALL: [RuleState; 4] = [
        RuleState::Draft,
        RuleState::Active,
        RuleState::Paused,
        RuleState::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleState::Draft => "draft",
            RuleState::Active => "active",
            RuleState::Paused => "paused",
            RuleState::Archived => "archived",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RuleState::Draft => "Draft",
            RuleState::Active => "Active",
            RuleState::Paused => "Paused",
            RuleState::Archived => "Archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value.trim())
    }

    /// Допустимые переходы состояния правила
    pub fn can_transition_to(&self, next: RuleState) -> bool {
        use RuleState::*;
        matches!(
            (self, next),
            (Draft, Active)
                | (Draft, Archived)
                | (Active, Paused)
                | (Active, Archived)
                | (Paused, Active)
                | (Paused, Archived)
                | (Archived, Draft)
        )
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: CommissionRuleId,
    pub team_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Выражение комиссии, см. `FORMULA_VARIABLES`
    pub formula: String,
    /// Чем больше, тем раньше применяется правило
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub state: RuleState,
    /// `None` - правило действует для всех типов категорий
    #[serde(default)]
    pub category_type: Option<CategoryType>,
    /// `None` - для всех категорий; иначе путь и его поддерево
    #[serde(default)]
    pub category_path: Option<String>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

impl CommissionRule {
    pub fn new_for_insert(dto: &CommissionRuleDto) -> Self {
        let mut rule = Self {
            id: CommissionRuleId::new_v4(),
            team_id: String::new(),
            name: String::new(),
            description: String::new(),
            formula: String::new(),
            priority: 0,
            state: RuleState::Draft,
            category_type: None,
            category_path: None,
            valid_from: None,
            valid_to: None,
            metadata: EntityMetadata::new(),
        };
        rule.apply(dto);
        rule
    }

    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }

    /// Обновление редактируемых полей. Состояние меняется только через
    /// `RuleStateUpdate`.
    pub fn update(&mut self, dto: &CommissionRuleDto) {
        self.apply(dto);
        self.metadata.touch();
    }

    fn apply(&mut self, dto: &CommissionRuleDto) {
        self.team_id = dto.team_id.trim().to_string();
        self.name = dto.name.trim().to_string();
        self.description = dto.description.clone().unwrap_or_default();
        self.formula = dto.formula.trim().to_string();
        self.priority = dto.priority.unwrap_or(0);
        self.category_type = dto.category_type;
        self.category_path = dto
            .category_path
            .as_ref()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self.valid_from = dto.valid_from;
        self.valid_to = dto.valid_to;
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.team_id.is_empty() {
            return Err("Team is required".into());
        }
        if self.name.is_empty() {
            return Err("Name is required".into());
        }
        if self.formula.is_empty() {
            return Err("Formula is required".into());
        }
        if let (Some(from), Some(to)) = (self.valid_from, self.valid_to) {
            if from > to {
                return Err("Valid-from date must not be after valid-to date".into());
            }
        }
        if self.category_path.is_some() && self.category_type.is_none() {
            return Err("A category path needs a category type".into());
        }
        Ok(())
    }

    /// Действует ли правило в момент `at`
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        self.state == RuleState::Active
            && self.valid_from.map_or(true, |from| from <= at)
            && self.valid_to.map_or(true, |to| at <= to)
    }
}

impl AggregateRoot for CommissionRule {
    type Id = CommissionRuleId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn description(&self) -> &str {
        &self.name
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "commission_rule"
    }

    fn element_name() -> &'static str {
        "Commission rule"
    }

    fn list_name() -> &'static str {
        "Commission rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dto() -> CommissionRuleDto {
        CommissionRuleDto {
            team_id: " team-1 ".into(),
            name: "Base".into(),
            formula: "price * 0.1".into(),
            category_path: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn new_rule_is_normalized_draft() {
        let rule = CommissionRule::new_for_insert(&dto());
        assert_eq!(rule.state, RuleState::Draft);
        assert_eq!(rule.team_id, "team-1");
        assert_eq!(rule.category_path, None);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn validation_errors() {
        let mut rule = CommissionRule::new_for_insert(&dto());
        rule.valid_from = Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        rule.valid_to = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(rule.validate().is_err());

        let mut no_type = CommissionRule::new_for_insert(&dto());
        no_type.category_path = Some("a".into());
        assert!(no_type.validate().is_err());
    }

    #[test]
    fn state_transitions() {
        assert!(RuleState::Draft.can_transition_to(RuleState::Active));
        assert!(RuleState::Paused.can_transition_to(RuleState::Active));
        assert!(!RuleState::Archived.can_transition_to(RuleState::Active));
        assert!(!RuleState::Draft.can_transition_to(RuleState::Paused));
        assert_eq!(RuleState::parse("paused"), Some(RuleState::Paused));
    }

    #[test]
    fn effective_window() {
        let mut rule = CommissionRule::new_for_insert(&dto());
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        assert!(!rule.is_effective_at(at));
        rule.state = RuleState::Active;
        assert!(rule.is_effective_at(at));
        rule.valid_to = Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap());
        assert!(!rule.is_effective_at(at));
    }
}
