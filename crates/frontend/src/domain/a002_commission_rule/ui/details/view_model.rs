use super::super::super::api;
use crate::shared::date_utils::{from_date_input, to_date_input};
use crate::shared::logger::log_client;
use crate::shared::toast::ToastService;
use contracts::domain::a001_category::CategoryType;
use contracts::domain::a002_commission_rule::{
    CommissionRule, CommissionRuleDto, FormulaTestResponse, FormulaValidationResponse, RuleState,
    FORMULA_VARIABLES,
};
use leptos::prelude::*;
use std::collections::HashMap;
use wasm_bindgen_futures::spawn_local;

/// Поля формы правила в том виде, в каком их редактирует пользователь
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleForm {
    pub team_id: String,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub priority: String,
    pub category_type: String,
    pub category_path: String,
    pub valid_from: String,
    pub valid_to: String,
}

impl RuleForm {
    pub fn from_rule(rule: &CommissionRule) -> Self {
        Self {
            team_id: rule.team_id.clone(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            formula: rule.formula.clone(),
            priority: rule.priority.to_string(),
            category_type: rule.category_type.map(|t| t.as_str().to_string()).unwrap_or_default(),
            category_path: rule.category_path.clone().unwrap_or_default(),
            valid_from: to_date_input(rule.valid_from.as_ref()),
            valid_to: to_date_input(rule.valid_to.as_ref()),
        }
    }

    /// Разбор формы в DTO; первая найденная ошибка возвращается текстом
    pub fn to_dto(&self) -> Result<CommissionRuleDto, String> {
        if self.team_id.trim().is_empty() {
            return Err("Team is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if self.formula.trim().is_empty() {
            return Err("Formula is required".to_string());
        }
        let priority = match self.priority.trim() {
            "" => None,
            p => Some(
                p.parse::<i32>()
                    .map_err(|_| format!("Priority must be a whole number, got \"{}\"", p))?,
            ),
        };
        let category_type = match self.category_type.trim() {
            "" => None,
            t => Some(CategoryType::parse(t).ok_or_else(|| format!("Unknown category type \"{}\"", t))?),
        };
        let category_path = Some(self.category_path.trim().to_string()).filter(|p| !p.is_empty());
        if category_path.is_some() && category_type.is_none() {
            return Err("Choose a category type for the category path".to_string());
        }
        let valid_from = from_date_input(&self.valid_from, false)?;
        let valid_to = from_date_input(&self.valid_to, true)?;
        if let (Some(from), Some(to)) = (valid_from, valid_to) {
            if from > to {
                return Err("Valid from must not be after valid to".to_string());
            }
        }
        Ok(CommissionRuleDto {
            team_id: self.team_id.trim().to_string(),
            name: self.name.trim().to_string(),
            description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
            formula: self.formula.trim().to_string(),
            priority,
            category_type,
            category_path,
            valid_from,
            valid_to,
        })
    }
}

/// Значения для тестового прогона формулы. Пустые поля не передаются,
/// чтобы сервер сообщил о недостающих переменных.
pub fn parse_test_values(inputs: &HashMap<String, String>) -> Result<HashMap<String, f64>, String> {
    let mut values = HashMap::new();
    for (name, raw) in inputs {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = raw
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| format!("Value of {} is not a number", name))?;
        values.insert(name.clone(), value);
    }
    Ok(values)
}

/// Состояния, в которые правило может перейти из текущего
pub fn next_states(current: RuleState) -> Vec<RuleState> {
    RuleState::ALL
        .into_iter()
        .filter(|s| current.can_transition_to(*s))
        .collect()
}

#[derive(Clone, Copy)]
pub struct RuleDetailsVm {
    pub id: RwSignal<Option<String>>,
    pub rule: RwSignal<Option<CommissionRule>>,
    pub form: RwSignal<RuleForm>,
    /// Форма в момент загрузки или последнего сохранения
    pub baseline: RwSignal<RuleForm>,
    pub error: RwSignal<Option<String>>,
    pub busy: RwSignal<bool>,
    pub validation: RwSignal<Option<FormulaValidationResponse>>,
    pub test_inputs: RwSignal<HashMap<String, String>>,
    pub test_result: RwSignal<Option<FormulaTestResponse>>,
    toasts: ToastService,
}

impl RuleDetailsVm {
    pub fn new(id: Option<String>, toasts: ToastService) -> Self {
        let test_inputs = FORMULA_VARIABLES
            .iter()
            .map(|(name, _)| (name.to_string(), String::new()))
            .collect();
        Self {
            id: RwSignal::new(id),
            rule: RwSignal::new(None),
            form: RwSignal::new(RuleForm {
                priority: "0".to_string(),
                ..Default::default()
            }),
            baseline: RwSignal::new(RuleForm::default()),
            error: RwSignal::new(None),
            busy: RwSignal::new(false),
            validation: RwSignal::new(None),
            test_inputs: RwSignal::new(test_inputs),
            test_result: RwSignal::new(None),
            toasts,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.with(|id| id.is_none())
    }

    pub fn is_dirty(&self) -> bool {
        self.form.with(|f| self.baseline.with(|b| f != b))
    }

    pub fn load(&self) {
        let Some(id) = self.id.get_untracked() else {
            self.baseline.set(self.form.get_untracked());
            return;
        };
        let vm = *self;
        vm.busy.set(true);
        spawn_local(async move {
            match api::fetch_by_id(&id).await {
                Ok(rule) => vm.accept(rule),
                Err(e) => vm.error.set(Some(format!("Failed to load rule: {}", e))),
            }
            vm.busy.set(false);
        });
    }

    fn accept(&self, rule: CommissionRule) {
        let form = RuleForm::from_rule(&rule);
        self.id.set(Some(rule.to_string_id()));
        self.form.set(form.clone());
        self.baseline.set(form);
        self.rule.set(Some(rule));
        self.error.set(None);
    }

    /// Сохраняет форму; `on_saved` получает сохранённое правило
    pub fn save(&self, on_saved: Callback<CommissionRule>) {
        let dto = match self.form.with_untracked(|f| f.to_dto()) {
            Ok(dto) => dto,
            Err(e) => {
                self.error.set(Some(e));
                return;
            }
        };
        let vm = *self;
        let id = self.id.get_untracked();
        vm.busy.set(true);
        spawn_local(async move {
            let result = match &id {
                Some(id) => api::update(id, &dto).await,
                None => api::create(&dto).await,
            };
            match result {
                Ok(rule) => {
                    vm.toasts.success(format!("Saved \"{}\"", rule.name));
                    log_client("commission_rule", format!("saved rule {}", rule.to_string_id()));
                    vm.accept(rule.clone());
                    on_saved.run(rule);
                }
                Err(e) => vm.error.set(Some(e)),
            }
            vm.busy.set(false);
        });
    }

    pub fn change_state(&self, next: RuleState) {
        let Some(id) = self.id.get_untracked() else {
            return;
        };
        let vm = *self;
        vm.busy.set(true);
        spawn_local(async move {
            match api::update_state(&id, next).await {
                Ok(rule) => {
                    vm.toasts.info(format!("Rule is now {}", rule.state.label()));
                    vm.rule.set(Some(rule));
                }
                Err(e) => vm.toasts.error(format!("State change failed: {}", e)),
            }
            vm.busy.set(false);
        });
    }

    pub fn delete(&self, on_deleted: Callback<()>) {
        let Some(id) = self.id.get_untracked() else {
            on_deleted.run(());
            return;
        };
        let vm = *self;
        spawn_local(async move {
            match api::remove(&id).await {
                Ok(()) => {
                    vm.toasts.success("Rule deleted");
                    log_client("commission_rule", format!("deleted rule {}", id));
                    on_deleted.run(());
                }
                Err(e) => vm.toasts.error(format!("Delete failed: {}", e)),
            }
        });
    }

    pub fn validate_formula(&self) {
        let formula = self.form.with_untracked(|f| f.formula.clone());
        let vm = *self;
        spawn_local(async move {
            match api::validate_formula(&formula).await {
                Ok(response) => vm.validation.set(Some(response)),
                Err(e) => vm.toasts.error(format!("Validation failed: {}", e)),
            }
        });
    }

    pub fn test_formula(&self) {
        let values = match self.test_inputs.with_untracked(parse_test_values) {
            Ok(values) => values,
            Err(e) => {
                self.test_result.set(Some(FormulaTestResponse {
                    result: None,
                    error: Some(e),
                }));
                return;
            }
        };
        let formula = self.form.with_untracked(|f| f.formula.clone());
        let vm = *self;
        spawn_local(async move {
            match api::test_formula(&formula, values).await {
                Ok(response) => vm.test_result.set(Some(response)),
                Err(e) => vm.toasts.error(format!("Test failed: {}", e)),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RuleForm {
        RuleForm {
            team_id: "team-1".to_string(),
            name: " Base fee ".to_string(),
            formula: "amount * 0.1".to_string(),
            priority: "10".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn form_converts_to_dto() {
        let dto = filled().to_dto().unwrap();
        assert_eq!(dto.name, "Base fee");
        assert_eq!(dto.priority, Some(10));
        assert_eq!(dto.description, None);
        assert_eq!(dto.category_type, None);
    }

    #[test]
    fn form_rejects_bad_input() {
        let mut form = filled();
        form.priority = "high".to_string();
        assert!(form.to_dto().unwrap_err().contains("Priority"));

        let mut form = filled();
        form.category_path = "shoes".to_string();
        assert!(form.to_dto().is_err());

        form.category_type = "brand".to_string();
        assert_eq!(form.to_dto().unwrap().category_path.as_deref(), Some("shoes"));

        let mut form = filled();
        form.valid_from = "2024-05-01".to_string();
        form.valid_to = "2024-04-01".to_string();
        assert!(form.to_dto().is_err());
    }

    #[test]
    fn form_round_trips_through_rule() {
        let dto = filled().to_dto().unwrap();
        let rule = CommissionRule::new_for_insert(&dto);
        let form = RuleForm::from_rule(&rule);
        assert_eq!(form.name, "Base fee");
        assert_eq!(form.to_dto().unwrap(), dto);
    }

    #[test]
    fn test_values_skip_blanks_and_accept_commas() {
        let mut inputs = HashMap::new();
        inputs.insert("price".to_string(), "12,5".to_string());
        inputs.insert("quantity".to_string(), " ".to_string());
        let values = parse_test_values(&inputs).unwrap();
        assert_eq!(values.get("price"), Some(&12.5));
        assert!(!values.contains_key("quantity"));

        inputs.insert("cost".to_string(), "abc".to_string());
        assert!(parse_test_values(&inputs).is_err());
    }

    #[test]
    fn archived_rules_only_return_to_draft() {
        assert_eq!(next_states(RuleState::Archived), vec![RuleState::Draft]);
        assert_eq!(
            next_states(RuleState::Draft),
            vec![RuleState::Active, RuleState::Archived]
        );
    }
}
