use chrono::{DateTime, Utc};
use contracts::domain::a001_category::aggregate::CategoryType;
use contracts::domain::a002_commission_rule::aggregate::{
    CommissionRule, CommissionRuleId, RuleState,
};
use contracts::domain::common::{AggregateId, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{EntityTrait, QueryFilter, QueryOrder, Set};

use crate::shared::data::db::get_connection;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_commission_rule")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub description: String,
    pub formula: String,
    pub priority: i32,
    pub state: String,
    pub category_type: Option<String>,
    pub category_path: Option<String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CommissionRule {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let id = CommissionRuleId::from_string(&m.id).map_err(|e| anyhow::anyhow!(e))?;
        let state = RuleState::parse(&m.state)
            .ok_or_else(|| anyhow::anyhow!("Unknown rule state '{}'", m.state))?;
        let category_type = match m.category_type.as_deref() {
            Some(value) => Some(
                CategoryType::parse(value)
                    .ok_or_else(|| anyhow::anyhow!("Unknown category type '{}'", value))?,
            ),
            None => None,
        };
        Ok(CommissionRule {
            id,
            team_id: m.team_id,
            name: m.name,
            description: m.description,
            formula: m.formula,
            priority: m.priority,
            state,
            category_type,
            category_path: m.category_path,
            valid_from: m.valid_from,
            valid_to: m.valid_to,
            metadata: EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                version: m.version,
            },
        })
    }
}

fn active_model(rule: &CommissionRule) -> ActiveModel {
    ActiveModel {
        id: Set(rule.to_string_id()),
        team_id: Set(rule.team_id.clone()),
        name: Set(rule.name.clone()),
        description: Set(rule.description.clone()),
        formula: Set(rule.formula.clone()),
        priority: Set(rule.priority),
        state: Set(rule.state.as_str().to_string()),
        category_type: Set(rule.category_type.map(|t| t.as_str().to_string())),
        category_path: Set(rule.category_path.clone()),
        valid_from: Set(rule.valid_from),
        valid_to: Set(rule.valid_to),
        created_at: Set(Some(rule.metadata.created_at)),
        updated_at: Set(Some(rule.metadata.updated_at)),
        version: Set(rule.metadata.version),
    }
}

pub async fn list_all() -> anyhow::Result<Vec<CommissionRule>> {
    Entity::find()
        .order_by_desc(Column::Priority)
        .order_by_asc(Column::Name)
        .all(get_connection())
        .await?
        .into_iter()
        .map(CommissionRule::try_from)
        .collect()
}

pub async fn list_by_team(team_id: &str) -> anyhow::Result<Vec<CommissionRule>> {
    Entity::find()
        .filter(Column::TeamId.eq(team_id))
        .order_by_desc(Column::Priority)
        .order_by_asc(Column::Name)
        .all(get_connection())
        .await?
        .into_iter()
        .map(CommissionRule::try_from)
        .collect()
}

pub async fn get_by_id(id: &str) -> anyhow::Result<Option<CommissionRule>> {
    Entity::find_by_id(id.to_string())
        .one(get_connection())
        .await?
        .map(CommissionRule::try_from)
        .transpose()
}

pub async fn insert(rule: &CommissionRule) -> anyhow::Result<()> {
    active_model(rule).insert(get_connection()).await?;
    Ok(())
}

pub async fn update(rule: &CommissionRule) -> anyhow::Result<()> {
    active_model(rule).update(get_connection()).await?;
    Ok(())
}

pub async fn delete(id: &str) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.to_string())
        .exec(get_connection())
        .await?;
    Ok(result.rows_affected > 0)
}
