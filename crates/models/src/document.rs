use sea_orm::{entity::prelude::*, Set, DatabaseConnection, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Longest doctype or record name accepted by the `document` table.
pub const MAX_NAME_LEN: usize = 140;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub doctype: String,
    pub name: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub owner: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_key(doctype: &str, name: &str) -> Result<(), ModelError> {
    if doctype.trim().is_empty() {
        return Err(ModelError::Validation("doctype required".into()));
    }
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    if doctype.len() > MAX_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Err(ModelError::Validation(format!("doctype and name are limited to {MAX_NAME_LEN} characters")));
    }
    Ok(())
}

fn db_err(e: DbErr) -> ModelError {
    ModelError::Db(e.to_string())
}

pub async fn find(db: &DatabaseConnection, doctype: &str, name: &str) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::Doctype.eq(doctype))
        .filter(Column::Name.eq(name))
        .one(db)
        .await
        .map_err(db_err)
}

/// All rows of a doctype in insertion order.
pub async fn list_by_doctype(db: &DatabaseConnection, doctype: &str) -> Result<Vec<Model>, ModelError> {
    Entity::find()
        .filter(Column::Doctype.eq(doctype))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
        .map_err(db_err)
}

pub async fn create(db: &DatabaseConnection, doctype: &str, name: &str, data: Json, owner: &str) -> Result<Model, ModelError> {
    validate_key(doctype, name)?;
    if !data.is_object() {
        return Err(ModelError::Validation("data must be a JSON object".into()));
    }
    if find(db, doctype, name).await?.is_some() {
        return Err(ModelError::Duplicate { doctype: doctype.into(), name: name.into() });
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        doctype: Set(doctype.to_string()),
        name: Set(name.to_string()),
        data: Set(data),
        owner: Set(owner.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(db_err)
}

pub async fn update_data(db: &DatabaseConnection, doctype: &str, name: &str, data: Json) -> Result<Model, ModelError> {
    if !data.is_object() {
        return Err(ModelError::Validation("data must be a JSON object".into()));
    }
    let mut found: ActiveModel = find(db, doctype, name)
        .await?
        .ok_or_else(|| ModelError::NotFound { doctype: doctype.into(), name: name.into() })?
        .into();
    found.data = Set(data);
    found.updated_at = Set(Utc::now().into());
    found.update(db).await.map_err(db_err)
}

/// Remove a row; returns whether it existed.
pub async fn delete(db: &DatabaseConnection, doctype: &str, name: &str) -> Result<bool, ModelError> {
    let res = Entity::delete_many()
        .filter(Column::Doctype.eq(doctype))
        .filter(Column::Name.eq(name))
        .exec(db)
        .await
        .map_err(db_err)?;
    Ok(res.rows_affected > 0)
}
