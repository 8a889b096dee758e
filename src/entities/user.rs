//! User entity - Students, teachers and festival operators.
//!
//! Users are provisioned on first login and hold a coin balance. The optional class
//! grouping (`grade`, `classroom`, `class_role`) only matters for display and filtering.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role a user holds at the festival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum UserRole {
    /// Attending student
    #[sea_orm(string_value = "student")]
    Student,
    /// Teacher or staff member
    #[sea_orm(string_value = "teacher")]
    Teacher,
    /// Festival operator with administrative rights over balances
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login e-mail, unique per user
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// Student, teacher or festival operator
    pub role: UserRole,
    /// Grade, when the user belongs to a class
    pub grade: Option<i32>,
    /// Classroom within the grade
    pub classroom: Option<i32>,
    /// Free-form role inside the class (e.g. "president")
    pub class_role: Option<String>,
    /// Current balance in coins, never negative
    pub balance: i64,
    /// When the user was provisioned
    pub created_at: DateTimeUtc,
}

/// Users have no outgoing relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
