//! Dining Table Model

use serde::{Deserialize, Serialize};

/// 桌台状态
///
/// `last_cleared_at` 与状态联动：结账或清台时回到 `Available`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Cleaning,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Occupied => write!(f, "occupied"),
            Self::Reserved => write!(f, "reserved"),
            Self::Cleaning => write!(f, "cleaning"),
        }
    }
}

/// Dining table entity (桌台)
///
/// `last_cleared_at` 单调递增，是同一张物理桌上
/// “上一批客人的订单”与“当前客人的订单”的权威分界线。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    pub number: i32,
    pub seats: i32,
    pub status: TableStatus,
    /// Occupancy-window boundary (ms UTC), advanced only at checkout/clear
    pub last_cleared_at: i64,
    pub qr_code: Option<String>,
    pub created_at: i64,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTableCreate {
    pub number: i32,
    pub seats: Option<i32>,
    pub qr_code: Option<String>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiningTableUpdate {
    pub seats: Option<i32>,
    pub status: Option<TableStatus>,
    pub qr_code: Option<String>,
}
