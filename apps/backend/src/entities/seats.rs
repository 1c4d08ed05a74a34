use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Per-seat presence machine: `connected → disconnected → bot_controlled`,
/// with `connected` reachable from any state on explicit reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "seat_presence")]
pub enum SeatPresence {
    #[sea_orm(string_value = "CONNECTED")]
    Connected,
    #[sea_orm(string_value = "DISCONNECTED")]
    Disconnected,
    #[sea_orm(string_value = "BOT_CONTROLLED")]
    BotControlled,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "room_id")]
    pub room_id: i64,
    #[sea_orm(column_name = "seat_idx", column_type = "SmallInteger")]
    pub seat_idx: i16,
    /// Occupant identity; None for bot seats.
    #[sea_orm(column_name = "player_id")]
    pub player_id: Option<i64>,
    /// Set when a bot takes over a human seat, so the original identity
    /// can be recognized on reconnect.
    #[sea_orm(column_name = "original_player_id")]
    pub original_player_id: Option<i64>,
    #[sea_orm(column_name = "display_name")]
    pub display_name: String,
    #[sea_orm(column_name = "is_human")]
    pub is_human: bool,
    #[sea_orm(column_name = "bot_difficulty", column_type = "SmallInteger")]
    pub bot_difficulty: Option<i16>,
    #[sea_orm(column_name = "is_owner")]
    pub is_owner: bool,
    pub presence: SeatPresence,
    #[sea_orm(column_name = "disconnected_at")]
    pub disconnected_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "is_spectator")]
    pub is_spectator: bool,
    #[sea_orm(column_name = "joined_at")]
    pub joined_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rooms::Entity",
        from = "Column::RoomId",
        to = "super::rooms::Column::Id"
    )]
    Room,
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Room.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
