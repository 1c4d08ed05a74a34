use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "game_phase")]
pub enum GamePhase {
    #[sea_orm(string_value = "DEALING")]
    Dealing,
    #[sea_orm(string_value = "FIRST_PLAY")]
    FirstPlay,
    #[sea_orm(string_value = "PLAYING")]
    Playing,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "GAME_OVER")]
    GameOver,
}

/// One row per room (1:1), re-initialised between matches, never deleted
/// while the room exists. Hands, play log and scores are JSON documents;
/// `lock_version` increments on every applied move so feed consumers can
/// order events.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game_states")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_name = "room_id")]
    pub room_id: i64,
    pub phase: GamePhase,
    #[sea_orm(column_name = "turn_seat", column_type = "SmallInteger")]
    pub turn_seat: i16,
    #[sea_orm(column_name = "last_play")]
    pub last_play: Option<Json>,
    #[sea_orm(column_name = "pass_count", column_type = "SmallInteger")]
    pub pass_count: i16,
    #[sea_orm(column_name = "match_no", column_type = "SmallInteger")]
    pub match_no: i16,
    pub hands: Json,
    pub played: Json,
    pub scores: Json,
    #[sea_orm(column_name = "last_match_winner", column_type = "SmallInteger")]
    pub last_match_winner: Option<i16>,
    #[sea_orm(column_name = "game_winner", column_type = "SmallInteger")]
    pub game_winner: Option<i16>,
    #[sea_orm(column_name = "rng_seed")]
    pub rng_seed: i64,
    #[sea_orm(column_name = "auto_pass_deadline")]
    pub auto_pass_deadline: Option<OffsetDateTime>,
    #[sea_orm(column_name = "auto_pass_play")]
    pub auto_pass_play: Option<Json>,
    #[sea_orm(column_name = "lock_version")]
    pub lock_version: i32,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
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
