use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// At most one live (non-expired) lease per room. A plain record with an
/// expiry, swept atomically on every acquisition attempt; expiry is the
/// only release path.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bot_leases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "room_id")]
    pub room_id: i64,
    #[sea_orm(column_name = "holder_player_id")]
    pub holder_player_id: i64,
    #[sea_orm(column_name = "acquired_at")]
    pub acquired_at: OffsetDateTime,
    #[sea_orm(column_name = "expires_at")]
    pub expires_at: OffsetDateTime,
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
