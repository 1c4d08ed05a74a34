use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;
use sea_orm_migration::sea_query::extension::postgres::Type as PgType;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Rooms {
    Table,
    Id,
    JoinCode,
    Status,
    Visibility,
    IsMatchmaking,
    IsRanked,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Seats {
    Table,
    Id,
    RoomId,
    SeatIdx,
    PlayerId,
    OriginalPlayerId,
    DisplayName,
    IsHuman,
    BotDifficulty,
    IsOwner,
    Presence,
    DisconnectedAt,
    IsSpectator,
    JoinedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum GameStates {
    Table,
    Id,
    RoomId,
    Phase,
    TurnSeat,
    LastPlay,
    PassCount,
    MatchNo,
    Hands,
    Played,
    Scores,
    LastMatchWinner,
    GameWinner,
    RngSeed,
    AutoPassDeadline,
    AutoPassPlay,
    LockVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum QueueEntries {
    Table,
    Id,
    PlayerId,
    DisplayName,
    Rating,
    Region,
    Mode,
    EnqueuedAt,
}

#[derive(Iden)]
enum BotLeases {
    Table,
    RoomId,
    HolderPlayerId,
    AcquiredAt,
    ExpiresAt,
}

#[derive(Iden)]
enum RoomStatusEnum {
    #[iden = "room_status"]
    Type,
}

#[derive(Iden)]
enum RoomVisibilityEnum {
    #[iden = "room_visibility"]
    Type,
}

#[derive(Iden)]
enum GamePhaseEnum {
    #[iden = "game_phase"]
    Type,
}

#[derive(Iden)]
enum SeatPresenceEnum {
    #[iden = "seat_presence"]
    Type,
}

#[derive(Iden)]
enum QueueModeEnum {
    #[iden = "queue_mode"]
    Type,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enum types (PostgreSQL only; SQLite stores them as TEXT)
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                async fn enum_exists(
                    manager: &SchemaManager<'_>,
                    name: &str,
                ) -> Result<bool, DbErr> {
                    let result = manager
                        .get_connection()
                        .query_one(Statement::from_sql_and_values(
                            sea_orm::DatabaseBackend::Postgres,
                            "SELECT 1 FROM pg_type WHERE typname = $1",
                            vec![name.into()],
                        ))
                        .await?;
                    Ok(result.is_some())
                }

                if !enum_exists(manager, "room_status").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(RoomStatusEnum::Type)
                                .values(["WAITING", "STARTING", "PLAYING", "FINISHED"])
                                .to_owned(),
                        )
                        .await?;
                }

                if !enum_exists(manager, "room_visibility").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(RoomVisibilityEnum::Type)
                                .values(["PUBLIC", "PRIVATE"])
                                .to_owned(),
                        )
                        .await?;
                }

                if !enum_exists(manager, "game_phase").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(GamePhaseEnum::Type)
                                .values([
                                    "DEALING",
                                    "FIRST_PLAY",
                                    "PLAYING",
                                    "FINISHED",
                                    "GAME_OVER",
                                ])
                                .to_owned(),
                        )
                        .await?;
                }

                if !enum_exists(manager, "seat_presence").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(SeatPresenceEnum::Type)
                                .values(["CONNECTED", "DISCONNECTED", "BOT_CONTROLLED"])
                                .to_owned(),
                        )
                        .await?;
                }

                if !enum_exists(manager, "queue_mode").await? {
                    manager
                        .create_type(
                            PgType::create()
                                .as_enum(QueueModeEnum::Type)
                                .values(["CASUAL", "RANKED"])
                                .to_owned(),
                        )
                        .await?;
                }
            }
            sea_orm::DatabaseBackend::Sqlite => {}
            _ => {
                return Err(DbErr::Custom("Unsupported database backend".into()));
            }
        }

        // rooms
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rooms::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Rooms::JoinCode).string_len(6).not_null())
                    .col(
                        ColumnDef::new(Rooms::Status)
                            .custom(RoomStatusEnum::Type)
                            .not_null()
                            .default("WAITING"),
                    )
                    .col(
                        ColumnDef::new(Rooms::Visibility)
                            .custom(RoomVisibilityEnum::Type)
                            .not_null()
                            .default("PRIVATE"),
                    )
                    .col(
                        ColumnDef::new(Rooms::IsMatchmaking)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rooms::IsRanked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Join codes are globally unique among live rooms; reclamation deletes
        // the room row, which frees the code.
        manager
            .create_index(
                Index::create()
                    .name("ux_rooms_join_code")
                    .table(Rooms::Table)
                    .col(Rooms::JoinCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_rooms_status")
                    .table(Rooms::Table)
                    .col(Rooms::Status)
                    .to_owned(),
            )
            .await?;

        // seats
        manager
            .create_table(
                Table::create()
                    .table(Seats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Seats::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Seats::RoomId).big_integer().not_null())
                    .col(ColumnDef::new(Seats::SeatIdx).small_integer().not_null())
                    .col(ColumnDef::new(Seats::PlayerId).big_integer().null())
                    .col(ColumnDef::new(Seats::OriginalPlayerId).big_integer().null())
                    .col(ColumnDef::new(Seats::DisplayName).string().not_null())
                    .col(
                        ColumnDef::new(Seats::IsHuman)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Seats::BotDifficulty).small_integer().null())
                    .col(
                        ColumnDef::new(Seats::IsOwner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Seats::Presence)
                            .custom(SeatPresenceEnum::Type)
                            .not_null()
                            .default("CONNECTED"),
                    )
                    .col(
                        ColumnDef::new(Seats::DisconnectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Seats::IsSpectator)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Seats::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Seats::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_seats_room_id")
                            .from(Seats::Table, Seats::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Backstop for the per-room join serialization: two concurrent joins
        // can never commit the same seat index.
        manager
            .create_index(
                Index::create()
                    .name("ux_seats_room_seat_idx")
                    .table(Seats::Table)
                    .col(Seats::RoomId)
                    .col(Seats::SeatIdx)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_seats_player_id")
                    .table(Seats::Table)
                    .col(Seats::PlayerId)
                    .to_owned(),
            )
            .await?;

        // game_states (1:1 with rooms, re-initialised between matches)
        manager
            .create_table(
                Table::create()
                    .table(GameStates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameStates::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(GameStates::RoomId).big_integer().not_null())
                    .col(
                        ColumnDef::new(GameStates::Phase)
                            .custom(GamePhaseEnum::Type)
                            .not_null()
                            .default("DEALING"),
                    )
                    .col(
                        ColumnDef::new(GameStates::TurnSeat)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(GameStates::LastPlay).json_binary().null())
                    .col(
                        ColumnDef::new(GameStates::PassCount)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(GameStates::MatchNo)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(GameStates::Hands).json_binary().not_null())
                    .col(ColumnDef::new(GameStates::Played).json_binary().not_null())
                    .col(ColumnDef::new(GameStates::Scores).json_binary().not_null())
                    .col(
                        ColumnDef::new(GameStates::LastMatchWinner)
                            .small_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(GameStates::GameWinner).small_integer().null())
                    .col(ColumnDef::new(GameStates::RngSeed).big_integer().not_null())
                    .col(
                        ColumnDef::new(GameStates::AutoPassDeadline)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(GameStates::AutoPassPlay).json_binary().null())
                    .col(
                        ColumnDef::new(GameStates::LockVersion)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(GameStates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameStates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_states_room_id")
                            .from(GameStates::Table, GameStates::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_game_states_room_id")
                    .table(GameStates::Table)
                    .col(GameStates::RoomId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // queue_entries
        manager
            .create_table(
                Table::create()
                    .table(QueueEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QueueEntries::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(QueueEntries::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QueueEntries::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QueueEntries::Rating).integer().not_null())
                    .col(ColumnDef::new(QueueEntries::Region).string().not_null())
                    .col(
                        ColumnDef::new(QueueEntries::Mode)
                            .custom(QueueModeEnum::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QueueEntries::EnqueuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_queue_entries_player_id")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::PlayerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_queue_entries_mode_region")
                    .table(QueueEntries::Table)
                    .col(QueueEntries::Mode)
                    .col(QueueEntries::Region)
                    .to_owned(),
            )
            .await?;

        // bot_leases: one row per room, expiry-based mutual exclusion.
        // Deliberately not session-scoped advisory locks; a plain record with
        // an expiry survives pooled connections.
        manager
            .create_table(
                Table::create()
                    .table(BotLeases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BotLeases::RoomId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BotLeases::HolderPlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BotLeases::AcquiredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BotLeases::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bot_leases_room_id")
                            .from(BotLeases::Table, BotLeases::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BotLeases::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_queue_entries_mode_region")
                    .table(QueueEntries::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ux_queue_entries_player_id")
                    .table(QueueEntries::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(QueueEntries::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ux_game_states_room_id")
                    .table(GameStates::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(GameStates::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_seats_player_id")
                    .table(Seats::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ux_seats_room_seat_idx")
                    .table(Seats::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Seats::Table).to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ix_rooms_status")
                    .table(Rooms::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("ux_rooms_join_code")
                    .table(Rooms::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await?;

        // Drop enum types (PostgreSQL only)
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                for ty in [
                    PgType::drop().name(QueueModeEnum::Type).if_exists().to_owned(),
                    PgType::drop()
                        .name(SeatPresenceEnum::Type)
                        .if_exists()
                        .to_owned(),
                    PgType::drop().name(GamePhaseEnum::Type).if_exists().to_owned(),
                    PgType::drop()
                        .name(RoomVisibilityEnum::Type)
                        .if_exists()
                        .to_owned(),
                    PgType::drop().name(RoomStatusEnum::Type).if_exists().to_owned(),
                ] {
                    manager.drop_type(ty).await?;
                }
            }
            sea_orm::DatabaseBackend::Sqlite => {}
            _ => {
                return Err(DbErr::Custom("Unsupported database backend".into()));
            }
        }

        Ok(())
    }
}
