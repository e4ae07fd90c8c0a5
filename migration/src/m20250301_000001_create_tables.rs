use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Name))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .to_owned(),
            )
            .await?;

        // Keyed by the TMDB id so a second insert for the same movie hits the primary key.
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(integer(Movies::Id).primary_key())
                    .col(string(Movies::Title))
                    .col(string_null(Movies::ReleaseDate))
                    .col(string_null(Movies::Genre))
                    .col(integer_null(Movies::Runtime))
                    .col(string_null(Movies::PosterPath))
                    .col(double(Movies::VoteAverage))
                    .col(big_integer(Movies::CachedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(pk_auto(Entries::Id))
                    .col(integer(Entries::UserId))
                    .col(integer(Entries::MovieId))
                    .col(string(Entries::WatchedOn))
                    .col(
                        integer_null(Entries::Rating)
                            .check(Expr::col(Entries::Rating).between(0, 10)),
                    )
                    .col(big_integer(Entries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_user")
                            .from(Entries::Table, Entries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_movie")
                            .from(Entries::Table, Entries::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_movie_id")
                    .table(Entries::Table)
                    .col(Entries::MovieId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Entries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Username,
    Email,
    PasswordHash,
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    ReleaseDate,
    Genre,
    Runtime,
    PosterPath,
    VoteAverage,
    CachedAt,
}

#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    UserId,
    MovieId,
    WatchedOn,
    Rating,
    CreatedAt,
}
