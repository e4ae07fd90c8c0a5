use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tracing::info;

use crate::{
    entities::user,
    error::{AppError, AppResult},
    models::NewUser,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn find<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(conn).await?)
}

pub async fn create<C: ConnectionTrait>(conn: &C, new: NewUser) -> AppResult<user::Model> {
    let name = new.name.trim().to_string();
    let username = new.username.trim().to_string();
    let email = new.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AppError::validation("name", name, "name is required"));
    }
    if username.is_empty() {
        return Err(AppError::validation("username", username, "username is required"));
    }
    if !email.contains('@') {
        return Err(AppError::validation("email", email, "not a valid email address"));
    }
    if new.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "password",
            "",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(username.as_str()))
                .add(user::Column::Email.eq(email.as_str())),
        )
        .one(conn)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("username or email is already taken".to_string()));
    }

    let password_hash = hash_password(&new.password)?;

    let user = user::ActiveModel {
        name: Set(name),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|err| match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("username or email is already taken".to_string())
        },
        _ => err.into(),
    })?;

    info!(user_id = user.id, username = %user.username, "user signed up");
    Ok(user)
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
    Ok(hash.to_string())
}
