// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, User},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, pool: PgPool) -> Self {
        Self {
            user_repo,
            jwt_secret,
            pool,
        }
    }

    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        site_id: Option<Uuid>,
    ) -> Result<String, AppError> {
        // Hashing fora do runtime async (bcrypt é CPU-bound)
        let password_clone = password.to_owned();
        let hashed_password =
            tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        // Registro aberto cria sempre usuário comum; superusers são
        // provisionados fora da API.
        let new_user = self
            .user_repo
            .create_user(&self.pool, email, &hashed_password, full_name, site_id)
            .await?;

        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.create_token(user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;

        self.user_repo
            .find_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_workshop;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn registro_login_e_validacao_do_token(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let auth = &f.state.auth_service;

        auth.register_user("novo@oficina.com", "senha123", "Novo Usuário", None)
            .await
            .unwrap();

        let token = auth.login_user("novo@oficina.com", "senha123").await.unwrap();
        let user = auth.validate_token(&token).await.unwrap();
        assert_eq!(user.email, "novo@oficina.com");
        assert!(!user.is_superuser);

        let err = auth
            .login_user("novo@oficina.com", "senha-errada")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));

        let err = auth.validate_token("token-invalido").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[sqlx::test]
    async fn email_duplicado_e_conflito(pool: PgPool) {
        let f = setup_workshop(&pool).await;
        let auth = &f.state.auth_service;

        auth.register_user("dup@oficina.com", "senha123", "Primeiro", None)
            .await
            .unwrap();
        let err = auth
            .register_user("dup@oficina.com", "outra456", "Segundo", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailAlreadyExists));
    }
}
