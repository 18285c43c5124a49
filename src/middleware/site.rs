// src/middleware/site.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{common::error::ApiError, models::auth::User};

// O escopo de filial do chamador, derivado do usuário autenticado (nunca de
// um cabeçalho: o cliente não escolhe o que enxerga).
//
// Três perfis:
//   superuser          -> lê e escreve em todas as filiais
//   usuário de filial  -> lê e escreve apenas na própria filial
//   usuário de matriz  -> lê todas as filiais, não escreve em nenhuma
//
// O escopo é passado explicitamente pelos services e repositórios (parâmetro
// `scope_site: Option<Uuid>`), nunca por estado ambiente.
#[derive(Debug, Clone)]
pub struct SiteScope {
    pub user_id: Uuid,
    pub is_superuser: bool,
    pub site_id: Option<Uuid>,
}

impl SiteScope {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            is_superuser: user.is_superuser,
            site_id: user.site_id,
        }
    }

    /// Filtro de visibilidade para queries: None = enxerga tudo.
    pub fn visible_site(&self) -> Option<Uuid> {
        if self.is_superuser {
            None
        } else {
            // Usuário de filial enxerga a própria; usuário de matriz (sem
            // filial) enxerga todas, em modo leitura.
            self.site_id
        }
    }

    /// O chamador pode escrever dados desta filial?
    pub fn can_write_site(&self, site_id: Uuid) -> bool {
        self.is_superuser || self.site_id == Some(site_id)
    }

    /// O chamador tem alguma permissão de escrita?
    pub fn can_write(&self) -> bool {
        self.is_superuser || self.site_id.is_some()
    }
}

impl<S> FromRequestParts<S> for SiteScope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .map(SiteScope::from_user)
            .ok_or_else(|| {
                ApiError::new(
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Missing or invalid authentication token.",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(is_superuser: bool, site_id: Option<Uuid>) -> SiteScope {
        SiteScope {
            user_id: Uuid::new_v4(),
            is_superuser,
            site_id,
        }
    }

    #[test]
    fn superuser_enxerga_e_escreve_em_tudo() {
        let site = Uuid::new_v4();
        let s = scope(true, None);
        assert_eq!(s.visible_site(), None);
        assert!(s.can_write_site(site));
        assert!(s.can_write());
    }

    #[test]
    fn usuario_de_filial_so_enxerga_a_propria() {
        let site = Uuid::new_v4();
        let other = Uuid::new_v4();
        let s = scope(false, Some(site));
        assert_eq!(s.visible_site(), Some(site));
        assert!(s.can_write_site(site));
        assert!(!s.can_write_site(other));
    }

    #[test]
    fn usuario_de_matriz_le_tudo_mas_nao_escreve() {
        let site = Uuid::new_v4();
        let s = scope(false, None);
        assert_eq!(s.visible_site(), None);
        assert!(!s.can_write_site(site));
        assert!(!s.can_write());
    }
}
