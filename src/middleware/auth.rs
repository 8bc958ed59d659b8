//! Autenticación JWT
//!
//! Extractor que verifica el token Bearer y entrega el actor autenticado.
//! El control de roles vive aquí, nunca en los servicios.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use uuid::Uuid;

use crate::{
    state::AppState,
    utils::errors::AppError,
    utils::jwt::{extract_token_from_header, verify_token, ActorRole},
};

/// Altas, bajas y cambios de registro y mantenimiento
pub const REGISTRY_ROLES: &[ActorRole] = &[ActorRole::Admin, ActorRole::Manager];
/// Crear, editar, despachar y completar viajes; registrar combustible
pub const DISPATCH_ROLES: &[ActorRole] = &[ActorRole::Admin, ActorRole::Manager, ActorRole::Dispatcher];
/// Cancelar viajes
pub const CANCEL_ROLES: &[ActorRole] = &[ActorRole::Admin, ActorRole::Manager];

/// Actor autenticado que se inyecta en los handlers
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedActor {
    pub actor_id: Uuid,
    pub role: ActorRole,
}

impl AuthenticatedActor {
    pub fn require_role(&self, allowed: &[ActorRole]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            log::warn!("🚫 Actor {} con rol {} sin permiso", self.actor_id, self.role);
            Err(AppError::Forbidden(format!(
                "El rol {} no puede realizar esta operación",
                self.role
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedActor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

        let token = extract_token_from_header(auth_header)?;
        let claims = verify_token(token, &state.jwt_config())?;
        let actor_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("ID de actor inválido".to_string()))?;

        Ok(Self {
            actor_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tables() {
        let viewer = AuthenticatedActor { actor_id: Uuid::new_v4(), role: ActorRole::Viewer };
        let dispatcher = AuthenticatedActor { actor_id: Uuid::new_v4(), role: ActorRole::Dispatcher };
        let manager = AuthenticatedActor { actor_id: Uuid::new_v4(), role: ActorRole::Manager };

        assert!(matches!(viewer.require_role(DISPATCH_ROLES), Err(AppError::Forbidden(_))));
        assert!(dispatcher.require_role(DISPATCH_ROLES).is_ok());
        assert!(matches!(dispatcher.require_role(CANCEL_ROLES), Err(AppError::Forbidden(_))));
        assert!(matches!(dispatcher.require_role(REGISTRY_ROLES), Err(AppError::Forbidden(_))));
        assert!(manager.require_role(REGISTRY_ROLES).is_ok());
        assert!(manager.require_role(CANCEL_ROLES).is_ok());
    }
}
