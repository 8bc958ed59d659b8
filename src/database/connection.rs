//! Configuración de conexión a PostgreSQL
//!
//! Este módulo crea el pool de conexiones y aplica las migraciones de la flota.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::database::DatabaseConfig;

/// Conexión a la base de datos con su pool
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        log::info!("🔌 Conectando a {}", mask_database_url(&config.url));
        let pool = config
            .create_pool()
            .await
            .context("Error creando el pool de PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Conectar usando DATABASE_URL
    pub async fn new_default() -> Result<Self> {
        Self::new(&DatabaseConfig::from_env()?).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ejecutar migraciones de la base de datos
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Error ejecutando migraciones")?;
        log::info!("✅ Migraciones aplicadas");
        Ok(())
    }
}

/// Función helper para enmascarar la URL de la base de datos en logs
fn mask_database_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at_pos)) if at_pos > scheme_end => {
            format!("{}***:***@{}", &url[..scheme_end + 3], &url[at_pos + 1..])
        }
        _ => url.to_string(),
    }
}
