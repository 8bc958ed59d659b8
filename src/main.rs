use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_dispatch::build_router;
use fleet_dispatch::config::{EnvironmentConfig, StorageBackend};
use fleet_dispatch::database::DatabaseConnection;
use fleet_dispatch::repositories::{FleetStore, MemoryStore, PgStore};
use fleet_dispatch::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging; RUST_LOG manda si está definido
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EnvironmentConfig::from_env()?;
    info!("🚚 Fleet Dispatch - entorno {}", config.environment);

    let store: Arc<dyn FleetStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let db_connection = match DatabaseConnection::new_default().await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };
            db_connection.run_migrations().await?;
            Arc::new(PgStore::new(db_connection.pool().clone()))
        }
        StorageBackend::Memory => {
            if config.is_production() {
                warn!("⚠️ Backend en memoria en producción: los datos no sobreviven a un reinicio");
            }
            Arc::new(MemoryStore::new())
        }
    };
    info!("💾 Backend de persistencia: {:?}", config.storage_backend);

    let addr: SocketAddr = config.server_url().parse()?;
    let app = build_router(AppState::new(store, config));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("   GET  /health");
    info!("   /api/vehicles, /api/drivers, /api/trips, /api/maintenance");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
