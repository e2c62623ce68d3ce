use clap::Parser;
use comickids::config::{build_pipeline, setup_logging};
use sea_orm_migration::MigratorTrait;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = comickids::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return;
    }

    let db = match comickids::db::connect_db(&cli.database_path).await {
        Ok(db) => db,
        Err(err) => {
            error!("Database connection error: {}", err);
            return;
        }
    };

    if let Err(err) = comickids::db::migrations::Migrator::up(&db, None).await {
        error!("Database migration error: {}", err);
        return;
    }

    let pipeline = match build_pipeline(&cli) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            error!("Failed to set up providers: {}", err);
            return;
        }
    };

    if let Err(err) = pipeline.media().ensure_placeholder().await {
        error!("Failed to prepare media directory: {}", err);
        return;
    }

    if let Err(err) =
        comickids::web::setup_server(&cli.listen_address, cli.port, db, pipeline).await
    {
        error!("Application error: {}", err);
    }
}
