use anyhow::Result;
use tokenscout::config::Config;

#[test]
fn test_config_missing_database_url() {
    std::env::remove_var("DATABASE_URL");
    let result = Config::load();
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().to_lowercase().contains("database_url"));
}

#[tokio::test]
async fn test_database_health_check() -> Result<()> {
    if std::env::var("DATABASE_URL").is_err() {
        // Skip test if no database configured
        return Ok(());
    }

    let config = Config::load()?;
    let database = tokenscout::db::Database::new(&config.database.url).await?;
    database.health_check().await?;
    Ok(())
}
