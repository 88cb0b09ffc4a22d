use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

async fn table_exists(conn: &DatabaseConnection, name: &str) -> anyhow::Result<bool> {
    let sql = format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='{}';",
        name
    );
    let rows = conn
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await?;
    Ok(!rows.is_empty())
}

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/backoffice.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    let conn = Database::connect(&db_url).await?;

    // Минимальный bootstrap схемы: create-if-missing для каждой таблицы

    // a001_product
    if !table_exists(&conn, "a001_product").await? {
        tracing::info!("Creating a001_product table");
        let create_product_table_sql = r#"
            CREATE TABLE a001_product (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                comment TEXT,
                sku TEXT NOT NULL DEFAULT '',
                price REAL NOT NULL DEFAULT 0,
                stock INTEGER NOT NULL DEFAULT 0,
                unit TEXT NOT NULL DEFAULT 'шт',
                barcode TEXT,
                store_id TEXT,
                width_mm REAL NOT NULL DEFAULT 0,
                height_mm REAL NOT NULL DEFAULT 0,
                length_mm REAL NOT NULL DEFAULT 0,
                weight_g REAL NOT NULL DEFAULT 0,
                images_json TEXT,
                attributes_json TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_product_table_sql.to_string(),
        ))
        .await?;
    }

    // a002_store
    if !table_exists(&conn, "a002_store").await? {
        tracing::info!("Creating a002_store table");
        let create_store_table_sql = r#"
            CREATE TABLE a002_store (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                comment TEXT,
                address TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_store_table_sql.to_string(),
        ))
        .await?;
    }

    // a003_import_run
    if !table_exists(&conn, "a003_import_run").await? {
        tracing::info!("Creating a003_import_run table");
        let create_import_run_table_sql = r#"
            CREATE TABLE a003_import_run (
                id TEXT PRIMARY KEY NOT NULL,
                code TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                comment TEXT,
                file_name TEXT NOT NULL,
                store_id TEXT,
                total_rows INTEGER NOT NULL DEFAULT 0,
                success_rows INTEGER NOT NULL DEFAULT 0,
                error_rows INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'in_progress',
                items_json TEXT,
                is_deleted INTEGER NOT NULL DEFAULT 0,
                created_at TEXT,
                updated_at TEXT,
                version INTEGER NOT NULL DEFAULT 0
            );
        "#;
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            create_import_run_table_sql.to_string(),
        ))
        .await?;
    }

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}
