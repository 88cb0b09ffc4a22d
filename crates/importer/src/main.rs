use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use contracts::domain::common::AggregateId;
use importer::client::BackofficeApiClient;
use importer::commit::CancelToken;
use importer::executor::{ImportExecutor, ImportRequest, ImportResult};
use importer::mapper::TargetField;
use importer::template;
use importer::validator::ValidationReport;

/// Клиент импорта каталога товаров
#[derive(Parser)]
#[command(name = "importer", version)]
struct Cli {
    /// Адрес backend'а
    #[arg(long, default_value = "http://localhost:3000", global = true)]
    backend_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Импорт файла (csv, xlsx, xls, xlsm) в каталог
    Import {
        /// Путь к файлу
        file: PathBuf,

        /// Магазин, в каталог которого идет импорт
        #[arg(long)]
        store_id: Option<String>,

        /// Правка сопоставления: КОЛОНКА=ПОЛЕ (name|sku|price|stock),
        /// КОЛОНКА= снимает назначение. Можно указывать несколько раз.
        #[arg(long = "map", value_name = "COL=FIELD")]
        overrides: Vec<String>,

        /// Не проверять артикулы в каталоге перед записью
        #[arg(long)]
        skip_catalog_check: bool,

        /// Пауза между строками, мс
        #[arg(long, default_value_t = 100)]
        row_delay_ms: u64,
    },

    /// Сохранить шаблон файла импорта (.csv или .xlsx по расширению)
    Template {
        /// Куда сохранить
        #[arg(long, default_value = "import_template.xlsx")]
        out: PathBuf,
    },

    /// Журнал прогонов импорта
    History {
        #[arg(long)]
        store_id: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: u64,
    },

    /// Список магазинов
    Stores,
}

/// "2=price" -> (2, Some(Price)); "2=" -> (2, None)
fn parse_override(raw: &str) -> Result<(usize, Option<TargetField>)> {
    let (col, field) = raw
        .split_once('=')
        .with_context(|| format!("Ожидался формат КОЛОНКА=ПОЛЕ: {}", raw))?;
    let column: usize = col
        .trim()
        .parse()
        .with_context(|| format!("Некорректный номер колонки: {}", col))?;
    let field = field.trim();
    if field.is_empty() {
        return Ok((column, None));
    }
    let target = TargetField::from_str(field)
        .with_context(|| format!("Неизвестное поле: {} (name|sku|price|stock)", field))?;
    Ok((column, Some(target)))
}

fn print_report(report: &ValidationReport) {
    println!(
        "Строк: {}, корректных: {}, ошибок: {}, предупреждений: {}",
        report.total_rows,
        report.valid_rows,
        report.errors.len(),
        report.warnings.len()
    );
    for error in &report.errors {
        if error.row == 0 {
            println!("  ошибка [сопоставление]: {}", error.message);
        } else {
            println!("  ошибка [строка {}]: {}", error.row, error.message);
        }
    }
    for warning in &report.warnings {
        println!("  предупреждение [строка {}]: {}", warning.row, warning.message);
    }
}

async fn run_import(
    client: Arc<BackofficeApiClient>,
    file: PathBuf,
    store_id: Option<String>,
    overrides: Vec<String>,
    skip_catalog_check: bool,
    row_delay_ms: u64,
) -> Result<()> {
    let overrides = overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>>>()?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Получен Ctrl+C, запись будет остановлена");
                cancel.cancel();
            }
        });
    }

    let request = ImportRequest {
        file_path: file,
        store_id,
        overrides,
        skip_catalog_check,
        row_delay: Duration::from_millis(row_delay_ms),
        cancel,
    };

    let executor = ImportExecutor::new(client);
    match executor.run(request).await? {
        ImportResult::Rejected(report) => {
            print_report(&report);
            bail!("Импорт отклонен: исправьте ошибки и повторите");
        }
        ImportResult::Committed {
            report,
            outcome,
            run_id,
            ledger,
        } => {
            print_report(&report);
            println!(
                "Записано: {} из {}, с ошибками: {}{}",
                outcome.success_rows,
                outcome.total_rows,
                outcome.error_rows,
                if outcome.cancelled { " (прервано)" } else { "" }
            );
            for issue in &outcome.row_errors {
                println!("  строка {}: {}", issue.row, issue.message);
            }
            println!("Прогон в журнале: {}", run_id);
            println!("Журнал ({} всего):", ledger.total);
            for run in &ledger.items {
                println!(
                    "  {} {} — {} (успешно {}, ошибок {})",
                    run.base.code,
                    run.file_name,
                    run.status.as_str(),
                    run.success_rows,
                    run.error_rows
                );
            }
            Ok(())
        }
    }
}

async fn run_template(out: PathBuf) -> Result<()> {
    let extension = out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => std::fs::write(&out, template::template_csv())
            .context("Не удалось записать CSV-шаблон")?,
        "xlsx" => template::write_template_xlsx(&out)?,
        other => bail!("Неподдерживаемое расширение шаблона: {}", other),
    }
    println!("Шаблон сохранен: {}", out.display());
    Ok(())
}

async fn run_history(
    client: Arc<BackofficeApiClient>,
    store_id: Option<String>,
    page: u64,
) -> Result<()> {
    let ledger = client
        .list_import_runs(page, 20, store_id.as_deref())
        .await?;
    println!(
        "Журнал импорта: страница {} из {}, всего {}",
        ledger.page, ledger.total_pages, ledger.total
    );
    for run in &ledger.items {
        println!(
            "  {} {} — {} (строк {}, успешно {}, ошибок {})",
            run.base.code,
            run.file_name,
            run.status.as_str(),
            run.total_rows,
            run.success_rows,
            run.error_rows
        );
    }
    Ok(())
}

async fn run_stores(client: Arc<BackofficeApiClient>) -> Result<()> {
    let stores = client.list_stores().await?;
    println!("Магазины ({}):", stores.total);
    for store in &stores.items {
        println!("  {} — {}", store.base.id.as_string(), store.base.description);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let client = Arc::new(BackofficeApiClient::new(&cli.backend_url)?);

    match cli.command {
        Command::Import {
            file,
            store_id,
            overrides,
            skip_catalog_check,
            row_delay_ms,
        } => {
            run_import(
                client,
                file,
                store_id,
                overrides,
                skip_catalog_check,
                row_delay_ms,
            )
            .await
        }
        Command::Template { out } => run_template(out).await,
        Command::History { store_id, page } => run_history(client, store_id, page).await,
        Command::Stores => run_stores(client).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(parse_override("2=price").unwrap(), (2, Some(TargetField::Price)));
        assert_eq!(parse_override("3=").unwrap(), (3, None));
        assert!(parse_override("x=price").is_err());
        assert!(parse_override("2=weight").is_err());
    }
}
