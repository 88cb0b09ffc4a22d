use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use contracts::domain::a001_product::{Product, ProductDto};
use contracts::domain::a002_store::Store;
use contracts::domain::a003_import_run::{ImportRun, ImportRunDto, ImportRunItem};
use contracts::shared::PagedResponse;

use crate::commit::CatalogWriter;
use crate::executor::ImportTarget;
use crate::existence::{CatalogProbe, SkuPresence};

/// Ответ backend'а на создание записи
#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

/// Карточка прогона импорта с итогами
#[derive(Debug, Deserialize)]
pub struct ImportRunDetails {
    #[serde(flatten)]
    pub run: ImportRun,
    pub items: Vec<ImportRunItem>,
    #[serde(rename = "distinctProducts")]
    pub distinct_products: usize,
    #[serde(rename = "totalQuantity")]
    pub total_quantity: f64,
}

/// REST-клиент backend'а. Все вызовы мастера импорта идут через него.
pub struct BackofficeApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackofficeApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Не удалось создать HTTP-клиент")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /api/products — поиск по наименованию или артикулу
    pub async fn search_products(
        &self,
        search: &str,
        limit: u64,
    ) -> Result<PagedResponse<Product>> {
        let response = self
            .client
            .get(self.url("/api/products"))
            .query(&[("search", search), ("limit", &limit.to_string())])
            .send()
            .await
            .context("Запрос списка товаров не удался")?;

        if !response.status().is_success() {
            bail!("Backend вернул статус {}", response.status());
        }
        Ok(response.json().await.context("Некорректный ответ backend'а")?)
    }

    /// POST /api/products
    pub async fn create_product(&self, dto: &ProductDto) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/products"))
            .json(dto)
            .send()
            .await
            .context("Запрос создания товара не удался")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Backend вернул статус {}: {}", status, body);
        }
        let created: CreatedResponse =
            response.json().await.context("Некорректный ответ backend'а")?;
        Ok(created.id)
    }

    /// POST /api/import-history/products — запись прогона в журнал
    pub async fn create_import_run(&self, dto: &ImportRunDto) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/import-history/products"))
            .json(dto)
            .send()
            .await
            .context("Запрос записи прогона не удался")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Backend вернул статус {}: {}", status, body);
        }
        let created: CreatedResponse =
            response.json().await.context("Некорректный ответ backend'а")?;
        Ok(created.id)
    }

    /// GET /api/import-history/products
    pub async fn list_import_runs(
        &self,
        page: u64,
        limit: u64,
        store_id: Option<&str>,
    ) -> Result<PagedResponse<ImportRun>> {
        let mut query: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(store_id) = store_id {
            query.push(("store_id", store_id.to_string()));
        }

        let response = self
            .client
            .get(self.url("/api/import-history/products"))
            .query(&query)
            .send()
            .await
            .context("Запрос журнала импорта не удался")?;

        if !response.status().is_success() {
            bail!("Backend вернул статус {}", response.status());
        }
        Ok(response.json().await.context("Некорректный ответ backend'а")?)
    }

    /// GET /api/import-history/products/:id
    pub async fn get_import_run(&self, id: &str) -> Result<ImportRunDetails> {
        let response = self
            .client
            .get(self.url(&format!("/api/import-history/products/{}", id)))
            .send()
            .await
            .context("Запрос карточки прогона не удался")?;

        if !response.status().is_success() {
            bail!("Backend вернул статус {}", response.status());
        }
        Ok(response.json().await.context("Некорректный ответ backend'а")?)
    }

    /// GET /api/stores
    pub async fn list_stores(&self) -> Result<PagedResponse<Store>> {
        let response = self
            .client
            .get(self.url("/api/stores"))
            .send()
            .await
            .context("Запрос списка магазинов не удался")?;

        if !response.status().is_success() {
            bail!("Backend вернул статус {}", response.status());
        }
        Ok(response.json().await.context("Некорректный ответ backend'а")?)
    }
}

#[async_trait]
impl CatalogProbe for BackofficeApiClient {
    /// Поиск backend'а работает по подстроке, поэтому совпадение
    /// артикула проверяется здесь точно и без учета регистра.
    async fn sku_exists(&self, sku: &str) -> SkuPresence {
        let needle = sku.trim().to_lowercase();
        match self.search_products(sku, 50).await {
            Ok(page) => {
                let found = page
                    .items
                    .iter()
                    .any(|p| p.sku.trim().to_lowercase() == needle);
                if found {
                    SkuPresence::Exists
                } else {
                    SkuPresence::Absent
                }
            }
            Err(e) => SkuPresence::Unknown(e.to_string()),
        }
    }
}

#[async_trait]
impl CatalogWriter for BackofficeApiClient {
    async fn create_product(&self, dto: &ProductDto) -> Result<String> {
        BackofficeApiClient::create_product(self, dto).await
    }
}

#[async_trait]
impl ImportTarget for BackofficeApiClient {
    async fn record_run(&self, dto: &ImportRunDto) -> Result<String> {
        self.create_import_run(dto).await
    }

    async fn recent_runs(&self, store_id: Option<&str>) -> Result<PagedResponse<ImportRun>> {
        self.list_import_runs(1, 20, store_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackofficeApiClient::new("http://localhost:3000/").unwrap();
        assert_eq!(client.url("/api/products"), "http://localhost:3000/api/products");
    }
}
