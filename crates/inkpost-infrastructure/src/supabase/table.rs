use async_trait::async_trait;
use inkpost_core::error::Result;
use inkpost_core::gateway::{Filter, Query, TableGateway};
use reqwest::Method;
use serde_json::Value;

use super::{SupabaseGateway, transport_error};

const RETURN_REPRESENTATION: &str = "return=representation";

fn filter_param(filter: &Filter) -> (String, String) {
    (filter.column.clone(), format!("eq.{}", filter.value_text()))
}

impl SupabaseGateway {
    fn table_url(&self, table: &str) -> String {
        self.url(&format!("rest/v1/{table}"))
    }
}

#[async_trait]
impl TableGateway for SupabaseGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(filter) = &query.filter {
            params.push(filter_param(filter));
        }
        if let Some(order) = &query.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        tracing::debug!(table, ?params, "select");
        let response = self
            .send(self.request(Method::GET, self.table_url(table)).query(&params))
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>> {
        tracing::debug!(table, count = rows.len(), "insert");
        let response = self
            .send(
                self.request(Method::POST, self.table_url(table))
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&rows),
            )
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        tracing::debug!(table, column = %filter.column, "update");
        let response = self
            .send(
                self.request(Method::PATCH, self.table_url(table))
                    .query(&[filter_param(filter)])
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(&patch),
            )
            .await?;
        response.json().await.map_err(transport_error)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        tracing::debug!(table, column = %filter.column, "delete");
        self.send(
            self.request(Method::DELETE, self.table_url(table))
                .query(&[filter_param(filter)]),
        )
        .await?;
        Ok(())
    }
}
