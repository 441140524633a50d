//! Component retrieval
//!
//! [`ComponentService`] answers "give me the component for this template id".
//! Static templates are returned as stored. Dynamic templates have their data
//! document fetched and merged in; when anything on that path fails the
//! static template is served instead, so a lookup only ever fails when the
//! template itself does not exist.

use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fetcher::DataFetcher;
use crate::merger::{merge_document, MergedDocument};
use crate::store::TemplateStore;
use crate::types::{ComponentResponse, DynamicSetting, TemplateRecord};

/// What to do with a successful dynamic render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderCachePolicy {
    /// Keep nothing
    #[default]
    Skip,
    /// Store the merged document as the template's last dynamic render
    ///
    /// The static placeholder template is never overwritten.
    StoreLastRender,
}

/// Configuration for [`ComponentService`]
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub render_cache: RenderCachePolicy,
    /// Name given to every array variable after a successful merge
    pub array_variable_alias: Option<String>,
}

impl ServiceConfig {
    pub fn with_render_cache(mut self, policy: RenderCachePolicy) -> Self {
        self.render_cache = policy;
        self
    }

    pub fn with_array_variable_alias(mut self, alias: impl Into<String>) -> Self {
        self.array_variable_alias = Some(alias.into());
        self
    }
}

/// Serves template components, merging external data into dynamic ones
pub struct ComponentService<S, F> {
    store: S,
    fetcher: F,
    config: ServiceConfig,
}

impl<S: TemplateStore, F: DataFetcher> ComponentService<S, F> {
    pub fn new(store: S, fetcher: F) -> Self {
        Self::with_config(store, fetcher, ServiceConfig::default())
    }

    pub fn with_config(store: S, fetcher: F, config: ServiceConfig) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Retrieve the component for a template
    ///
    /// # Errors
    ///
    /// Only [`Error::NotFound`] (or a store failure) is returned. Fetch and
    /// merge failures are logged and answered with the static template.
    ///
    /// [`Error::NotFound`]: crate::Error::NotFound
    pub async fn get_component(&self, template_id: &str) -> Result<ComponentResponse> {
        let template = self.store.get_template(template_id).await?;
        debug!(template_id, template_type = ?template.template_type, "template found");

        let Some(setting) = &template.dynamic_setting else {
            debug!(template_id, "no dynamic setting, serving static template");
            return Ok(ComponentResponse::success(template.static_template_json));
        };

        let rendered = self.render_dynamic(&template, setting).await;
        match rendered {
            Ok(document) => Ok(ComponentResponse::success(document)),
            Err(err) => {
                warn!(template_id, error = %err, "dynamic render failed, serving static template");
                Ok(ComponentResponse::success(template.static_template_json))
            }
        }
    }

    async fn render_dynamic(
        &self,
        template: &TemplateRecord,
        setting: &DynamicSetting,
    ) -> Result<JsonValue> {
        let template_id = template.template_id.as_str();
        debug!(
            template_id,
            endpoint = %setting.endpoint,
            method = %setting.http_method,
            "fetching data document"
        );
        let data = self.fetcher.fetch(setting).await?;

        let MergedDocument {
            mut document,
            location,
            variables,
            resolved,
        } = merge_document(&template.static_template_json, &data)?;

        match location {
            Some(location) => {
                info!(template_id, %location, variables, resolved, "merged template variables");
                if let Some(alias) = &self.config.array_variable_alias {
                    let renamed = location.rename_array_variables(&mut document, alias);
                    debug!(template_id, alias = %alias, renamed, "renamed array variables");
                }
            }
            None => warn!(template_id, "no variables found in template to merge"),
        }

        if self.config.render_cache == RenderCachePolicy::StoreLastRender {
            if let Err(err) = self.store.save_last_render(template_id, document.clone()).await {
                warn!(template_id, error = %err, "failed to store last dynamic render");
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTemplateStore;
    use crate::test_utils::{FailingFetcher, StaticFetcher};
    use crate::types::{HttpMethod, TemplateRecord};
    use serde_json::json;

    fn news_template() -> JsonValue {
        json!({"card": {
            "log_id": "news",
            "variables": [
                {"name": "news", "type": "array", "value": [{"title": "{{title}}"}]},
                {"name": "count", "type": "integer", "value": "{{response.total}}"}
            ]
        }})
    }

    fn store_with(record: TemplateRecord) -> InMemoryTemplateStore {
        let store = InMemoryTemplateStore::new();
        store.insert(record).unwrap();
        store
    }

    fn dynamic_record() -> TemplateRecord {
        TemplateRecord::new("news", "News", news_template())
            .with_dynamic_setting(DynamicSetting::new("http://localhost/news", HttpMethod::Get))
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let service =
            ComponentService::new(InMemoryTemplateStore::new(), StaticFetcher::new(json!({})));
        let err = service.get_component("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_static_template_returned_unchanged() {
        let store = store_with(TemplateRecord::new("news", "News", news_template()));
        let fetcher = StaticFetcher::new(json!({"news": [{"title": "unused"}], "total": 1}));
        let service = ComponentService::new(store, fetcher);

        let response = service.get_component("news").await.unwrap();
        assert!(response.success);
        assert_eq!(response.data, news_template());
        assert_eq!(service.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_dynamic_template_merged() {
        let fetcher =
            StaticFetcher::new(json!({"news": [{"title": "A"}, {"title": "B"}], "total": 2}));
        let service = ComponentService::new(store_with(dynamic_record()), fetcher);

        let response = service.get_component("news").await.unwrap();
        assert!(response.success);
        assert_eq!(
            response.data["card"]["variables"],
            json!([
                {"name": "news", "type": "array", "value": [{"title": "A"}, {"title": "B"}]},
                {"name": "count", "type": "integer", "value": 2}
            ])
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back_to_static() {
        let service =
            ComponentService::new(store_with(dynamic_record()), FailingFetcher::default());

        let response = service.get_component("news").await.unwrap();
        assert!(response.success);
        assert_eq!(response.data, news_template());
    }

    #[tokio::test]
    async fn test_merge_failure_falls_back_to_static() {
        let template = json!({"variables": {"not": "a list"}});
        let record = TemplateRecord::new("bad", "Bad", template.clone())
            .with_dynamic_setting(DynamicSetting::new("http://localhost", HttpMethod::Get));
        let service = ComponentService::new(store_with(record), StaticFetcher::new(json!({})));

        let response = service.get_component("bad").await.unwrap();
        assert!(response.success);
        assert_eq!(response.data, template);
    }

    #[tokio::test]
    async fn test_default_policy_never_persists() {
        let fetcher = StaticFetcher::new(json!({"news": [{"title": "A"}], "total": 1}));
        let service = ComponentService::new(store_with(dynamic_record()), fetcher);

        service.get_component("news").await.unwrap();
        let record = service.store().get_template("news").await.unwrap();
        assert_eq!(record.static_template_json, news_template());
        assert_eq!(record.dynamic_template_json, Some(news_template()));
    }

    #[tokio::test]
    async fn test_store_last_render_policy() {
        let fetcher = StaticFetcher::new(json!({"news": [{"title": "A"}], "total": 1}));
        let config = ServiceConfig::default().with_render_cache(RenderCachePolicy::StoreLastRender);
        let service = ComponentService::with_config(store_with(dynamic_record()), fetcher, config);

        let response = service.get_component("news").await.unwrap();
        let record = service.store().get_template("news").await.unwrap();
        assert_eq!(record.static_template_json, news_template());
        assert_eq!(record.dynamic_template_json, Some(response.data));
    }

    #[tokio::test]
    async fn test_array_variable_alias() {
        let fetcher = StaticFetcher::new(json!({"news": [{"title": "A"}], "total": 1}));
        let config = ServiceConfig::default().with_array_variable_alias("item_data");
        let service = ComponentService::with_config(store_with(dynamic_record()), fetcher, config);

        let response = service.get_component("news").await.unwrap();
        assert_eq!(response.data["card"]["variables"][0]["name"], json!("item_data"));
        assert_eq!(response.data["card"]["variables"][1]["name"], json!("count"));
    }

    #[tokio::test]
    async fn test_repeated_requests_use_stored_placeholder_template() {
        let fetcher =
            StaticFetcher::new(json!({"news": [{"title": "A"}, {"title": "B"}], "total": 2}));
        let config = ServiceConfig::default().with_render_cache(RenderCachePolicy::StoreLastRender);
        let service = ComponentService::with_config(store_with(dynamic_record()), fetcher, config);

        let first = service.get_component("news").await.unwrap();
        let second = service.get_component("news").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.fetcher.calls(), 2);
    }
}
