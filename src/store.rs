//! Template persistence
//!
//! [`TemplateStore`] is the seam between the component service and whatever
//! keeps template records. [`InMemoryTemplateStore`] is the bundled
//! implementation, suitable for tests, demos and embedding.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::types::{DynamicSetting, NewTemplate, TemplateRecord, TemplateType, TemplateUpdate};

/// Storage for templates and their dynamic settings
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// All templates in insertion order
    async fn list_templates(&self) -> Result<Vec<TemplateRecord>>;

    /// Look up a template by id
    ///
    /// Fails with [`Error::NotFound`] when no such template exists.
    async fn get_template(&self, template_id: &str) -> Result<TemplateRecord>;

    /// Create a static template with a generated id
    async fn create_template(&self, template: NewTemplate) -> Result<TemplateRecord>;

    /// Apply a partial update
    async fn update_template(
        &self,
        template_id: &str,
        update: TemplateUpdate,
    ) -> Result<TemplateRecord>;

    /// Delete a template together with its dynamic setting
    async fn delete_template(&self, template_id: &str) -> Result<()>;

    /// The template's dynamic setting, if it has one
    async fn get_dynamic_setting(&self, template_id: &str) -> Result<Option<DynamicSetting>>;

    /// Create or replace the template's dynamic setting
    async fn save_dynamic_setting(
        &self,
        template_id: &str,
        setting: DynamicSetting,
    ) -> Result<DynamicSetting>;

    /// Record the last dynamic render without touching the static template
    async fn save_last_render(&self, template_id: &str, rendered: JsonValue) -> Result<()>;
}

/// In-memory [`TemplateStore`]
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: RwLock<IndexMap<String, TemplateRecord>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record as is
    pub fn insert(&self, record: TemplateRecord) -> Result<()> {
        self.templates
            .write()
            .map_err(poisoned)?
            .insert(record.template_id.clone(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_record<R>(
        &self,
        template_id: &str,
        f: impl FnOnce(&mut TemplateRecord) -> R,
    ) -> Result<R> {
        let mut templates = self.templates.write().map_err(poisoned)?;
        let record = templates
            .get_mut(template_id)
            .ok_or_else(|| not_found(template_id))?;
        Ok(f(record))
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        let templates = self.templates.read().map_err(poisoned)?;
        Ok(templates.values().cloned().collect())
    }

    async fn get_template(&self, template_id: &str) -> Result<TemplateRecord> {
        let templates = self.templates.read().map_err(poisoned)?;
        templates
            .get(template_id)
            .cloned()
            .ok_or_else(|| not_found(template_id))
    }

    async fn create_template(&self, template: NewTemplate) -> Result<TemplateRecord> {
        let record = TemplateRecord::new(
            uuid::Uuid::new_v4().to_string(),
            template.template_name,
            template.template_json,
        );
        let mut templates = self.templates.write().map_err(poisoned)?;
        if templates.contains_key(&record.template_id) {
            return Err(Error::store_owned(format!(
                "Template with templateId \"{}\" already exists",
                record.template_id
            )));
        }
        templates.insert(record.template_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_template(
        &self,
        template_id: &str,
        update: TemplateUpdate,
    ) -> Result<TemplateRecord> {
        self.with_record(template_id, |record| {
            if let Some(name) = update.template_name {
                record.template_name = name;
            }
            if let Some(template_type) = update.template_type {
                record.template_type = template_type;
            }
            if let Some(json) = update.static_template_json {
                record.static_template_json = json;
            }
            if let Some(json) = update.dynamic_template_json {
                record.dynamic_template_json = Some(json);
            }
            record.clone()
        })
    }

    async fn delete_template(&self, template_id: &str) -> Result<()> {
        let mut templates = self.templates.write().map_err(poisoned)?;
        templates
            .shift_remove(template_id)
            .map(|_| ())
            .ok_or_else(|| not_found(template_id))
    }

    async fn get_dynamic_setting(&self, template_id: &str) -> Result<Option<DynamicSetting>> {
        Ok(self.get_template(template_id).await?.dynamic_setting)
    }

    async fn save_dynamic_setting(
        &self,
        template_id: &str,
        setting: DynamicSetting,
    ) -> Result<DynamicSetting> {
        self.with_record(template_id, |record| {
            record.template_type = TemplateType::Dynamic;
            record.dynamic_setting = Some(setting.clone());
            setting
        })
    }

    async fn save_last_render(&self, template_id: &str, rendered: JsonValue) -> Result<()> {
        self.with_record(template_id, |record| {
            record.dynamic_template_json = Some(rendered);
        })
    }
}

fn not_found(template_id: &str) -> Error {
    Error::not_found_owned(format!("Template with templateId \"{}\" not found", template_id))
}

fn poisoned<T>(_: PoisonError<T>) -> Error {
    Error::store_static("Template store lock poisoned")
}
