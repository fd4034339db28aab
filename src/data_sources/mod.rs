//! Read-only data sources. Unlike resource reads, a missing object is an
//! error here.

mod check;
mod checks;
mod contact;
mod contacts;

pub use check::CheckDataSource;
pub use checks::ChecksDataSource;
pub use contact::ContactDataSource;
pub use contacts::ContactsDataSource;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::Schema;

/// One data source type served by the provider.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Type name used in configuration, e.g. `nodeping_checks`.
    fn type_name(&self) -> &'static str;

    /// Data source schema.
    fn schema(&self) -> Schema;

    /// Fetch and return the full state for `config`.
    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError>;
}

/// Every data source the provider serves.
pub fn all() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(CheckDataSource),
        Box::new(ChecksDataSource),
        Box::new(ContactDataSource),
        Box::new(ContactsDataSource),
    ]
}

/// The required `id` from a data source configuration.
pub(crate) fn config_id(config: &Value) -> Result<String, ProviderError> {
    config
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Validation("Missing required attribute 'id'".to_string()))
}
