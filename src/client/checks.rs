use std::collections::BTreeMap;

use reqwest::Method;

use super::models::{Check, CheckRequest, DeleteResponse};
use super::{Client, ClientError};

impl Client {
    /// `GET /checks`: every check keyed by id.
    pub async fn list_checks(&self) -> Result<BTreeMap<String, Check>, ClientError> {
        self.call(Method::GET, &["checks"]).await
    }

    /// `GET /checks/{id}`. A 404 becomes [`ClientError::NotFound`].
    pub async fn get_check(&self, id: &str) -> Result<Check, ClientError> {
        self.call(Method::GET, &["checks", id])
            .await
            .map_err(|err| not_found(err, id))
    }

    /// `POST /checks`.
    pub async fn create_check(&self, request: &CheckRequest) -> Result<Check, ClientError> {
        self.call_with_body(Method::POST, &["checks"], request).await
    }

    /// `PUT /checks/{id}`.
    pub async fn update_check(
        &self,
        id: &str,
        request: &CheckRequest,
    ) -> Result<Check, ClientError> {
        self.call_with_body(Method::PUT, &["checks", id], request)
            .await
    }

    /// `DELETE /checks/{id}`. A 404 becomes [`ClientError::NotFound`].
    pub async fn delete_check(&self, id: &str) -> Result<(), ClientError> {
        let response: DeleteResponse = self
            .call(Method::DELETE, &["checks", id])
            .await
            .map_err(|err| not_found(err, id))?;
        if response.ok {
            Ok(())
        } else {
            Err(ClientError::DeleteRejected("check"))
        }
    }
}

fn not_found(err: ClientError, id: &str) -> ClientError {
    if err.is_not_found() {
        ClientError::NotFound {
            resource_type: "check",
            id: id.to_string(),
        }
    } else {
        err
    }
}
