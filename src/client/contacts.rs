use std::collections::BTreeMap;

use reqwest::Method;

use super::models::{Contact, ContactCreateRequest, ContactUpdateRequest, DeleteResponse};
use super::{Client, ClientError};

impl Client {
    /// `GET /contacts`: every contact keyed by id.
    pub async fn list_contacts(&self) -> Result<BTreeMap<String, Contact>, ClientError> {
        self.call(Method::GET, &["contacts"]).await
    }

    /// `GET /contacts/{id}`. A 404 becomes [`ClientError::NotFound`].
    pub async fn get_contact(&self, id: &str) -> Result<Contact, ClientError> {
        self.call(Method::GET, &["contacts", id])
            .await
            .map_err(|err| not_found(err, id))
    }

    /// `POST /contacts`.
    pub async fn create_contact(
        &self,
        request: &ContactCreateRequest,
    ) -> Result<Contact, ClientError> {
        self.call_with_body(Method::POST, &["contacts"], request)
            .await
    }

    /// `PUT /contacts/{id}`.
    pub async fn update_contact(
        &self,
        id: &str,
        request: &ContactUpdateRequest,
    ) -> Result<Contact, ClientError> {
        self.call_with_body(Method::PUT, &["contacts", id], request)
            .await
    }

    /// `DELETE /contacts/{id}`. A 404 becomes [`ClientError::NotFound`].
    pub async fn delete_contact(&self, id: &str) -> Result<(), ClientError> {
        let response: DeleteResponse = self
            .call(Method::DELETE, &["contacts", id])
            .await
            .map_err(|err| not_found(err, id))?;
        if response.ok {
            Ok(())
        } else {
            Err(ClientError::DeleteRejected("contact"))
        }
    }
}

fn not_found(err: ClientError, id: &str) -> ClientError {
    if err.is_not_found() {
        ClientError::NotFound {
            resource_type: "contact",
            id: id.to_string(),
        }
    } else {
        err
    }
}
