//! Inbound verb plus payload shape to one of ten CRUD intents.

use crate::error::AppError;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    /// Parse an HTTP method name. Anything outside the five CRUD verbs is rejected.
    pub fn parse(method: &str) -> Result<Self, AppError> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "PATCH" => Ok(Verb::Patch),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(AppError::MethodNotSupported(method.to_string())),
        }
    }

    /// Read and delete requests carry their fields in the query string.
    pub fn reads_query(self) -> bool {
        matches!(self, Verb::Get | Verb::Delete)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Intent {
    RetrieveItem,
    RetrieveList,
    CreateItem,
    CreateList,
    ReplaceItem,
    ReplaceList,
    UpdateItem,
    UpdateList,
    DeleteItem,
    DeleteList,
}

impl Intent {
    /// Pure function of the verb and which keys are present.
    pub fn infer(verb: Verb, has_id: bool, has_items: bool) -> Self {
        match verb {
            Verb::Get if has_id => Intent::RetrieveItem,
            Verb::Get => Intent::RetrieveList,
            Verb::Post if has_items => Intent::CreateList,
            Verb::Post => Intent::CreateItem,
            Verb::Put if has_id => Intent::ReplaceItem,
            Verb::Put => Intent::ReplaceList,
            Verb::Patch if has_id => Intent::UpdateItem,
            Verb::Patch => Intent::UpdateList,
            Verb::Delete if has_id => Intent::DeleteItem,
            Verb::Delete => Intent::DeleteList,
        }
    }
}
