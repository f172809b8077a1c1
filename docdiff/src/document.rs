use guarantor_crypto::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A minimal identity record: an author's address plus arbitrary profile properties.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub address: Address,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl Identity {
    pub const DOCTYPE: &'static str = "guarantor.schemas:Identity";
}

/// A titled document with arbitrary properties — the catch-all doctype for anything that isn't
/// an [`Identity`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GenericDocument {
    pub title: String,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl GenericDocument {
    pub const DOCTYPE: &'static str = "guarantor.schemas:GenericDocument";
}
