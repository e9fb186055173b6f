//! Invocation context of one outgoing call.

use serde_json::Value;

/// What is being called. Routing only reads the method name.
pub trait Invocation: Send + Sync + std::fmt::Debug {
    fn method_name(&self) -> &str;

    fn parameter_types(&self) -> &[String] {
        &[]
    }

    fn arguments(&self) -> &[Value] {
        &[]
    }
}

/// Plain value implementation of [`Invocation`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcInvocation {
    method_name: String,
    parameter_types: Vec<String>,
    arguments: Vec<Value>,
}

impl RpcInvocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method_name(mut self, name: impl Into<String>) -> Self {
        self.method_name = name.into();
        self
    }

    pub fn with_parameter_types(mut self, types: Vec<String>) -> Self {
        self.parameter_types = types;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
    }
}

impl Invocation for RpcInvocation {
    fn method_name(&self) -> &str {
        &self.method_name
    }

    fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}
