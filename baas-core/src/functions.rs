use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{Auth, Object};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{BaasError, BaasResult};

#[derive(Debug, Clone)]
pub struct FunctionRequest {
    pub function_name: String,
    pub params: Object,
    pub master: bool,
    pub user: Option<Object>,
    pub installation_id: Option<String>,
    pub headers: HashMap<String, String>,
}

impl FunctionRequest {
    fn new(function_name: &str, params: Object, auth: &Auth) -> Self {
        Self {
            function_name: function_name.to_string(),
            params,
            master: auth.is_master(),
            user: auth.user().cloned(),
            installation_id: auth.installation_id().map(String::from),
            headers: auth.headers().clone(),
        }
    }
}

/// A named cloud function.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    async fn call(&self, request: FunctionRequest) -> BaasResult<Value>;
}

#[async_trait]
impl<F, Fut> FunctionHandler for F
where
    F: Fn(FunctionRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BaasResult<Value>> + Send + 'static,
{
    async fn call(&self, request: FunctionRequest) -> BaasResult<Value> {
        (self)(request).await
    }
}

/// Guard run before a function; `false` rejects the call.
pub type Validator = Arc<dyn Fn(&FunctionRequest) -> bool + Send + Sync>;

#[derive(Clone)]
struct RegisteredFunction {
    handler: Arc<dyn FunctionHandler>,
    validator: Option<Validator>,
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: scc::HashMap<String, RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define<H>(&self, name: &str, handler: H, validator: Option<Validator>)
    where
        H: FunctionHandler + 'static,
    {
        debug!(name, "define function");
        self.functions.upsert(
            name.to_string(),
            RegisteredFunction {
                handler: Arc::new(handler),
                validator,
            },
        );
    }

    pub fn exists(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    /// Invoke `name` and wrap its value as `{"result": ...}`.
    pub async fn call(
        &self,
        name: &str,
        auth: &Auth,
        params: Object,
    ) -> BaasResult<Value> {
        let function = self
            .functions
            .read(name, |_, f| f.clone())
            .ok_or_else(|| {
                BaasError::ScriptFailed(format!("Invalid function: {}", name))
            })?;
        let request = FunctionRequest::new(name, params, auth);
        if let Some(validator) = &function.validator {
            if !validator(&request) {
                return Err(BaasError::ValidationError(
                    "Validation failed.".into(),
                ));
            }
        }
        debug!(name, "call function");
        let result = function.handler.call(request).await?;
        Ok(json!({ "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn hello(req: FunctionRequest) -> BaasResult<Value> {
        let name = req
            .params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("world")
            .to_string();
        Ok(json!(format!("hello {}", name)))
    }

    #[tokio::test]
    async fn test_call_wraps_result() {
        let registry = FunctionRegistry::new();
        registry.define("hello", hello, None);
        let params = json!({"name": "baas"}).as_object().cloned().unwrap();
        let out = registry.call("hello", &Auth::nobody(), params).await.unwrap();
        assert_eq!(out, json!({"result": "hello baas"}));
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        let err = registry
            .call("missing", &Auth::nobody(), Object::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), BaasError::SCRIPT_FAILED);
        assert_eq!(err.to_string(), "Invalid function: missing");
    }

    #[tokio::test]
    async fn test_validator_rejects() {
        let registry = FunctionRegistry::new();
        let master_only: Validator = Arc::new(|req: &FunctionRequest| req.master);
        registry.define("admin", hello, Some(master_only));

        let err = registry
            .call("admin", &Auth::nobody(), Object::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), BaasError::VALIDATION_ERROR);

        let ok = registry.call("admin", &Auth::master(), Object::new()).await;
        assert!(ok.is_ok());
        assert!(registry.remove("admin"));
        assert!(!registry.exists("admin"));
    }
}
