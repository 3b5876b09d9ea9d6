use crate::dispatcher::{Application, HttpContext};
use serde_json::json;
use std::io::Write;

/// Answers every action with a JSON dump of what the application would see.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoApplication;

impl Application for EchoApplication {
    fn forward(
        &self,
        action: &str,
        ctx: &mut HttpContext<'_, '_>,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let files: serde_json::Map<String, serde_json::Value> = ctx
            .uploads()
            .iter()
            .map(|u| (u.field.clone(), u.to_json()))
            .collect();
        let route: serde_json::Map<String, serde_json::Value> = ctx
            .route_params()
            .iter()
            .map(|(name, value)| (name.to_string(), json!(value)))
            .collect();
        let body = json!({
            "action": action,
            "route": route,
            "request_id": ctx.request_id(),
            "method": ctx.method().as_str(),
            "environment": ctx.environment(),
            "query": ctx.params().query,
            "body": ctx.params().body,
            "request": ctx.params().merged,
            "files": files,
            "input_size": ctx.input().len(),
        });
        ctx.header("Content-Type", "application/json", true, 0);
        serde_json::to_writer(&mut *out, &body)?;
        Ok(())
    }
}
