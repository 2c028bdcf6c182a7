//! Render command

use super::load_config;
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use vista_view::{Renderer, RequestInfo};

/// Arguments for the `render` command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON configuration file (defaults to VISTA_* environment variables)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Controller name
    #[arg(long)]
    pub controller: String,

    /// Method name
    #[arg(long)]
    pub method: String,

    /// Controller sub-directory
    #[arg(long, default_value = "")]
    pub directory: String,

    /// Request path, used for cache fingerprints
    #[arg(long, default_value = "/")]
    pub uri: String,

    /// View to render instead of `controller/method`
    #[arg(long)]
    pub view: Option<String>,

    /// Layout to render into
    #[arg(long)]
    pub layout: Option<String>,

    /// Theme to force
    #[arg(long)]
    pub theme: Option<String>,

    /// User agent of the simulated request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Simulate an Ajax request
    #[arg(long)]
    pub ajax: bool,

    /// Template variable as KEY=VALUE (VALUE is parsed as JSON when possible)
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, serde_json::Value)>,

    /// Status message as TYPE::TEXT
    #[arg(long)]
    pub message: Option<String>,

    /// Print response headers before the body
    #[arg(long)]
    pub headers: bool,
}

fn parse_var(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;
    if key.is_empty() {
        return Err("variable name is empty".to_string());
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Render a page and print it
pub fn render(args: RenderArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let renderer = Renderer::with_tera(config)?;

    let mut request = RequestInfo::new(args.controller, args.method)
        .directory(args.directory)
        .uri(args.uri)
        .ajax(args.ajax);
    if let Some(agent) = args.user_agent {
        request = request.user_agent(agent);
    }

    let mut ctx = renderer.context(request);
    if let Some(view) = args.view {
        ctx.set_view(view);
    }
    if let Some(layout) = args.layout {
        ctx.set_layout(layout);
    }
    if let Some(theme) = args.theme {
        ctx.set_theme(theme);
    }
    for (key, value) in &args.vars {
        ctx.set(key.as_str(), value)?;
    }
    if let Some(raw) = args.message {
        let message = vista_view::Message::decode(&raw);
        ctx.set_message(message.text, message.kind);
    }

    let page = renderer
        .render(&mut ctx)
        .context("Failed to render page")?;

    tracing::debug!(view = %page.view, layout = %page.layout, theme = %page.theme, "Rendered");

    if args.headers {
        for (name, value) in &page.headers {
            println!(
                "{}: {}",
                style(name.as_str()).cyan(),
                value.to_str().unwrap_or_default()
            );
        }
        println!();
    }
    println!("{}", page.body);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("count=3").unwrap(),
            ("count".to_string(), serde_json::json!(3))
        );
        assert_eq!(
            parse_var("title=Hello world").unwrap(),
            ("title".to_string(), serde_json::json!("Hello world"))
        );
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=x").is_err());
    }
}
