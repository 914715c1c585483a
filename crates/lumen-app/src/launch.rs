//! Merge the config file and command line into one set of webview options.

use std::path::PathBuf;

use lumen_common::SizeHint;
use lumen_config::LumenConfig;
use lumen_webview::WebviewBuilder;

use crate::cli::Args;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub size_hint: SizeHint,
    pub developer_tools: bool,
    pub background: bool,
    pub url: Option<String>,
    pub html: Option<String>,
    pub library_path: Option<PathBuf>,
}

impl LaunchPlan {
    pub fn resolve(config: &LumenConfig, args: &Args) -> Self {
        // A URL or HTML given on the command line replaces both config values.
        let (url, html) = if args.url.is_some() || args.html.is_some() {
            (args.url.clone(), args.html.clone())
        } else {
            (config.content.url.clone(), config.content.html.clone())
        };

        Self {
            title: args
                .title
                .clone()
                .unwrap_or_else(|| config.window.title.clone()),
            width: args.width.unwrap_or(config.window.width),
            height: args.height.unwrap_or(config.window.height),
            size_hint: config.window.size_hint,
            developer_tools: args.devtools || config.engine.developer_tools,
            background: args.background || config.engine.async_mode,
            url,
            html,
            library_path: args
                .library
                .clone()
                .or_else(|| config.engine.library_path.clone()),
        }
    }

    pub fn builder(&self) -> WebviewBuilder {
        let mut builder = WebviewBuilder::new()
            .title(self.title.as_str())
            .size(self.width, self.height)
            .size_hint(self.size_hint)
            .developer_tools(self.developer_tools)
            .background(self.background);
        if let Some(url) = &self.url {
            builder = builder.url(url.as_str());
        }
        if let Some(html) = &self.html {
            builder = builder.html(html.as_str());
        }
        if let Some(path) = &self.library_path {
            builder = builder.library_path(path);
        }
        builder
    }
}
