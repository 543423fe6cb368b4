//! `purview render`: print the demo application's static HTML.

use anyhow::{Context, Result};

use crate::cli::demo;
use crate::config::PurviewConfig;
use crate::embed::serve::{PAGE_HTML, PageVars};
use crate::runtime::Runtime;

pub fn render(config: &PurviewConfig, page: bool) -> Result<()> {
    println!("{}", render_to_string(config, page)?);
    Ok(())
}

fn render_to_string(config: &PurviewConfig, page: bool) -> Result<String> {
    let runtime = Runtime::new(config.runtime.clone());
    let body = runtime.render(&demo::app()).context("rendering demo app")?;
    Ok(if page {
        PAGE_HTML.render(&PageVars {
            title: "purview".into(),
            body,
        })
    } else {
        body
    })
}
