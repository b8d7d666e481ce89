//! Web target using the love.js compat player
//!
//! The love.js sources ship as a zip with a single top-level directory. The
//! compat page templates are rendered and written into `<name>-lovejs.zip`
//! together with the game data and the player runtime.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::urls;
use crate::core::version::parse_love_version;
use crate::error::TargetError;
use crate::infra::{download, filesystem};
use crate::platforms::{runtime_zip, BuildContext, TargetBuilder};

/// Heap size passed to the player when `lovejs.memory` is unset
pub const DEFAULT_MEMORY: u64 = 20_000_000;

/// Player files copied verbatim: (path below the sources, path in the output)
const PLAYER_FILES: &[(&str, &str)] = &[
    ("src/compat/love.js", "love.js"),
    ("src/compat/love.wasm", "love.wasm"),
    ("src/compat/theme/love.css", "theme/love.css"),
    ("src/compat/theme/bg.png", "theme/bg.png"),
];

/// Builder for `lovejs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LoveJsBuilder;

impl TargetBuilder for LoveJsBuilder {
    fn build<'a>(&'a self, ctx: &'a BuildContext<'a>) -> BoxFuture<'a, Result<(), TargetError>> {
        build_lovejs(ctx).boxed()
    }
}

async fn build_lovejs(ctx: &BuildContext<'_>) -> Result<(), TargetError> {
    if !matches!(parse_love_version(ctx.love_version), Ok((11, _))) {
        tracing::warn!("love.js only supports LÖVE 11. The web build might not be functional");
    }

    let memory = memory(ctx)?;
    let source = runtime_zip(ctx, urls::LOVEJS_ARCHIVE).await?;
    let dest = ctx.target_dir.join(format!("{}-{}.zip", ctx.name, ctx.target));
    write_web_bundle(ctx, &source, &dest, memory)?;
    tracing::info!("Created {}", dest.display());
    Ok(())
}

/// `lovejs.memory`, validated
fn memory(ctx: &BuildContext<'_>) -> Result<u64, TargetError> {
    match ctx.config.section_str("lovejs", "memory") {
        None => Ok(DEFAULT_MEMORY),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| TargetError::InvalidSetting {
                target: ctx.target.to_string(),
                key: "lovejs.memory".to_string(),
                message: e.to_string(),
            }),
    }
}

fn write_web_bundle(
    ctx: &BuildContext<'_>,
    source: &Path,
    dest: &Path,
    memory: u64,
) -> Result<(), TargetError> {
    let src_err = |e: &dyn std::fmt::Display| ctx.zip_err(source, e);
    let dest_err = |e: &dyn std::fmt::Display| ctx.zip_err(dest, e);

    let game_data = filesystem::read_bytes(ctx.love_file)?;

    let file = File::open(source).map_err(|e| src_err(&e))?;
    let mut player = ZipArchive::new(BufReader::new(file)).map_err(|e| src_err(&e))?;
    let prefix = {
        let first = player.by_index(0).map_err(|e| src_err(&e))?;
        first.name().split('/').next().unwrap_or_default().to_string()
    };

    let mut read_template = |path: &str| -> Result<Vec<u8>, TargetError> {
        let full = format!("{prefix}/{path}");
        let mut entry = player.by_name(&full).map_err(|_| {
            ctx.bad_runtime(format!("love.js archive has no '{full}'"))
        })?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content).map_err(|e| src_err(&e))?;
        Ok(content)
    };

    let title = ctx.config.section_str("lovejs", "title").unwrap_or(ctx.name);
    let index_html = render_mustache(
        &String::from_utf8_lossy(&read_template("src/compat/index.html")?),
        &[
            ("title", title.to_string()),
            ("arguments", json!(["./game.love"]).to_string()),
            ("memory", memory.to_string()),
        ],
    );

    let metadata = json!({
        "package_uuid": package_uuid(&game_data),
        "remote_package_size": game_data.len(),
        "files": [{
            "filename": "/game.love",
            "crunched": 0,
            "start": 0,
            "end": game_data.len(),
            "audio": false,
        }],
    });
    let game_js = render_mustache(
        &String::from_utf8_lossy(&read_template("src/game.js")?),
        &[
            ("create_file_paths", String::new()),
            ("metadata", metadata.to_string()),
        ],
    );

    let mut files: Vec<(String, Vec<u8>)> = vec![
        ("index.html".to_string(), index_html.into_bytes()),
        ("game.js".to_string(), game_js.into_bytes()),
        ("game.data".to_string(), game_data),
    ];
    for (src, name) in PLAYER_FILES {
        files.push(((*name).to_string(), read_template(src)?));
    }

    let out = File::create(dest).map_err(|e| dest_err(&e))?;
    let mut bundle = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());
    for (name, content) in &files {
        bundle
            .start_file(format!("{}/{name}", ctx.name), options)
            .map_err(|e| dest_err(&e))?;
        bundle.write_all(content).map_err(|e| dest_err(&e))?;
    }
    bundle
        .finish()
        .map_err(|e| dest_err(&e))?
        .flush()
        .map_err(|e| dest_err(&e))?;
    Ok(())
}

/// Package id derived from the game data
///
/// Identical games get identical ids, which keeps builds reproducible.
pub fn package_uuid(game_data: &[u8]) -> String {
    download::compute_checksum(game_data)[..32].to_string()
}

/// The subset of mustache the love.js templates use
///
/// `{{{key}}}` inserts the value as is, `{{key}}` HTML-escaped.
pub fn render_mustache(template: &str, context: &[(&str, String)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in context {
        rendered = rendered.replace(&format!("{{{{{{{key}}}}}}}"), value);
        rendered = rendered.replace(&format!("{{{{{key}}}}}"), &html_escape(value));
    }
    rendered
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
