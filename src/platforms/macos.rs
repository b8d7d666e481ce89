//! macOS application bundle target
//!
//! The runtime ships as a zip of `love.app`. Entries are copied raw into
//! `<name>-macos.zip` under `<name>.app/`, so symlinks inside the frameworks
//! survive on any host. `Info.plist`, the icon and the license are replaced,
//! and the game is added to `Contents/Resources`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use futures::future::BoxFuture;
use futures::FutureExt;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::urls;
use crate::error::TargetError;
use crate::infra::filesystem;
use crate::platforms::{runtime_zip, BuildContext, TargetBuilder};

const BUNDLE_PREFIX: &str = "love.app/";
const INFO_PLIST: &str = "love.app/Contents/Info.plist";
const APP_ICON: &str = "love.app/Contents/Resources/OS X AppIcon.icns";
const LICENSE: &str = "love.app/Contents/Resources/license.txt";

/// Runtime resources games never use
const SKIPPED: &[&str] = &[
    "love.app/Contents/Resources/GameIcon.icns",
    "love.app/Contents/Resources/Assets.car",
];

/// Builder for `macos`
#[derive(Debug, Clone, Copy, Default)]
pub struct MacOsBuilder;

impl TargetBuilder for MacOsBuilder {
    fn build<'a>(&'a self, ctx: &'a BuildContext<'a>) -> BoxFuture<'a, Result<(), TargetError>> {
        build_macos(ctx).boxed()
    }
}

async fn build_macos(ctx: &BuildContext<'_>) -> Result<(), TargetError> {
    let url = urls::love_zip(ctx.love_version, ctx.target.as_str());
    let source = runtime_zip(ctx, &url).await?;
    let dest = ctx.target_dir.join(format!("{}-{}.zip", ctx.name, ctx.target));
    rewrite_bundle(ctx, &source, &dest)?;
    tracing::info!("Created {}", dest.display());
    Ok(())
}

/// Copy the runtime bundle into `dest`, renamed and customized
fn rewrite_bundle(ctx: &BuildContext<'_>, source: &Path, dest: &Path) -> Result<(), TargetError> {
    let src_err = |e: &dyn std::fmt::Display| ctx.zip_err(source, e);
    let dest_err = |e: &dyn std::fmt::Display| ctx.zip_err(dest, e);

    let icon = game_icon(ctx)?;
    let license = match ctx.config.get_str("license") {
        Some(path) => Some(filesystem::read_bytes(&ctx.require_file(ctx.project_path(path))?)?),
        None => None,
    };

    let file = File::open(source).map_err(|e| src_err(&e))?;
    let mut runtime = ZipArchive::new(BufReader::new(file)).map_err(|e| src_err(&e))?;
    let out = File::create(dest).map_err(|e| dest_err(&e))?;
    let mut bundle = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let app = format!("{}.app/", ctx.name);
    for i in 0..runtime.len() {
        let entry = runtime.by_index_raw(i).map_err(|e| src_err(&e))?;
        let name = entry.name().to_string();
        let Some(rest) = name.strip_prefix(BUNDLE_PREFIX) else {
            return Err(ctx.bad_runtime(format!(
                "Got a bad or unexpectedly formatted LÖVE zip file (entry '{name}')"
            )));
        };
        let renamed = format!("{app}{rest}");

        if SKIPPED.contains(&name.as_str()) {
            continue;
        }

        if name == INFO_PLIST {
            drop(entry);
            bundle.start_file(renamed, options).map_err(|e| dest_err(&e))?;
            bundle
                .write_all(info_plist(ctx).as_bytes())
                .map_err(|e| dest_err(&e))?;
        } else if name == APP_ICON {
            let icon_name = format!("{app}Contents/Resources/icon.icns");
            match &icon {
                Some(content) => {
                    drop(entry);
                    bundle.start_file(icon_name, options).map_err(|e| dest_err(&e))?;
                    bundle.write_all(content).map_err(|e| dest_err(&e))?;
                }
                None => bundle
                    .raw_copy_file_rename(entry, icon_name)
                    .map_err(|e| dest_err(&e))?,
            }
        } else if let (LICENSE, Some(content)) = (name.as_str(), &license) {
            drop(entry);
            bundle.start_file(renamed, options).map_err(|e| dest_err(&e))?;
            bundle.write_all(content).map_err(|e| dest_err(&e))?;
        } else {
            bundle
                .raw_copy_file_rename(entry, renamed)
                .map_err(|e| dest_err(&e))?;
        }
    }

    let game = filesystem::read_bytes(ctx.love_file)?;
    bundle
        .start_file(format!("{app}Contents/Resources/{}.love", ctx.name), options)
        .map_err(|e| dest_err(&e))?;
    bundle.write_all(&game).map_err(|e| dest_err(&e))?;

    bundle
        .finish()
        .map_err(|e| dest_err(&e))?
        .flush()
        .map_err(|e| dest_err(&e))?;
    Ok(())
}

/// Contents of a custom `.icns` icon
///
/// `macos.icon_file` wins over the top-level `icon_file`.
fn game_icon(ctx: &BuildContext<'_>) -> Result<Option<Vec<u8>>, TargetError> {
    let Some(icon_file) = ctx
        .config
        .section_str("macos", "icon_file")
        .or_else(|| ctx.config.get_str("icon_file"))
    else {
        return Ok(None);
    };

    let icon = ctx.require_file(ctx.project_path(icon_file))?;
    let is_icns = icon
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("icns"));
    if !is_icns {
        tracing::warn!(
            "Icon '{}' is not an .icns file. Keeping the default macOS icon",
            icon.display()
        );
        return Ok(None);
    }

    Ok(Some(filesystem::read_bytes(&icon)?))
}

/// A property list value
#[derive(Debug, Clone, PartialEq, Eq)]
enum PlistValue {
    String(String),
    Bool(bool),
    Array(Vec<String>),
}

impl PlistValue {
    fn string(value: &str) -> Self {
        Self::String(value.to_string())
    }

    fn write_xml(&self, out: &mut String) {
        match self {
            Self::String(s) => out.push_str(&format!("\t<string>{}</string>\n", xml_escape(s))),
            Self::Bool(true) => out.push_str("\t<true/>\n"),
            Self::Bool(false) => out.push_str("\t<false/>\n"),
            Self::Array(items) => {
                out.push_str("\t<array>\n");
                for item in items {
                    out.push_str(&format!("\t\t<string>{}</string>\n", xml_escape(item)));
                }
                out.push_str("\t</array>\n");
            }
        }
    }
}

/// `Info.plist` entries, with `macos.app_metadata` applied
fn plist_entries(ctx: &BuildContext<'_>) -> Vec<(String, PlistValue)> {
    use PlistValue::{Array, Bool};
    let s = PlistValue::string;

    let mut entries: Vec<(String, PlistValue)> = vec![
        ("BuildMachineOSBuild", s("19B88")),
        ("CFBundleDevelopmentRegion", s("English")),
        ("CFBundleExecutable", s("love")),
        ("CFBundleIconFile", s("icon.icns")),
        ("CFBundleInfoDictionaryVersion", s("6.0")),
        ("CFBundlePackageType", s("APPL")),
        ("CFBundleSignature", s("LoVe")),
        ("CFBundleSupportedPlatforms", Array(vec!["MacOSX".to_string()])),
        ("DTCompiler", s("com.apple.compilers.llvm.clang.1_0")),
        ("DTPlatformBuild", s("11C504")),
        ("DTPlatformVersion", s("GM")),
        ("DTSDKBuild", s("19B90")),
        ("DTSDKName", s("macosx10.15")),
        ("DTXcode", s("1130")),
        ("DTXcodeBuild", s("11C504")),
        ("LSApplicationCategoryType", s("public.app-category.games")),
        ("LSMinimumSystemVersion", s("10.7")),
        ("NSHighResolutionCapable", Bool(true)),
        ("NSPrincipalClass", s("NSApplication")),
        ("NSSupportsAutomaticGraphicsSwitching", Bool(false)),
        (
            "CFBundleShortVersionString",
            s(ctx.version.unwrap_or(ctx.love_version)),
        ),
        ("CFBundleName", s(ctx.name)),
        ("NSHumanReadableCopyright", s("© 2006-2020 LÖVE Development Team")),
        ("CFBundleIdentifier", s("tld.yourgamename")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    for (key, value) in ctx.config.section_map("macos", "app_metadata") {
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = PlistValue::String(value),
            None => entries.push((key, PlistValue::String(value))),
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// XML property list for the bundle
pub fn info_plist(ctx: &BuildContext<'_>) -> String {
    let mut out = String::from(concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
        "<plist version=\"1.0\">\n",
        "<dict>\n",
    ));
    for (key, value) in plist_entries(ctx) {
        out.push_str(&format!("\t<key>{}</key>\n", xml_escape(&key)));
        value.write_xml(&mut out);
    }
    out.push_str("</dict>\n</plist>\n");
    out
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
