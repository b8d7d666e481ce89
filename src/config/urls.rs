//! Runtime and tool download URLs

/// LÖVE release downloads (GitHub)
pub const LOVE_RELEASES: &str = "https://github.com/love2d/love/releases/download";

/// love.js compat player sources
pub const LOVEJS_ARCHIVE: &str = "https://github.com/Davidobot/love.js/archive/master.zip";

/// appimagetool used to repack AppImages
pub const APPIMAGETOOL: &str =
    "https://github.com/AppImage/AppImageKit/releases/download/continuous/appimagetool-x86_64.AppImage";

/// rcedit used to set Windows executable metadata
pub const RCEDIT: &str = "https://github.com/electron/rcedit/releases/download/v1.1.1/rcedit-x64.exe";

/// Zip archive of the LÖVE runtime for a Windows or macOS platform
///
/// `platform` is one of `win32`, `win64` or `macos`.
pub fn love_zip(version: &str, platform: &str) -> String {
    format!("{LOVE_RELEASES}/{version}/love-{version}-{platform}.zip")
}

/// Official LÖVE AppImage (published since 11.4)
pub fn love_appimage(version: &str) -> String {
    format!("{LOVE_RELEASES}/{version}/love-{version}-x86_64.AppImage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_love_zip_url() {
        assert_eq!(
            love_zip("11.5", "win64"),
            "https://github.com/love2d/love/releases/download/11.5/love-11.5-win64.zip"
        );
    }

    #[test]
    fn test_love_appimage_url() {
        assert_eq!(
            love_appimage("11.4"),
            "https://github.com/love2d/love/releases/download/11.4/love-11.4-x86_64.AppImage"
        );
    }
}
