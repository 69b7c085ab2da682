use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use zip::ZipArchive;

use crate::models::{CoreError, CoreErrorKind, InstallStep, PackageIdentity};

pub const PACKAGE_EXTENSION: &str = "nupkg";
pub const MANIFEST_EXTENSION: &str = "nuspec";

const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

pub trait PackageIdentityReader: Send + Sync {
    fn read_identity(&self, archive: &Path) -> Result<PackageIdentity, CoreError>;
}

/// Reads `<id>` and `<version>` from the `.nuspec` manifest at the archive root. Archives
/// without a manifest fall back to [`FileNameIdentityReader`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ManifestIdentityReader;

impl PackageIdentityReader for ManifestIdentityReader {
    fn read_identity(&self, archive: &Path) -> Result<PackageIdentity, CoreError> {
        ensure_archive_exists(archive)?;

        match read_manifest(archive)? {
            Some(manifest) => parse_manifest(&manifest),
            None => {
                tracing::warn!(
                    archive = %archive.display(),
                    "package archive has no manifest; using identity from file name"
                );
                FileNameIdentityReader.read_identity(archive)
            }
        }
    }
}

/// Reads the identity encoded in a conventional `<Id>.<Version>.nupkg` file name.
///
/// The version starts at the first dot-separated segment that begins with a digit, so ids
/// with a digit-leading segment are split in the wrong place.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileNameIdentityReader;

impl PackageIdentityReader for FileNameIdentityReader {
    fn read_identity(&self, archive: &Path) -> Result<PackageIdentity, CoreError> {
        ensure_archive_exists(archive)?;

        let file_name = archive
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                identity_error(
                    CoreErrorKind::InvalidInput,
                    format!("package archive '{}' has no UTF-8 file name", archive.display()),
                )
            })?;

        parse_archive_file_name(file_name)
    }
}

fn ensure_archive_exists(archive: &Path) -> Result<(), CoreError> {
    if archive.is_file() {
        return Ok(());
    }
    Err(identity_error(
        CoreErrorKind::Precondition,
        format!("package archive '{}' does not exist", archive.display()),
    ))
}

fn read_manifest(archive: &Path) -> Result<Option<String>, CoreError> {
    let file = File::open(archive).map_err(|error| {
        identity_error(
            CoreErrorKind::Precondition,
            format!("failed to open package archive '{}': {error}", archive.display()),
        )
    })?;

    let mut zip = match ZipArchive::new(file) {
        Ok(zip) => zip,
        Err(error) => {
            tracing::debug!(
                archive = %archive.display(),
                error = %error,
                "package archive is not a zip file"
            );
            return Ok(None);
        }
    };

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|error| {
            identity_error(
                CoreErrorKind::ParseFailure,
                format!("corrupt package archive '{}': {error}", archive.display()),
            )
        })?;
        if entry.is_dir() || !is_root_manifest(entry.name()) {
            continue;
        }

        let mut manifest = String::new();
        (&mut entry)
            .take(MAX_MANIFEST_BYTES)
            .read_to_string(&mut manifest)
            .map_err(|error| {
                identity_error(
                    CoreErrorKind::ParseFailure,
                    format!(
                        "failed to read manifest from '{}': {error}",
                        archive.display()
                    ),
                )
            })?;
        return Ok(Some(manifest));
    }

    Ok(None)
}

fn is_root_manifest(entry_name: &str) -> bool {
    !entry_name.contains('/')
        && entry_name
            .rsplit_once('.')
            .is_some_and(|(stem, extension)| {
                !stem.is_empty() && extension.eq_ignore_ascii_case(MANIFEST_EXTENSION)
            })
}

/// Extracts `package/metadata/id` and `package/metadata/version`, ignoring namespaces.
pub fn parse_manifest(xml: &str) -> Result<PackageIdentity, CoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut id = String::new();
    let mut version = String::new();

    loop {
        let event = reader.read_event().map_err(|error| {
            identity_error(
                CoreErrorKind::ParseFailure,
                format!("invalid package manifest: {error}"),
            )
        })?;
        match event {
            Event::Start(element) => path.push(element.local_name().as_ref().to_vec()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let field = match metadata_field(&path) {
                    Some(b"id") => &mut id,
                    Some(b"version") => &mut version,
                    _ => continue,
                };
                let value = text.unescape().map_err(|error| {
                    identity_error(
                        CoreErrorKind::ParseFailure,
                        format!("invalid package manifest: {error}"),
                    )
                })?;
                field.push_str(&value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let id = id.trim();
    if id.is_empty() {
        return Err(identity_error(
            CoreErrorKind::ParseFailure,
            "package manifest has no <id>".to_string(),
        ));
    }
    let version = Some(version.trim().to_string()).filter(|version| !version.is_empty());

    let identity = PackageIdentity::new(id, version);
    identity.validate()?;
    Ok(identity)
}

fn metadata_field(path: &[Vec<u8>]) -> Option<&[u8]> {
    match path {
        [package, metadata, field] if package == b"package" && metadata == b"metadata" => {
            Some(field.as_slice())
        }
        _ => None,
    }
}

pub fn parse_archive_file_name(file_name: &str) -> Result<PackageIdentity, CoreError> {
    let stem = strip_package_extension(file_name).ok_or_else(|| {
        identity_error(
            CoreErrorKind::InvalidInput,
            format!("'{file_name}' is not a .{PACKAGE_EXTENSION} archive"),
        )
    })?;

    let segments: Vec<&str> = stem.split('.').collect();
    let version_start = segments
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, segment)| segment.starts_with(|ch: char| ch.is_ascii_digit()))
        .map(|(index, _)| index)
        .ok_or_else(|| {
            identity_error(
                CoreErrorKind::ParseFailure,
                format!("no version found in archive name '{file_name}'"),
            )
        })?;

    let identity = PackageIdentity::new(
        segments[..version_start].join("."),
        Some(segments[version_start..].join(".")),
    );
    identity.validate()?;
    Ok(identity)
}

fn strip_package_extension(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || !extension.eq_ignore_ascii_case(PACKAGE_EXTENSION) {
        return None;
    }
    Some(stem)
}

fn identity_error(kind: CoreErrorKind, message: String) -> CoreError {
    CoreError {
        package: None,
        step: Some(InstallStep::ResolveIdentity),
        kind,
        message,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    use super::{
        ManifestIdentityReader, PackageIdentityReader, is_root_manifest, parse_archive_file_name,
        parse_manifest,
    };
    use crate::models::CoreErrorKind;

    const UNITY_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>Unity.3D.Tools</id>
    <version>1.0.0</version>
    <authors>Tools &amp; Co</authors>
    <dependencies>
      <dependency id="Newtonsoft.Json" version="6.0.4" />
    </dependencies>
  </metadata>
</package>"#;

    fn temp_archive(test_name: &str, file_name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("pkgprobe-{test_name}-{nanos}"));
        std::fs::create_dir_all(&dir).expect("temp dir should be created");
        let path = dir.join(file_name);

        let file = std::fs::File::create(&path).expect("archive should be created");
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, contents) in entries {
            writer.start_file(*name, options).expect("entry should start");
            writer
                .write_all(contents.as_bytes())
                .expect("entry should be written");
        }
        writer.finish().expect("archive should be finished");
        path
    }

    #[test]
    fn manifest_identity_overrides_file_name() {
        let archive = temp_archive(
            "archive-manifest",
            "Unity.3D.Tools.1.0.0.nupkg",
            &[
                ("_rels/.rels", "<Relationships />"),
                ("content/readme.nuspec", "<package />"),
                ("Unity.3D.Tools.nuspec", UNITY_MANIFEST),
            ],
        );

        let identity = ManifestIdentityReader
            .read_identity(&archive)
            .expect("manifest should be read");
        assert_eq!(identity.id, "Unity.3D.Tools");
        assert_eq!(identity.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn archive_without_manifest_falls_back_to_file_name() {
        let archive = temp_archive(
            "archive-no-manifest",
            "Newtonsoft.Json.6.0.4.nupkg",
            &[("lib/net45/Newtonsoft.Json.dll", "")],
        );

        let identity = ManifestIdentityReader
            .read_identity(&archive)
            .expect("file name should parse");
        assert_eq!(identity.id, "Newtonsoft.Json");
        assert_eq!(identity.version.as_deref(), Some("6.0.4"));
    }

    #[test]
    fn manifest_without_id_is_a_parse_failure() {
        let error = parse_manifest("<package><metadata><version>1.0</version></metadata></package>")
            .expect_err("expected missing id");
        assert_eq!(error.kind, CoreErrorKind::ParseFailure);

        let error =
            parse_manifest("<package><metadata><id>Foo</metadata>").expect_err("expected bad xml");
        assert_eq!(error.kind, CoreErrorKind::ParseFailure);
    }

    #[test]
    fn nested_id_elements_are_ignored() {
        let identity = parse_manifest(
            "<package><metadata><group><id>Other</id></group><id>Foo</id></metadata></package>",
        )
        .expect("manifest should parse");
        assert_eq!(identity.id, "Foo");
        assert_eq!(identity.version, None);
    }

    #[test]
    fn only_root_entries_count_as_manifests() {
        assert!(is_root_manifest("Foo.nuspec"));
        assert!(is_root_manifest("Foo.NUSPEC"));
        assert!(!is_root_manifest("content/Foo.nuspec"));
        assert!(!is_root_manifest(".nuspec"));
    }

    #[test]
    fn splits_dotted_id_from_version() {
        let identity =
            parse_archive_file_name("Newtonsoft.Json.6.0.4.nupkg").expect("name should parse");
        assert_eq!(identity.id, "Newtonsoft.Json");
        assert_eq!(identity.version.as_deref(), Some("6.0.4"));
    }

    #[test]
    fn keeps_prerelease_suffix_in_version() {
        let identity = parse_archive_file_name("jQuery.2.1.0-beta1.NUPKG")
            .expect("name should parse");
        assert_eq!(identity.id, "jQuery");
        assert_eq!(identity.version.as_deref(), Some("2.1.0-beta1"));
    }

    #[test]
    fn rejects_other_extensions_and_unversioned_names() {
        let error = parse_archive_file_name("Foo.1.0.zip").expect_err("expected bad extension");
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);

        let error = parse_archive_file_name("Foo.Bar.nupkg").expect_err("expected no version");
        assert_eq!(error.kind, CoreErrorKind::ParseFailure);

        let error = parse_archive_file_name(".1.0.nupkg").expect_err("expected empty id");
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }
}
